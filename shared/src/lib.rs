// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not connected to the {0}")]
    NotConnected(&'static str),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("backend: {0}")]
    Backend(String),
    #[error("expiration must be at least one second")]
    InvalidExpiry,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Expiration of a cache entry, in whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlSecs(pub u64);

impl TtlSecs {
    pub fn as_duration(self) -> std::time::Duration {
        std::time::Duration::from_secs(self.0)
    }
}

pub mod config;

use serde::{Deserialize, Serialize};

/// Body of GET /status
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub redis: bool,
    pub db: bool,
}

/// Body of GET /stats
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub users: u64,
    pub files: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

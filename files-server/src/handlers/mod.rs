pub mod app;

pub use app::{get_stats, get_status};

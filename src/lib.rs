//! portscan - asynchronous nmap scan jobs behind a small HTTP API
//!
//! A client starts a scan, polls its synthetic progress and fetches the
//! normalized result once nmap has finished.

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod normalize;
pub mod probe;
pub mod utils;

// Re-export commonly used types
pub use api::{create_router, AppState};
pub use config::ServiceConfig;
pub use error::ScanError;
pub use jobs::{JobProgress, ScanClass, ScanId, ScanJobManager, ScanOptions, ScanRequest};
pub use normalize::ScanResult;
pub use probe::{NmapProbe, ProbeEngine, ProbeOutput};

pub type Result<T> = std::result::Result<T, ScanError>;

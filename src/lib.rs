pub mod config;
pub mod db;
pub mod error;
pub mod service;

pub use config::{BootstrapConfig, ConnectionConfig};
pub use error::{BootstrapError, ErrorKind};
pub use service::bootstrap::{BootstrapReport, run, run_with};

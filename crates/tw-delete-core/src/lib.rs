pub mod age;
pub mod archive;
pub mod config;
pub mod error;
pub mod prune;
pub mod timeline;

pub use config::{AppConfig, Credentials};
pub use error::{Error, Result};
pub use prune::{PruneStats, Pruner};

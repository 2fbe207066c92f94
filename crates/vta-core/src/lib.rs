pub mod config;
pub mod error;
pub mod types;

pub use config::VtaConfig;
pub use error::{Result, VtaError};
pub use types::*;

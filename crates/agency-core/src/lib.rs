pub mod config;
pub mod error;
pub mod types;

pub use config::AgencyConfig;
pub use error::{AgencyError, Result};
pub use types::*;

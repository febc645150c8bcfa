mod error;
mod run_config;

pub use error::*;
pub use run_config::*;

pub mod config;
pub mod toml_config;

pub use config::{DriverConfig, DriverState, RfMode, SharedConfig};

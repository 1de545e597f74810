pub mod api_system;
pub mod config;

pub use api_system::ApiSystem;
pub use config::{AppConfig, ConfigError};

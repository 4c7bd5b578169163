pub mod logging;
pub mod provider;

pub use logging::{LogConfig, LogLevel, OutputFormat};
pub use provider::{ProviderConfig, HOST_ENV_VAR};

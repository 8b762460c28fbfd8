pub mod config;
pub mod server;
pub mod variants;

pub use config::{ConfigError, GatewayConfig};
pub use variants::Variant;

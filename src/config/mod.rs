// Configuration module entry point
// Loads configuration and holds the shared runtime state

mod state;
mod types;

use config::builder::{ConfigBuilder, DefaultState};
use config::{ConfigError, Environment, File, FileFormat};
use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, DirRoute, FileRoute, HealthConfig, HttpConfig, LogLevel, LoggingConfig,
    PerformanceConfig, RoutesConfig, ServerConfig,
};

/// Default config file, extension resolved by the `config` crate
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is not an error: defaults and environment variables
    /// (`RANGESERVE_SERVER__PORT=9000`) still apply.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        with_defaults()?
            .add_source(File::with_name(config_path).required(false))
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from an in-memory TOML document
    pub fn load_from_toml(toml: &str) -> Result<Self, ConfigError> {
        with_defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("RANGESERVE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.backlog", 128)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive", true)?
        .set_default("performance.connection_timeout", 300)?
        .set_default("performance.shutdown_grace_period", 10)?
        .set_default("http.server_name", "rangeserve")?
        .set_default("http.enable_cors", false)
}

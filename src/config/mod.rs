// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, LogFormat};

/// Environment variables override file values, e.g. `TOUR__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "TOUR";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 5)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "endpoint-tour")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("api.title", "Endpoint Tour")?
            .set_default("api.version", env!("CARGO_PKG_VERSION"))?
            .set_default("api.openapi_url", "/openapi.json")?
            .set_default("api.openapi_enabled", true)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Runtime worker count; `None` keeps tokio's one-per-core default
    pub fn worker_threads(&self) -> Result<Option<usize>, String> {
        match self.server.workers {
            Some(0) => Err("server.workers must be at least 1".to_string()),
            workers => Ok(workers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_from("does-not-exist/endpoint-tour").unwrap();
        assert_eq!(config.http.max_body_size, 1_048_576);
        assert_eq!(config.api.openapi_url, "/openapi.json");
        assert!(config.api.openapi_enabled);
        assert_eq!(config.logging.access_log_format, "combined");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.performance.max_connections.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("endpoint-tour-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tour.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[logging]\nformat = \"json\"\naccess_log_format = \"common\"\n\n[performance]\nmax_connections = 64"
        )
        .unwrap();

        let base = path.with_extension("");
        let config = Config::load_from(base.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.access_log_format, "common");
        assert_eq!(config.performance.max_connections, Some(64));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_socket_addr() {
        let mut config = Config::load_from("does-not-exist/endpoint-tour").unwrap();
        assert_eq!(config.get_socket_addr().unwrap().port(), config.server.port);
        config.server.host = "not a host".to_string();
        assert!(config.get_socket_addr().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::load_from("does-not-exist/endpoint-tour").unwrap();
        assert_eq!(config.worker_threads().unwrap(), None);

        config.server.workers = Some(4);
        assert_eq!(config.worker_threads().unwrap(), Some(4));

        config.server.workers = Some(0);
        assert!(config.worker_threads().is_err());
    }
}

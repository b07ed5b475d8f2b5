//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Subscriber setup (text or JSON diagnostics, filtered by `RUST_LOG`)
//! - Access logging with multiple formats on its own target
//! - Named helpers for lifecycle, warning and error events

mod format;

pub use format::AccessLogEntry;

use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{filter_fn, Directive, ParseError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{Config, LogFormat};

/// Target of access log events; routed to the access sink only
pub const ACCESS_TARGET: &str = "access";

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid log filter directive: {0}")]
    Directive(#[from] ParseError),
    #[error("access log path `{0}` has no file name")]
    AccessLogPath(String),
    #[error("logger already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Initialize the global subscriber
///
/// Should be called once at application startup. The returned guard flushes
/// the access log writer when dropped.
pub fn init(config: &Config) -> Result<WorkerGuard, LoggerError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
        .add_directive(format!("{ACCESS_TARGET}=off").parse::<Directive>()?);

    let diagnostics = match config.logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
    }
    .with_filter(env_filter);

    let (writer, guard) = match config.logging.access_log_file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let file = path
                .file_name()
                .ok_or_else(|| LoggerError::AccessLogPath(path.display().to_string()))?;
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file))
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let access = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_filter(filter_fn(|meta| meta.target() == ACCESS_TARGET));

    tracing_subscriber::registry()
        .with(diagnostics)
        .with(access)
        .try_init()?;

    Ok(guard)
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, routes: usize) {
    tracing::info!(
        %addr,
        routes,
        workers = ?config.server.workers,
        max_body_size = config.http.max_body_size,
        max_connections = ?config.performance.max_connections,
        "server listening on http://{addr}"
    );
    if config.api.openapi_enabled {
        tracing::info!("OpenAPI document at http://{addr}{}", config.api.openapi_url);
    }
    if let Some(ref path) = config.logging.access_log_file {
        tracing::info!(path = %path, "access log file");
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(%peer_addr, "connection accepted");
}

pub fn log_connection_rejected(peer_addr: &SocketAddr, active: usize, max: u64) {
    tracing::warn!(%peer_addr, active, max, "max connections reached, connection rejected");
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    tracing::warn!(error = %err, "failed to serve connection");
}

pub fn log_connection_timeout(peer_addr: &SocketAddr, seconds: u64) {
    tracing::warn!(%peer_addr, seconds, "connection timed out");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

pub fn log_shutdown(signal: &str) {
    tracing::info!(signal, "shutdown requested, no longer accepting connections");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

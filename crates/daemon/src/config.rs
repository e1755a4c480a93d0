//! Daemon configuration, read from environment variables
//!
//! | Variable                  | Default      |
//! |---------------------------|--------------|
//! | `PORT`                    | `8080`       |
//! | `D2RENDER_HOST`           | `127.0.0.1`  |
//! | `D2RENDER_BIN`            | `d2`         |
//! | `D2RENDER_OUTPUT_MODE`    | `tempfile`   |
//! | `D2RENDER_TIMEOUT_SECS`   | `60` (0 = off) |
//! | `D2RENDER_MAX_BODY_BYTES` | `2097152`    |
//! | `D2RENDER_WORKDIR`        | current dir  |
//! | `D2RENDER_LOG_FORMAT`     | `pretty`     |
//! | `D2RENDER_LOG_DIR`        | unset        |

use d2render_api_http::HttpServerConfig;
use d2render_core::application::constants::{DEFAULT_HOST, DEFAULT_PORT};
use d2render_core::AppError;
use d2render_infra_system::{OutputMode, RendererConfig};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "D2RENDER_HOST";
pub const ENV_BIN: &str = "D2RENDER_BIN";
pub const ENV_OUTPUT_MODE: &str = "D2RENDER_OUTPUT_MODE";
pub const ENV_TIMEOUT_SECS: &str = "D2RENDER_TIMEOUT_SECS";
pub const ENV_MAX_BODY_BYTES: &str = "D2RENDER_MAX_BODY_BYTES";
pub const ENV_WORKDIR: &str = "D2RENDER_WORKDIR";
pub const ENV_LOG_FORMAT: &str = "D2RENDER_LOG_FORMAT";
pub const ENV_LOG_DIR: &str = "D2RENDER_LOG_DIR";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Development: pretty formatting with colors
    #[default]
    Pretty,
    /// Production: JSON structured logging
    Json,
}

/// Logging settings (read before anything else so config warnings are visible)
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    pub format: LogFormat,
    pub dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = match lookup(ENV_LOG_FORMAT).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let dir = non_empty(lookup(ENV_LOG_DIR)).map(expand_path);

        Self { format, dir }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub http: HttpServerConfig,
    pub renderer: RendererConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// `PORT` never fails: an unusable value falls back to the default port.
    /// Every other malformed value is a configuration error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut http = HttpServerConfig {
            port: port_from(lookup(ENV_PORT)),
            host: non_empty(lookup(ENV_HOST)).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            ..HttpServerConfig::default()
        };

        if let Some(limit) = parse_var::<usize>(ENV_MAX_BODY_BYTES, lookup(ENV_MAX_BODY_BYTES))? {
            http.max_body_bytes = limit;
        }

        let mut renderer = RendererConfig::default();

        if let Some(program) = non_empty(lookup(ENV_BIN)) {
            renderer.program = program;
        }

        if let Some(mode) = non_empty(lookup(ENV_OUTPUT_MODE)) {
            renderer.output_mode = OutputMode::from_str(&mode)
                .map_err(|e| AppError::Config(format!("{}: {}", ENV_OUTPUT_MODE, e)))?;
        }

        if let Some(secs) = parse_var::<u64>(ENV_TIMEOUT_SECS, lookup(ENV_TIMEOUT_SECS))? {
            renderer.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        renderer.working_dir = non_empty(lookup(ENV_WORKDIR)).map(expand_path);

        Ok(Self { http, renderer })
    }
}

/// Parse `PORT`, warning and falling back to the default on bad input
fn port_from(value: Option<String>) -> u16 {
    let Some(raw) = non_empty(value) else {
        return DEFAULT_PORT;
    };

    match raw.trim().parse::<u16>() {
        Ok(port) => port,
        Err(_) => {
            warn!(
                value = %raw,
                default = DEFAULT_PORT,
                "Invalid PORT environment variable, using default"
            );
            DEFAULT_PORT
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, AppError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", name, raw))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn expand_path(raw: String) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

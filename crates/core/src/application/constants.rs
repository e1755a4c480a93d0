// Service constants (no magic values in the wiring code)
use std::time::Duration;

/// Default renderer executable
pub const DEFAULT_RENDERER_PROGRAM: &str = "d2";

/// Default HTTP port when `PORT` is unset or invalid
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind host (localhost only)
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default per-render deadline (60s)
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Default request body limit (2 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Graceful HTTP shutdown timeout (5 seconds)
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Prefix and suffix of the temporary output file
pub const OUTPUT_FILE_PREFIX: &str = "d2_output_";
pub const OUTPUT_FILE_SUFFIX: &str = ".svg";

/// Environment variables passed through to the renderer by default
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "TMPDIR", "XDG_CACHE_HOME"];

/// Environment variable prefixes passed through to the renderer by default
pub const DEFAULT_ENV_PREFIX_ALLOWLIST: &[&str] = &["D2_"];

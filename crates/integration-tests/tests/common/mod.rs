//! Shared fixtures: a scripted stand-in for the d2 binary and server wiring

#![allow(dead_code)]

use d2render_api_http::{HttpServer, HttpServerConfig};
use d2render_core::application::RenderService;
use d2render_core::port::id_provider::SequentialIdProvider;
use d2render_core::port::time_provider::SystemTimeProvider;
use d2render_infra_system::{OutputMode, RendererConfig, SubprocessRenderer};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Behaves like `d2 [flags] - <output>`:
/// - input containing ERROR fails with a d2-style message on stderr
/// - input containing SLEEP hangs
/// - otherwise writes `<svg flags="...">INPUT</svg>` to the output target
const FAKE_D2: &str = r#"#!/bin/sh
for last; do :; done
input=$(cat)
case "$input" in
  *ERROR*) echo "err: failed to compile -: syntax error" >&2; exit 1 ;;
  *SLEEP*) sleep 5 ;;
esac
flags=""
for arg; do
  case "$arg" in --*) flags="$flags $arg" ;; esac
done
svg="<svg flags=\"${flags# }\">$input</svg>"
if [ "$last" = "-" ]; then
  printf '%s' "$svg"
else
  printf '%s' "$svg" > "$last"
fi
"#;

static FAKE_D2_DIR: OnceLock<tempfile::TempDir> = OnceLock::new();

/// Path to the fake `d2` executable
///
/// Written once per test binary, before any test spawns a child, so no
/// forked process can hold the file open for writing when it is executed.
pub fn fake_d2() -> PathBuf {
    let dir = FAKE_D2_DIR.get_or_init(|| {
        let dir = tempfile::tempdir().expect("create fake d2 dir");
        let path = dir.path().join("d2");
        std::fs::write(&path, FAKE_D2).expect("write fake d2");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake d2");
        dir
    });
    dir.path().join("d2")
}

pub fn renderer_config(program: &Path, mode: OutputMode, timeout: Duration) -> RendererConfig {
    RendererConfig {
        output_mode: mode,
        timeout: Some(timeout),
        ..RendererConfig::new(program.to_string_lossy())
    }
}

/// HTTP server backed by the fake d2
pub fn server(mode: OutputMode) -> HttpServer {
    server_with(renderer_config(&fake_d2(), mode, Duration::from_secs(10)))
}

pub fn server_with(config: RendererConfig) -> HttpServer {
    let renderer = Arc::new(SubprocessRenderer::new(config));
    let service = Arc::new(RenderService::new(renderer, Arc::new(SystemTimeProvider)));

    HttpServer::new(
        HttpServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        },
        service,
        Arc::new(SequentialIdProvider::default()),
    )
}

// Subprocess renderer implementation
// reason: tokio for async process management, tempfile for RAII output files
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use d2render_core::application::constants::{
    DEFAULT_ENV_ALLOWLIST, DEFAULT_ENV_PREFIX_ALLOWLIST, DEFAULT_RENDERER_PROGRAM,
    DEFAULT_RENDER_TIMEOUT, OUTPUT_FILE_PREFIX, OUTPUT_FILE_SUFFIX,
};
use d2render_core::port::{DiagramRenderer, RenderError, RenderOutput};

/// Argument that tells the tool to read from stdin / write to stdout
const STDIO_ARG: &str = "-";

/// Deadline for the startup `--version` probe
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the tool writes the rendered image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Output path argument is a fresh temp file, read back after exit
    #[default]
    TempFile,
    /// Output path argument is `-`, image is captured from stdout
    Stdout,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::TempFile => write!(f, "tempfile"),
            OutputMode::Stdout => write!(f, "stdout"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tempfile" | "temp-file" | "file" => Ok(OutputMode::TempFile),
            "stdout" => Ok(OutputMode::Stdout),
            other => Err(format!(
                "unknown output mode '{}' (expected 'tempfile' or 'stdout')",
                other
            )),
        }
    }
}

/// Subprocess renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Executable name or path
    pub program: String,
    /// Arguments placed before the option flags
    pub leading_args: Vec<String>,
    pub output_mode: OutputMode,
    /// `None` disables the deadline
    pub timeout: Option<Duration>,
    /// Working directory of the child (relative assets resolve from here)
    pub working_dir: Option<PathBuf>,
    /// Exact variable names passed through to the child
    pub env_allowlist: Vec<String>,
    /// Variable name prefixes passed through to the child
    pub env_prefix_allowlist: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_RENDERER_PROGRAM.to_string(),
            leading_args: Vec::new(),
            output_mode: OutputMode::default(),
            timeout: Some(DEFAULT_RENDER_TIMEOUT),
            working_dir: None,
            env_allowlist: DEFAULT_ENV_ALLOWLIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
            env_prefix_allowlist: DEFAULT_ENV_PREFIX_ALLOWLIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RendererConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }
}

/// Subprocess renderer
/// Spawns the rendering tool per request with a filtered environment
pub struct SubprocessRenderer {
    config: RendererConfig,
    tool_name: String,
}

impl SubprocessRenderer {
    /// Create a new subprocess renderer
    ///
    /// # Example
    /// ```ignore
    /// let renderer = SubprocessRenderer::new(RendererConfig {
    ///     output_mode: OutputMode::Stdout,
    ///     ..RendererConfig::new("d2")
    /// });
    /// ```
    pub fn new(config: RendererConfig) -> Self {
        let tool_name = Path::new(&config.program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.program.clone());

        Self { config, tool_name }
    }

    /// Ask the tool for its version (`<program> --version`)
    ///
    /// Used at startup to report a missing or broken renderer early.
    pub async fn version(&self) -> Result<String, RenderError> {
        let mut command = Command::new(&self.config.program);
        command
            .arg("--version")
            .env_clear()
            .envs(self.filter_env(std::env::vars_os()))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = timeout(VERSION_PROBE_TIMEOUT, command.output())
            .await
            .map_err(|_| RenderError::Timeout(VERSION_PROBE_TIMEOUT.as_millis() as u64))?
            .map_err(|e| RenderError::SpawnFailed(format!("{}: {}", self.config.program, e)))?;
        self.check_output(&output)?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Filter environment variables to the allowlist only
    ///
    /// Names that are not valid UTF-8 can never match the allowlist and are
    /// dropped; values are passed through untouched.
    fn filter_env<I>(&self, env: I) -> HashMap<OsString, OsString>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        env.into_iter()
            .filter(|(k, _)| match k.to_str() {
                Some(name) => self.is_allowed(name),
                None => false,
            })
            .collect()
    }

    fn is_allowed(&self, name: &str) -> bool {
        self.config.env_allowlist.iter().any(|k| k == name)
            || self
                .config
                .env_prefix_allowlist
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Full argv after the program: leading args, flags, input, output target
    fn build_args(&self, flags: &[String], target: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(self.config.leading_args.len() + flags.len() + 2);
        args.extend(self.config.leading_args.iter().cloned());
        args.extend(flags.iter().cloned());
        args.push(STDIO_ARG.to_string());
        args.push(target.to_string());
        args
    }

    /// Spawn child process, feed stdin, and wait for output
    async fn spawn_and_wait(&self, args: &[String], input: &[u8]) -> Result<Output, RenderError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(args)
            .env_clear()
            .envs(self.filter_env(std::env::vars_os()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| RenderError::SpawnFailed(format!("{}: {}", self.config.program, e)))?;

        // Write stdin from its own task so a full stdout pipe cannot deadlock us
        let stdin = child.stdin.take();
        let input = input.to_vec();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&input).await?;
                stdin.flush().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let wait = child.wait_with_output();
        let output = match self.config.timeout {
            Some(limit) => match timeout(limit, wait).await {
                Ok(result) => result.map_err(|e| RenderError::Io(e.to_string()))?,
                Err(_) => {
                    // Dropping the wait future kills the child (kill_on_drop)
                    writer.abort();
                    warn!(
                        program = %self.config.program,
                        timeout_ms = limit.as_millis() as u64,
                        "Renderer timed out, child killed"
                    );
                    return Err(RenderError::Timeout(limit.as_millis() as u64));
                }
            },
            None => wait.await.map_err(|e| RenderError::Io(e.to_string()))?,
        };

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("Renderer closed stdin before reading all input");
            }
            Ok(Err(e)) if output.status.success() => {
                return Err(RenderError::Io(format!("Failed to write stdin: {}", e)));
            }
            Ok(Err(e)) => debug!(error = %e, "Stdin write failed after renderer error"),
            Err(e) => return Err(RenderError::Io(format!("Stdin writer task failed: {}", e))),
        }

        Ok(output)
    }

    /// Map a non-zero exit into ToolFailed with the captured stderr
    fn check_output(&self, output: &Output) -> Result<(), RenderError> {
        if output.status.success() {
            return Ok(());
        }

        Err(RenderError::ToolFailed {
            tool: self.tool_name.clone(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr)
                .trim_end()
                .to_string(),
        })
    }

    /// Internal render method (one per output mode)
    async fn render_internal(
        &self,
        input: &[u8],
        flags: &[String],
    ) -> Result<RenderOutput, RenderError> {
        let start = Instant::now();

        // Held until the end of this function so the file is removed on every path
        let temp_path = match self.config.output_mode {
            OutputMode::TempFile => Some(
                tempfile::Builder::new()
                    .prefix(OUTPUT_FILE_PREFIX)
                    .suffix(OUTPUT_FILE_SUFFIX)
                    .tempfile()
                    .map_err(|e| {
                        RenderError::Io(format!("Failed to create temporary output file: {}", e))
                    })?
                    .into_temp_path(),
            ),
            OutputMode::Stdout => None,
        };

        let target = match &temp_path {
            Some(path) => path.to_string_lossy().into_owned(),
            None => STDIO_ARG.to_string(),
        };
        let args = self.build_args(flags, &target);

        info!(
            program = %self.config.program,
            args = ?args,
            output_mode = %self.config.output_mode,
            "Starting renderer subprocess"
        );

        let output = self.spawn_and_wait(&args, input).await?;
        self.check_output(&output)?;

        let bytes = match &temp_path {
            Some(path) => tokio::fs::read(path)
                .await
                .map_err(|e| RenderError::Io(format!("Failed to read output file: {}", e)))?,
            None => output.stdout,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            program = %self.config.program,
            duration_ms = duration_ms,
            exit_code = ?output.status.code(),
            output_bytes = bytes.len(),
            "Renderer subprocess completed"
        );

        if bytes.is_empty() {
            return Err(RenderError::EmptyOutput(self.tool_name.clone()));
        }

        Ok(RenderOutput {
            bytes,
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl DiagramRenderer for SubprocessRenderer {
    async fn render(&self, input: &[u8], flags: &[String]) -> Result<RenderOutput, RenderError> {
        self.render_internal(input, flags).await
    }

    fn name(&self) -> &str {
        &self.tool_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `sh -c <script> renderer <flags...> - <target>`
    fn sh_renderer(script: &str, mode: OutputMode) -> SubprocessRenderer {
        SubprocessRenderer::new(RendererConfig {
            leading_args: vec!["-c".to_string(), script.to_string(), "renderer".to_string()],
            output_mode: mode,
            timeout: Some(Duration::from_secs(10)),
            ..RendererConfig::new("sh")
        })
    }

    const WRITE_LAST_ARG: &str = r#"for last; do :; done; cat > "$last""#;

    #[tokio::test]
    async fn test_stdout_mode_captures_stdout() {
        let renderer = sh_renderer("cat", OutputMode::Stdout);

        let output = renderer.render(b"<svg>a</svg>", &[]).await.unwrap();

        assert_eq!(output.bytes, b"<svg>a</svg>".to_vec());
        assert_eq!(output.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_argv_layout() {
        let renderer = sh_renderer(r#"printf '%s\n' "$@""#, OutputMode::Stdout);
        let flags = vec!["--sketch".to_string(), "--theme=101".to_string()];

        let output = renderer.render(b"x", &flags).await.unwrap();

        assert_eq!(
            String::from_utf8(output.bytes).unwrap(),
            "--sketch\n--theme=101\n-\n-\n"
        );
    }

    #[tokio::test]
    async fn test_tempfile_mode_reads_output_file() {
        let renderer = sh_renderer(WRITE_LAST_ARG, OutputMode::TempFile);

        let output = renderer.render(b"<svg>file</svg>", &[]).await.unwrap();

        assert_eq!(output.bytes, b"<svg>file</svg>".to_vec());
    }

    #[tokio::test]
    async fn test_tempfile_is_removed_after_render() {
        let script = format!(r#"{}; echo "$last" >&2"#, WRITE_LAST_ARG);
        let renderer = sh_renderer(&script, OutputMode::TempFile);

        let output = renderer.render(b"<svg/>", &[]).await.unwrap();
        let path = PathBuf::from(output.stderr.trim());

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(OUTPUT_FILE_PREFIX));
        assert!(name.ends_with(OUTPUT_FILE_SUFFIX));
        assert!(!path.exists(), "temp output file should be cleaned up");
    }

    /// Script that records its output path in `record` before running `then`
    fn recording_script(record: &Path, then: &str) -> String {
        format!(
            r#"for last; do :; done; echo "$last" > '{}'; {}"#,
            record.display(),
            then
        )
    }

    fn recorded_path(record: &Path) -> PathBuf {
        PathBuf::from(std::fs::read_to_string(record).unwrap().trim())
    }

    #[tokio::test]
    async fn test_tempfile_is_removed_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("target");
        let script = recording_script(&record, "echo 'err: bad' >&2; exit 1");
        let renderer = sh_renderer(&script, OutputMode::TempFile);

        let result = renderer.render(b"a ->", &[]).await;

        assert!(matches!(result, Err(RenderError::ToolFailed { .. })));
        let path = recorded_path(&record);
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(OUTPUT_FILE_PREFIX));
        assert!(!path.exists(), "temp output file should be cleaned up");
    }

    #[tokio::test]
    async fn test_tempfile_is_removed_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("target");
        let script = recording_script(&record, "sleep 10");
        let mut renderer = sh_renderer(&script, OutputMode::TempFile);
        renderer.config.timeout = Some(Duration::from_millis(500));

        let result = renderer.render(b"a -> b", &[]).await;

        assert!(matches!(result, Err(RenderError::Timeout(500))));
        let path = recorded_path(&record);
        assert!(!path.exists(), "temp output file should be cleaned up");
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let renderer = sh_renderer("echo 'err: bad syntax' >&2; exit 3", OutputMode::Stdout);

        let err = renderer.render(b"a ->", &[]).await.unwrap_err();

        match err {
            RenderError::ToolFailed {
                tool,
                exit_code,
                stderr,
            } => {
                assert_eq!(tool, "sh");
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "err: bad syntax");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let mut renderer = sh_renderer("sleep 10", OutputMode::Stdout);
        renderer.config.timeout = Some(Duration::from_millis(100));

        let result = renderer.render(b"", &[]).await;

        assert!(matches!(result, Err(RenderError::Timeout(100))));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let renderer = SubprocessRenderer::new(RendererConfig::new("/nonexistent/d2"));

        let result = renderer.render(b"a -> b", &[]).await;

        assert!(matches!(result, Err(RenderError::SpawnFailed(_))));
        assert_eq!(renderer.name(), "d2");
    }

    #[tokio::test]
    async fn test_empty_output_is_an_error() {
        let renderer = sh_renderer("cat > /dev/null", OutputMode::Stdout);

        let result = renderer.render(b"a -> b", &[]).await;

        assert!(matches!(result, Err(RenderError::EmptyOutput(_))));
    }

    #[tokio::test]
    async fn test_large_input_does_not_deadlock() {
        let renderer = sh_renderer("cat", OutputMode::Stdout);
        let input = vec![b'x'; 4 * 1024 * 1024];

        let output = renderer.render(&input, &[]).await.unwrap();

        assert_eq!(output.bytes.len(), input.len());
    }

    #[tokio::test]
    async fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = sh_renderer("pwd", OutputMode::Stdout);
        renderer.config.working_dir = Some(dir.path().to_path_buf());

        let output = renderer.render(b"", &[]).await.unwrap();
        let reported = PathBuf::from(String::from_utf8(output.bytes).unwrap().trim());

        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_version_probe() {
        let renderer = SubprocessRenderer::new(RendererConfig::new("echo"));
        let version = renderer.version().await.unwrap();
        assert!(!version.is_empty());

        let missing = SubprocessRenderer::new(RendererConfig::new("/nonexistent/d2"));
        assert!(matches!(
            missing.version().await,
            Err(RenderError::SpawnFailed(_))
        ));
    }

    #[test]
    fn test_env_filtering() {
        let renderer = SubprocessRenderer::new(RendererConfig {
            env_allowlist: vec!["ALLOWED_VAR".to_string()],
            env_prefix_allowlist: vec!["D2_".to_string()],
            ..RendererConfig::default()
        });

        let var = |k: &str, v: &str| (OsString::from(k), OsString::from(v));
        let env = vec![
            var("ALLOWED_VAR", "value1"),
            var("BLOCKED_VAR", "value2"),
            var("D2_THEME", "200"),
            var("XD2_THEME", "1"),
        ];

        let filtered = renderer.filter_env(env);

        assert_eq!(filtered.len(), 2);
        assert!(filtered.contains_key(&OsString::from("ALLOWED_VAR")));
        assert!(filtered.contains_key(&OsString::from("D2_THEME")));
        assert!(!filtered.contains_key(&OsString::from("BLOCKED_VAR")));
    }

    #[test]
    fn test_env_filtering_tolerates_non_utf8() {
        use std::os::unix::ffi::OsStringExt;

        let renderer = SubprocessRenderer::new(RendererConfig {
            env_allowlist: vec![],
            env_prefix_allowlist: vec!["D2_".to_string()],
            ..RendererConfig::default()
        });

        let env = vec![
            (
                OsString::from_vec(vec![b'D', b'2', b'_', 0xff]),
                OsString::from("x"),
            ),
            (
                OsString::from("D2_FONT"),
                OsString::from_vec(vec![0x66, 0xff, 0x6f]),
            ),
        ];

        let filtered = renderer.filter_env(env);

        assert_eq!(filtered.len(), 1);
        assert_eq!(
            filtered.get(&OsString::from("D2_FONT")),
            Some(&OsString::from_vec(vec![0x66, 0xff, 0x6f]))
        );
    }

    #[tokio::test]
    async fn test_child_environment_is_cleared() {
        use std::os::unix::ffi::OsStringExt;

        // Process-wide; names are unique to this test
        std::env::set_var("D2_RENDERER_TEST_PASS", "yes");
        std::env::set_var("RENDERER_TEST_SECRET", "leak");
        std::env::set_var(
            "RENDERER_TEST_NON_UTF8",
            OsString::from_vec(vec![0x66, 0xff, 0x6f]),
        );

        let renderer = sh_renderer("env", OutputMode::Stdout);
        let output = renderer.render(b"<svg/>", &[]).await.unwrap();
        let env = String::from_utf8_lossy(&output.bytes);

        assert!(env.lines().any(|l| l == "D2_RENDERER_TEST_PASS=yes"));
        assert!(env.lines().any(|l| l.starts_with("PATH=")));
        assert!(!env.contains("RENDERER_TEST_SECRET"));
        assert!(!env.contains("RENDERER_TEST_NON_UTF8"));

        assert!(renderer.version().await.is_ok());
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("tempfile".parse::<OutputMode>(), Ok(OutputMode::TempFile));
        assert_eq!(" STDOUT ".parse::<OutputMode>(), Ok(OutputMode::Stdout));
        assert!("pipe".parse::<OutputMode>().is_err());
    }
}

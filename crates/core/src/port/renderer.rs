// Diagram Renderer Port
// Abstraction over the external rendering tool (subprocess in production)

use async_trait::async_trait;
use thiserror::Error;

/// Raw output of one tool invocation
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Rendered image bytes (from stdout or the output file)
    pub bytes: Vec<u8>,
    pub exit_code: Option<i32>,
    /// Captured stderr, kept for logging even on success
    pub stderr: String,
}

/// Render errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Failed to start renderer: {0}")]
    SpawnFailed(String),

    #[error("Failed to execute {tool} command: {stderr}")]
    ToolFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Renderer timed out after {0}ms")]
    Timeout(u64),

    #[error("Renderer IO error: {0}")]
    Io(String),

    #[error("{0} produced no output")]
    EmptyOutput(String),
}

/// Diagram Renderer trait
///
/// Implementations:
/// - SubprocessRenderer: runs the tool as a child process
/// - MockRenderer: canned results for tests
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    /// Render `input` with the given command-line flags
    ///
    /// # Errors
    /// - RenderError::SpawnFailed if the tool cannot be started
    /// - RenderError::ToolFailed if the tool exits non-zero
    /// - RenderError::Timeout if the tool runs past its deadline
    /// - RenderError::EmptyOutput if the tool succeeds but writes nothing
    async fn render(&self, input: &[u8], flags: &[String]) -> Result<RenderOutput, RenderError>;

    /// Tool name, used in logs and error messages
    fn name(&self) -> &str;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock renderer behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return these bytes
        Success(Vec<u8>),
        /// Echo the input back as output
        Echo,
        /// Fail as if the tool exited non-zero with this stderr
        Fail(String),
        /// Time out after N ms
        Timeout(u64),
    }

    /// One recorded invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockCall {
        pub input: Vec<u8>,
        pub flags: Vec<String>,
    }

    /// Mock Diagram Renderer for testing
    #[derive(Clone)]
    pub struct MockRenderer {
        behavior: Arc<Mutex<MockBehavior>>,
        calls: Arc<Mutex<Vec<MockCall>>>,
    }

    impl MockRenderer {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success(svg: impl Into<Vec<u8>>) -> Self {
            Self::new(MockBehavior::Success(svg.into()))
        }

        pub fn new_fail(stderr: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(stderr.into()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<MockCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DiagramRenderer for MockRenderer {
        async fn render(
            &self,
            input: &[u8],
            flags: &[String],
        ) -> Result<RenderOutput, RenderError> {
            self.calls.lock().unwrap().push(MockCall {
                input: input.to_vec(),
                flags: flags.to_vec(),
            });

            let behavior = self.behavior.lock().unwrap().clone();

            let bytes = match behavior {
                MockBehavior::Success(bytes) => bytes,
                MockBehavior::Echo => input.to_vec(),
                MockBehavior::Fail(stderr) => {
                    return Err(RenderError::ToolFailed {
                        tool: "mock".to_string(),
                        exit_code: Some(1),
                        stderr,
                    })
                }
                MockBehavior::Timeout(ms) => return Err(RenderError::Timeout(ms)),
            };

            if bytes.is_empty() {
                return Err(RenderError::EmptyOutput("mock".to_string()));
            }

            Ok(RenderOutput {
                bytes,
                exit_code: Some(0),
                stderr: String::new(),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }
}

use crate::command::{Executor, PlatformExecutor};
use crate::error::ExecResult;

/// Runs command lines through a pluggable [`Executor`] and reduces the outcome
/// to "captured output" or "failure".
///
/// [`Default`] picks the executor for the target platform. Failures are
/// reported through `tracing` and never leak into the returned output.
///
/// Example
/// ```
/// use command_capture::CommandRunner;
/// let runner = CommandRunner::default();
/// # #[cfg(unix)]
/// assert_eq!(runner.run_text("echo hello").as_deref(), Some("hello\n"));
/// assert_eq!(runner.run_text(""), None);
/// ```
pub struct CommandRunner {
    executor: Box<dyn Executor>,
}

impl CommandRunner {
    /// Create a runner that delegates to a custom executor.
    pub fn new(executor: Box<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Run a command line and return the typed result.
    pub fn capture(&self, command_line: &str) -> ExecResult<Vec<u8>> {
        self.executor.capture(command_line)
    }

    /// Run a command line and return its raw output, or `None` on failure.
    pub fn run(&self, command_line: &str) -> Option<Vec<u8>> {
        match self.capture(command_line) {
            Ok(output) => Some(output),
            Err(e) => {
                tracing::error!(command = %command_line, error = %e, "command execution failed");
                None
            }
        }
    }

    /// Like [`run`](Self::run), with the output decoded as UTF-8 (invalid
    /// sequences are replaced).
    pub fn run_text(&self, command_line: &str) -> Option<String> {
        self.run(command_line)
            .map(|output| String::from_utf8_lossy(&output).into_owned())
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(Box::new(PlatformExecutor::default()))
    }
}

//! Run an external command and capture its standard output in memory.
//!
//! One call creates a pipe, starts the child with its output bound to the
//! write end, drains the read end to end-of-stream, waits for the child and
//! releases every descriptor or handle it opened, on success and on failure.
//! There is no timeout, no stdin forwarding and no shell: the command line is
//! either tokenized with [`tokenize`] (Unix, `execvp`) or passed as-is to
//! `CreateProcessA` (Windows).
//!
//! The exit status of the child is never inspected. Once the child has been
//! spawned, whatever it wrote is returned as success, even if it exited
//! non-zero or the program could not be executed at all.
//!
//! ```
//! # #[cfg(unix)] {
//! assert_eq!(command_capture::execute("printf %s foo").as_deref(), Some("foo"));
//! assert_eq!(command_capture::execute(""), None);
//! # }
//! ```

mod command;
#[cfg(windows)]
mod console;
mod error;
mod io_adapters;
mod lexer;
#[cfg(unix)]
mod posix;
mod runner;

pub use command::{DEFAULT_CHUNK_SIZE, Executor, PlatformExecutor};
#[cfg(windows)]
pub use console::ConsoleExecutor;
pub use error::{ExecError, ExecResult};
pub use lexer::tokenize;
#[cfg(unix)]
pub use posix::ForkExecExecutor;
pub use runner::CommandRunner;

/// Runs `command_line` with the platform executor and returns its output as
/// text, or `None` if the pipe or the process could not be created.
pub fn execute(command_line: &str) -> Option<String> {
    CommandRunner::default().run_text(command_line)
}

/// Byte-exact variant of [`execute`].
pub fn execute_bytes(command_line: &str) -> Option<Vec<u8>> {
    CommandRunner::default().run(command_line)
}

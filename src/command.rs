use crate::error::ExecResult;

/// Staging buffer size used when draining a child's output pipe.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// A way of running one command line and collecting everything the child
/// writes to its output pipe.
///
/// Implementations own every OS resource they create for the duration of a
/// single [`capture`](Executor::capture) call and release all of it before
/// returning, on success and on every failure path. They keep no state between
/// calls, so independent calls from several threads do not interfere.
///
/// The exit status of the child is never inspected: once the child has been
/// spawned, whatever it wrote before terminating is returned as `Ok`.
pub trait Executor: Send + Sync {
    /// Runs `command_line` to completion and returns its captured output.
    ///
    /// Blocks until the child has closed its output and has been reaped.
    /// There is no timeout.
    fn capture(&self, command_line: &str) -> ExecResult<Vec<u8>>;
}

/// The executor matching the target platform's process primitives.
#[cfg(unix)]
pub type PlatformExecutor = crate::posix::ForkExecExecutor;

/// The executor matching the target platform's process primitives.
#[cfg(windows)]
pub type PlatformExecutor = crate::console::ConsoleExecutor;

//! Fork/exec capture path for Unix-like targets.

use crate::command::{DEFAULT_CHUNK_SIZE, Executor};
use crate::error::{ExecError, ExecResult};
use crate::io_adapters::drain_into;
use crate::lexer::tokenize;
use nix::errno::Errno;
use nix::fcntl::{FcntlArg, FdFlag, fcntl};
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, dup2, fork};
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::raw::c_char;
use std::ptr;

/// Exit status of a child whose `execvp` failed (shell convention for
/// "command not found").
const EXEC_FAILURE_STATUS: i32 = 127;

/// Captures a command's standard output by forking, redirecting the child's
/// stdout into a pipe and replacing the child image with `execvp`.
///
/// The command line is split with [`tokenize`]; the first token is looked up
/// on `PATH`. Standard error is inherited, not captured. If the program cannot
/// be executed the child writes a one-line diagnostic to stderr and exits with
/// status 127; the caller still gets `Ok` with whatever (usually nothing) was
/// written to the pipe.
#[derive(Debug, Clone)]
pub struct ForkExecExecutor {
    chunk_size: usize,
}

impl ForkExecExecutor {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the size of the staging buffer used for each pipe read.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl Default for ForkExecExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ForkExecExecutor {
    fn capture(&self, command_line: &str) -> ExecResult<Vec<u8>> {
        let tokens = tokenize(command_line);
        let Some(program) = tokens.first() else {
            return Err(ExecError::EmptyCommand);
        };

        // Everything the child touches is allocated before fork.
        let argv = ArgVector::new(&tokens)?;
        let diagnostic = format!("{program}: failed to execute\n").into_bytes();

        let (read_end, write_end) = open_pipe().map_err(ExecError::Setup)?;

        // SAFETY: between fork and exec/_exit the child only calls
        // async-signal-safe functions (close, dup2, fcntl, execvp, write).
        match unsafe { fork() } {
            Err(errno) => Err(ExecError::Spawn {
                program: program.clone(),
                source: errno.into(),
            }),
            Ok(ForkResult::Child) => exec_child(read_end, write_end, &argv, &diagnostic),
            Ok(ForkResult::Parent { child }) => {
                drop(write_end);
                tracing::debug!(pid = child.as_raw(), %program, "spawned child");

                let mut output = Vec::new();
                let mut pipe = File::from(read_end);
                if let Err(e) = drain_into(&mut pipe, &mut output, self.chunk_size) {
                    tracing::warn!(
                        pid = child.as_raw(),
                        error = %e,
                        "reading child output failed, keeping {} bytes",
                        output.len()
                    );
                }
                // Closing the read end first lets a child still writing fail with
                // EPIPE instead of blocking the wait below.
                drop(pipe);
                reap(child);

                Ok(output)
            }
        }
    }
}

/// Null-terminated `argv` for `execvp`, built in the parent.
struct ArgVector {
    args: Vec<CString>,
    pointers: Vec<*const c_char>,
}

impl ArgVector {
    fn new(tokens: &[String]) -> ExecResult<Self> {
        let args = tokens
            .iter()
            .map(|token| {
                CString::new(token.as_str()).map_err(|_| ExecError::InvalidArgument(token.clone()))
            })
            .collect::<ExecResult<Vec<_>>>()?;
        let pointers = args
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();
        Ok(Self { args, pointers })
    }

    /// Only built from a non-empty token list, so `args[0]` always exists.
    fn program(&self) -> *const c_char {
        self.args[0].as_ptr()
    }

    fn as_ptr(&self) -> *const *const c_char {
        self.pointers.as_ptr()
    }
}

/// Child side of the fork. Never returns: the process either becomes the
/// target program or exits.
fn exec_child(read_end: OwnedFd, write_end: OwnedFd, argv: &ArgVector, diagnostic: &[u8]) -> ! {
    drop(read_end);

    let fd = write_end.as_raw_fd();
    let redirected = if fd == libc::STDOUT_FILENO {
        // dup2 onto itself is a no-op and would leave close-on-exec set.
        let _ = write_end.into_raw_fd();
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty())).is_ok()
    } else {
        let ok = dup2(fd, libc::STDOUT_FILENO).is_ok();
        drop(write_end);
        ok
    };

    if redirected {
        // SAFETY: argv holds valid C strings followed by a null sentinel and
        // outlives this call.
        unsafe { libc::execvp(argv.program(), argv.as_ptr()) };
    }

    // SAFETY: write(2) and _exit(2) are async-signal-safe; _exit skips the
    // parent's atexit handlers and stdio buffers inherited through fork.
    unsafe {
        libc::write(libc::STDERR_FILENO, diagnostic.as_ptr().cast(), diagnostic.len());
        libc::_exit(EXEC_FAILURE_STATUS)
    }
}

/// Waits for `child` specifically so it never lingers as a zombie. The exit
/// status is logged and otherwise ignored.
fn reap(child: Pid) {
    loop {
        match waitpid(child, None) {
            Ok(status) => {
                tracing::debug!(pid = child.as_raw(), ?status, "child reaped");
                return;
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                tracing::warn!(pid = child.as_raw(), error = %errno, "waitpid failed");
                return;
            }
        }
    }
}

/// Creates the capture pipe with close-on-exec set on both ends, so children
/// spawned concurrently by other threads never inherit it.
#[cfg(not(any(target_os = "macos", target_os = "ios")))]
fn open_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::OFlag;
    use nix::unistd::pipe2;

    let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC)?;
    Ok(own_pipe(read_end, write_end))
}

/// Creates the capture pipe with close-on-exec set on both ends, so children
/// spawned concurrently by other threads never inherit it.
#[cfg(any(target_os = "macos", target_os = "ios"))]
fn open_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let (read_end, write_end) = nix::unistd::pipe()?;
    let (read_end, write_end) = own_pipe(read_end, write_end);
    for end in [&read_end, &write_end] {
        fcntl(end.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((read_end, write_end))
}

fn own_pipe(read_end: RawFd, write_end: RawFd) -> (OwnedFd, OwnedFd) {
    // SAFETY: both descriptors were just returned by pipe(2) and nothing else
    // holds them, so each is owned exactly once.
    unsafe { (OwnedFd::from_raw_fd(read_end), OwnedFd::from_raw_fd(write_end)) }
}

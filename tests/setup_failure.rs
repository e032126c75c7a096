//! Pipe creation failure under an exhausted descriptor table. Kept in its own
//! test binary because it lowers the process-wide `RLIMIT_NOFILE`.

#![cfg(any(target_os = "linux", target_os = "macos"))]

use command_capture::{ExecError, Executor, ForkExecExecutor, execute};
use nix::errno::Errno;
use nix::sys::resource::{Resource, getrlimit, setrlimit};
use nix::sys::wait::{WaitPidFlag, waitpid};
use nix::unistd::Pid;
use std::fs::{self, File};
use std::os::fd::AsRawFd;

#[cfg(target_os = "linux")]
const FD_DIR: &str = "/proc/self/fd";
#[cfg(target_os = "macos")]
const FD_DIR: &str = "/dev/fd";

fn open_descriptor_count() -> usize {
    fs::read_dir(FD_DIR).expect("descriptor directory").count()
}

/// Lowest descriptor number the kernel would hand out next.
fn lowest_free_descriptor() -> u64 {
    let probe = File::open("/dev/null").expect("open /dev/null");
    probe.as_raw_fd() as u64
}

#[test]
fn test_pipe_failure_is_reported_without_leaking() {
    assert!(execute("true").is_some());

    let (soft, hard) = getrlimit(Resource::RLIMIT_NOFILE).expect("getrlimit");
    let before = open_descriptor_count();

    // Every descriptor below the limit is taken, so pipe(2) fails with EMFILE.
    let limit = lowest_free_descriptor();
    setrlimit(Resource::RLIMIT_NOFILE, limit, hard).expect("lower RLIMIT_NOFILE");

    let plain = execute("echo x");
    let typed = ForkExecExecutor::new().capture("echo x");

    setrlimit(Resource::RLIMIT_NOFILE, soft, hard).expect("restore RLIMIT_NOFILE");

    assert_eq!(plain, None);
    assert!(
        matches!(&typed, Err(ExecError::Setup(e)) if e.raw_os_error() == Some(Errno::EMFILE as i32)),
        "unexpected result: {typed:?}"
    );
    assert_eq!(open_descriptor_count(), before, "descriptor leak on setup failure");

    // Nothing was forked.
    assert_eq!(
        waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)),
        Err(Errno::ECHILD)
    );

    // Capture works again once descriptors are available.
    assert_eq!(execute("echo x").as_deref(), Some("x\n"));
}

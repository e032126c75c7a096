//! Native-console capture path for Windows.

use crate::command::{DEFAULT_CHUNK_SIZE, Executor};
use crate::error::{ExecError, ExecResult};
use crate::io_adapters::drain_into;
use std::fs::File;
use std::io;
use std::mem::size_of;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};
use std::ptr;
use windows_sys::Win32::Foundation::{HANDLE, HANDLE_FLAG_INHERIT, SetHandleInformation, TRUE};
use windows_sys::Win32::Security::SECURITY_ATTRIBUTES;
use windows_sys::Win32::System::Pipes::CreatePipe;
use windows_sys::Win32::System::Threading::{
    CreateProcessA, INFINITE, PROCESS_INFORMATION, STARTF_USESTDHANDLES, STARTUPINFOA,
    WaitForSingleObject,
};

/// Captures a command's standard output and standard error by passing the
/// command line unmodified to `CreateProcessA` with both streams redirected
/// into one anonymous pipe.
///
/// Program lookup and argument splitting are left to `CreateProcessA` and the
/// child's own command-line parsing.
#[derive(Debug, Clone)]
pub struct ConsoleExecutor {
    chunk_size: usize,
}

impl ConsoleExecutor {
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

impl Default for ConsoleExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ConsoleExecutor {
    fn capture(&self, command_line: &str) -> ExecResult<Vec<u8>> {
        if command_line.contains('\0') {
            return Err(ExecError::InvalidArgument(command_line.to_string()));
        }
        // CreateProcessA may write into the command-line buffer.
        let mut command_buffer: Vec<u8> = command_line.bytes().chain(std::iter::once(0)).collect();

        let (read_end, write_end) = create_pipe().map_err(ExecError::Setup)?;

        let startup = STARTUPINFOA {
            cb: size_of::<STARTUPINFOA>() as u32,
            dwFlags: STARTF_USESTDHANDLES,
            hStdOutput: write_end.as_raw_handle(),
            hStdError: write_end.as_raw_handle(),
            ..Default::default()
        };
        let mut info = PROCESS_INFORMATION::default();

        // SAFETY: every pointer refers to a live local; the command buffer is
        // NUL-terminated and mutable.
        let created = unsafe {
            CreateProcessA(
                ptr::null(),
                command_buffer.as_mut_ptr(),
                ptr::null(),
                ptr::null(),
                TRUE,
                0,
                ptr::null(),
                ptr::null(),
                &startup,
                &mut info,
            )
        };
        if created == 0 {
            return Err(ExecError::Spawn {
                program: command_line.to_string(),
                source: io::Error::last_os_error(),
            });
        }

        // SAFETY: CreateProcessA succeeded, so both handles are valid and owned
        // by us alone.
        let process = unsafe { OwnedHandle::from_raw_handle(info.hProcess) };
        let thread = unsafe { OwnedHandle::from_raw_handle(info.hThread) };
        tracing::debug!(pid = info.dwProcessId, command = %command_line, "spawned child");

        // Our copy of the write end must go, or the read loop never sees EOF.
        drop(write_end);

        let mut output = Vec::new();
        let mut pipe = File::from(read_end);
        if let Err(e) = drain_into(&mut pipe, &mut output, self.chunk_size) {
            tracing::warn!(
                pid = info.dwProcessId,
                error = %e,
                "reading child output failed, keeping {} bytes",
                output.len()
            );
        }
        drop(pipe);

        // SAFETY: `process` is a valid process handle for the whole call.
        unsafe { WaitForSingleObject(process.as_raw_handle(), INFINITE) };
        tracing::debug!(pid = info.dwProcessId, "child exited");

        drop(thread);
        drop(process);
        Ok(output)
    }
}

/// Creates an anonymous pipe whose write end is inheritable and whose read
/// end stays private to this process.
fn create_pipe() -> io::Result<(OwnedHandle, OwnedHandle)> {
    let attributes = SECURITY_ATTRIBUTES {
        nLength: size_of::<SECURITY_ATTRIBUTES>() as u32,
        lpSecurityDescriptor: ptr::null_mut(),
        bInheritHandle: TRUE,
    };
    let mut read: HANDLE = ptr::null_mut();
    let mut write: HANDLE = ptr::null_mut();

    // SAFETY: out-pointers refer to live locals.
    if unsafe { CreatePipe(&mut read, &mut write, &attributes, 0) } == 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: CreatePipe succeeded; each handle is owned exactly once.
    let read_end = unsafe { OwnedHandle::from_raw_handle(read) };
    let write_end = unsafe { OwnedHandle::from_raw_handle(write) };

    // SAFETY: `read_end` is a valid handle.
    if unsafe { SetHandleInformation(read_end.as_raw_handle(), HANDLE_FLAG_INHERIT, 0) } == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok((read_end, write_end))
}

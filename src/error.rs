//! Failure taxonomy for a single capture call.
//!
//! Every variant is fatal to the call that produced it and is detected before
//! or at spawn time. Anything that goes wrong inside the child after a
//! successful spawn (missing program, non-zero exit) is not represented here:
//! the caller only ever sees the bytes that reached the pipe.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    /// The pipe could not be created.
    #[error("failed to create output pipe: {0}")]
    Setup(#[source] io::Error),

    /// Process creation (fork or `CreateProcessA`) failed.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The command line tokenized to nothing.
    #[error("command line is empty")]
    EmptyCommand,

    /// The command line cannot be handed to the OS as a C string.
    #[error("argument contains an interior NUL byte: {0:?}")]
    InvalidArgument(String),
}

pub type ExecResult<T> = Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_spawn_error_keeps_source() {
        let err = ExecError::Spawn {
            program: "ls".to_string(),
            source: io::Error::new(io::ErrorKind::WouldBlock, "resource temporarily unavailable"),
        };
        assert!(err.to_string().contains("'ls'"));
        let source = err.source().expect("spawn error has a source");
        assert!(source.to_string().contains("temporarily unavailable"));
    }

    #[test]
    fn test_invalid_argument_message_quotes_the_argument() {
        let err = ExecError::InvalidArgument("a\0b".to_string());
        assert_eq!(
            err.to_string(),
            "argument contains an interior NUL byte: \"a\\0b\""
        );
    }
}

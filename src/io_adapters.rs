use std::io::{ErrorKind, Read, Result as IoResult};

/// Reads `source` until end-of-stream, appending every chunk to `output`.
///
/// A fixed staging buffer of `chunk_size` bytes is reused for every read, so
/// the only growing allocation is `output` itself. Reads interrupted by a
/// signal are retried. On any other error the bytes already appended stay in
/// `output` and the error is returned.
///
/// Returns the number of bytes appended.
pub(crate) fn drain_into(
    source: &mut dyn Read,
    output: &mut Vec<u8>,
    chunk_size: usize,
) -> IoResult<usize> {
    let mut staging = vec![0u8; chunk_size.max(1)];
    let mut total = 0;

    loop {
        match source.read(&mut staging) {
            Ok(0) => return Ok(total),
            Ok(n) => {
                tracing::trace!(bytes = n, "drained chunk from child pipe");
                output.extend_from_slice(&staging[..n]);
                total += n;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{self, Cursor};

    /// Replays a scripted sequence of read results, one per call.
    struct ScriptedReader {
        steps: VecDeque<IoResult<Vec<u8>>>,
    }

    impl ScriptedReader {
        fn new(steps: Vec<IoResult<Vec<u8>>>) -> Self {
            Self {
                steps: steps.into(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
            match self.steps.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(chunk)) => {
                    assert!(chunk.len() <= buf.len(), "scripted chunk exceeds staging buffer");
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
            }
        }
    }

    #[test]
    fn test_drain_reads_to_end_across_many_chunks() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut output = Vec::new();

        let n = drain_into(&mut Cursor::new(data.clone()), &mut output, 64).unwrap();

        assert_eq!(n, data.len());
        assert_eq!(output, data);
    }

    #[test]
    fn test_drain_preserves_chunk_order() {
        let mut reader = ScriptedReader::new(vec![
            Ok(b"first ".to_vec()),
            Ok(b"second ".to_vec()),
            Ok(b"third".to_vec()),
        ]);
        let mut output = Vec::new();

        drain_into(&mut reader, &mut output, 16).unwrap();

        assert_eq!(output, b"first second third");
    }

    #[test]
    fn test_drain_retries_interrupted_reads() {
        let mut reader = ScriptedReader::new(vec![
            Ok(b"a".to_vec()),
            Err(io::Error::from(ErrorKind::Interrupted)),
            Ok(b"b".to_vec()),
        ]);
        let mut output = Vec::new();

        let n = drain_into(&mut reader, &mut output, 4).unwrap();

        assert_eq!(n, 2);
        assert_eq!(output, b"ab");
    }

    #[test]
    fn test_drain_keeps_partial_output_on_error() {
        let mut reader = ScriptedReader::new(vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::from(ErrorKind::BrokenPipe)),
            Ok(b"never read".to_vec()),
        ]);
        let mut output = Vec::new();

        let err = drain_into(&mut reader, &mut output, 16).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
        assert_eq!(output, b"partial");
    }

    #[test]
    fn test_drain_appends_to_existing_output() {
        let mut output = b"> ".to_vec();
        drain_into(&mut Cursor::new(b"hello".to_vec()), &mut output, 2).unwrap();
        assert_eq!(output, b"> hello");
    }

    #[test]
    fn test_zero_chunk_size_still_makes_progress() {
        let mut output = Vec::new();
        drain_into(&mut Cursor::new(b"xyz".to_vec()), &mut output, 0).unwrap();
        assert_eq!(output, b"xyz");
    }
}

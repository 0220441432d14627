//! Transport abstraction and message framing
//!
//! The sidecar protocol is transport-agnostic: it works over any
//! bidirectional byte stream (pipes, sockets, ...). Messages are framed as a
//! 4-byte big-endian length followed by the payload.
//!
//! This module uses **compio** for async I/O with `io_uring` backend.
//!
//! # Architecture
//!
//! ```text
//! Transport Trait
//!     ↓
//! compio::io::AsyncRead + AsyncWrite
//!     ↓
//! io_uring Operations
//! ```

use compio::io::{AsyncRead, AsyncWrite};
use std::io;

/// Largest frame accepted from the peer (64 MiB)
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Bidirectional byte stream carrying sidecar messages
///
/// # Implementations
///
/// - `PipeTransport` - stdin/stdout of the sidecar process, or Unix pipes in tests
pub trait Transport: AsyncRead + AsyncWrite + Unpin {
    /// Get transport name for debugging
    ///
    /// Used in log messages to identify which transport is being used.
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// Fill `buf` completely, or report a clean EOF
///
/// Returns `Ok(false)` if the stream ended before the first byte.
async fn fill_or_eof<T>(transport: &mut T, buf: &mut [u8]) -> io::Result<bool>
where
    T: AsyncRead + Unpin,
{
    let len = buf.len();
    let mut owned = vec![0u8; len];

    let mut offset = 0;
    while offset < len {
        // compio takes ownership of the buffer for the duration of the read
        let buf_result = transport.read(owned).await;
        let n = buf_result.0?;
        let returned_buf = buf_result.1;

        if n == 0 {
            if offset == 0 {
                return Ok(false);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Unexpected EOF while reading {len} bytes (got {offset})"),
            ));
        }

        buf[offset..offset + n].copy_from_slice(&returned_buf[..n]);
        offset += n;

        // Exact-capacity buffer so a short read never pulls in the next frame
        owned = vec![0u8; len - offset];
    }

    Ok(true)
}

/// Helper to read exact number of bytes
///
/// # Errors
///
/// Returns an error if:
/// - Transport read fails
/// - EOF is reached before buffer is full
pub async fn read_exact<T>(transport: &mut T, buf: &mut [u8]) -> io::Result<()>
where
    T: AsyncRead + Unpin,
{
    if fill_or_eof(transport, buf).await? {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("Unexpected EOF while reading {} bytes (got 0)", buf.len()),
        ))
    }
}

/// Helper to write all bytes
///
/// Writes bytes to transport using compio's buffer ownership model, then flushes.
///
/// # Errors
///
/// Returns an error if transport write or flush fails.
pub async fn write_all<T>(transport: &mut T, buf: &[u8]) -> io::Result<()>
where
    T: AsyncWrite + Unpin,
{
    use compio::io::AsyncWriteExt;

    let owned_buf = buf.to_vec();

    // write_all returns BufResult<(), B>
    let buf_result = transport.write_all(owned_buf).await;
    buf_result.0?;

    transport.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame
///
/// # Returns
///
/// Returns `Ok(None)` if the peer closed the stream at a frame boundary.
///
/// # Errors
///
/// Returns an error if the stream ends inside a frame, the announced length
/// exceeds [`MAX_FRAME_LEN`], or the transport fails.
pub async fn read_frame<T>(transport: &mut T) -> io::Result<Option<Vec<u8>>>
where
    T: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    if !fill_or_eof(transport, &mut header).await? {
        return Ok(None);
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Frame of {len} bytes exceeds limit of {MAX_FRAME_LEN}"),
        ));
    }

    let mut payload = vec![0u8; len];
    read_exact(transport, &mut payload).await?;
    Ok(Some(payload))
}

/// Write one length-prefixed frame
///
/// # Errors
///
/// Returns an error if the payload is larger than `u32::MAX` bytes or the
/// transport fails.
pub async fn write_frame<T>(transport: &mut T, payload: &[u8]) -> io::Result<()>
where
    T: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Frame of {} bytes is too large", payload.len()),
        )
    })?;

    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(payload);
    write_all(transport, &framed).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::protocol::pipe::PipeTransport;

    /// Reader and writer over one fresh pipe
    fn pipe_pair() -> (PipeTransport, PipeTransport) {
        let (read_fd, write_fd) = PipeTransport::create_pipe().unwrap();

        let read_fd_dup = unsafe { libc::dup(read_fd) };
        let write_fd_dup = unsafe { libc::dup(write_fd) };

        let reader =
            unsafe { PipeTransport::from_fds(read_fd, read_fd_dup, "reader".to_string()).unwrap() };
        let writer = unsafe {
            PipeTransport::from_fds(write_fd_dup, write_fd, "writer".to_string()).unwrap()
        };
        (reader, writer)
    }

    #[compio::test]
    async fn test_read_exact_success() {
        // Test: read_exact should fill the buffer completely
        let (mut reader, mut writer) = pipe_pair();

        let test_data = b"Hello, World! This is a test.";
        write_all(&mut writer, test_data).await.unwrap();

        let mut buf = vec![0u8; test_data.len()];
        read_exact(&mut reader, &mut buf).await.unwrap();

        assert_eq!(&buf, test_data);
    }

    #[compio::test]
    async fn test_read_exact_eof_error() {
        // Test: read_exact should error on unexpected EOF
        let (mut reader, mut writer) = pipe_pair();

        write_all(&mut writer, b"short").await.unwrap();
        drop(writer);

        let mut buf = vec![0u8; 100];
        let err = read_exact(&mut reader, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[compio::test]
    async fn test_frame_sequence_then_clean_eof() {
        // Test: frames come back in order and a closed stream ends cleanly
        let (mut reader, mut writer) = pipe_pair();

        let messages = [
            b"First message".as_slice(),
            b"".as_slice(),
            b"Third, with more data".as_slice(),
        ];
        for msg in messages {
            write_frame(&mut writer, msg).await.unwrap();
        }
        drop(writer);

        for msg in messages {
            let frame = read_frame(&mut reader).await.unwrap().unwrap();
            assert_eq!(frame, msg);
        }
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[compio::test]
    async fn test_frame_truncated_payload() {
        // Test: EOF inside a frame is an error, not a clean end
        let (mut reader, mut writer) = pipe_pair();

        write_all(&mut writer, &[0, 0, 0, 10, b'a', b'b']).await.unwrap();
        drop(writer);

        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[compio::test]
    async fn test_frame_oversized_rejected() {
        // Test: announced length above the limit is refused before allocating
        let (mut reader, mut writer) = pipe_pair();

        write_all(&mut writer, &u32::MAX.to_be_bytes()).await.unwrap();

        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[compio::test]
    async fn test_large_frame() {
        // Test: a frame larger than the pipe buffer arrives intact
        let (mut reader, mut writer) = pipe_pair();

        let payload: Vec<u8> = (0..200_000).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let send = async move {
            write_frame(&mut writer, &payload).await.unwrap();
        };
        let recv = async move { read_frame(&mut reader).await.unwrap().unwrap() };

        let ((), received) = futures::join!(send, recv);
        assert_eq!(received, expected);
    }
}

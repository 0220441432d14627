//! Pipe-based transport
//!
//! The sidecar talks to its host over stdin/stdout. Tests use the same type
//! over anonymous Unix pipes.
//!
//! This implementation uses **`compio::fs::AsyncFd`** with **`io_uring` backend** for
//! true async stream I/O.
#![allow(clippy::future_not_send)] // compio buffers are not Send by design

use super::transport::Transport;
use compio::fs::AsyncFd;
use compio::io::{AsyncRead, AsyncWrite};
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::io::{FromRawFd, RawFd};

/// Pipe-based transport
///
/// Uses `compio::fs::AsyncFd` to wrap file descriptors and provide stream-based
/// async I/O with `io_uring` backend.
pub struct PipeTransport {
    /// Reader end (stdin or custom FD)
    reader: AsyncFd<OwnedFd>,
    /// Writer end (stdout or custom FD)
    writer: AsyncFd<OwnedFd>,
    /// Transport name for debugging
    name: String,
}

impl PipeTransport {
    /// Create from stdin/stdout
    ///
    /// # Errors
    ///
    /// Returns an error if FD duplication or `AsyncFd` creation fails.
    pub fn from_stdio() -> io::Result<Self> {
        // Duplicate FDs so we don't close stdin/stdout
        let stdin_fd = unsafe { libc::dup(0) };
        let stdout_fd = unsafe { libc::dup(1) };

        if stdin_fd < 0 || stdout_fd < 0 {
            return Err(io::Error::last_os_error());
        }

        // SAFETY: We just created these FDs via dup()
        unsafe { Self::from_fds(stdin_fd, stdout_fd, "stdio".to_string()) }
    }

    /// Create from specific file descriptors
    ///
    /// # Errors
    ///
    /// Returns an error if either FD cannot be registered with the runtime.
    ///
    /// # Safety
    ///
    /// Caller must ensure FDs are valid and not closed elsewhere.
    pub unsafe fn from_fds(read_fd: RawFd, write_fd: RawFd, name: String) -> io::Result<Self> {
        let read_owned = OwnedFd::from_raw_fd(read_fd);
        let write_owned = OwnedFd::from_raw_fd(write_fd);

        let reader = AsyncFd::new(read_owned)?;
        let writer = AsyncFd::new(write_owned)?;

        Ok(Self {
            reader,
            writer,
            name,
        })
    }

    /// Create a Unix pipe pair, returns (`read_fd`, `write_fd`)
    ///
    /// # Errors
    ///
    /// Returns the OS error if `pipe(2)` fails.
    pub fn create_pipe() -> io::Result<(RawFd, RawFd)> {
        let mut fds = [0i32; 2];
        unsafe {
            if libc::pipe(fds.as_mut_ptr()) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(fds.into())
    }

    /// Name given at construction, for log messages
    #[must_use]
    pub fn label(&self) -> &str {
        &self.name
    }
}

impl AsyncRead for PipeTransport {
    async fn read<B: compio::buf::IoBufMut>(&mut self, buf: B) -> compio::buf::BufResult<usize, B> {
        self.reader.read(buf).await
    }
}

impl AsyncWrite for PipeTransport {
    async fn write<B: compio::buf::IoBuf>(&mut self, buf: B) -> compio::buf::BufResult<usize, B> {
        self.writer.write(buf).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

impl Transport for PipeTransport {
    fn name(&self) -> &'static str {
        "pipe"
    }
}

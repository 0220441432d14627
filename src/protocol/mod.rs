//! Sidecar protocol
//!
//! The sidecar is driven by its host over a byte stream, normally the
//! process's stdin/stdout. At startup it announces its registrations, then it
//! answers one [`wire::Request`] per frame until the host closes the stream.
//!
//! ```text
//! host                                sidecar
//!   |  <---- register (provider) ------  |
//!   |  <---- register (content) -------  |
//!   |  ----- request {id, call} ------>  |
//!   |  <---- response {id, outcome} ---  |
//!   |  ----- EOF --------------------->  |
//! ```
//!
//! A frame that does not parse is answered with `id: null` and an `invalid`
//! error; the session continues.
#![allow(clippy::future_not_send)] // compio buffers are not Send by design

pub mod pipe;
pub mod transport;
pub mod wire;

use crate::content::ContentReader;
use crate::error::{Result, SidecarError};
use crate::resource::{PathResolver, UriPathResolver};
use crate::service::{DeleteOptions, FileAccessService, RenameOptions, WriteOptions};
use tracing::{debug, info, trace, warn};
use transport::{read_frame, write_frame, Transport};
use wire::{Call, Message, Outcome, Reply, Request, WireError, WireStat};

/// Counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    /// Requests answered, including failed ones
    pub requests: u64,
    /// Requests answered with an error
    pub failures: u64,
    /// Frames that could not be parsed
    pub malformed: u64,
}

/// Serves the provider and the content reader over one transport
pub struct SidecarServer<T, R = UriPathResolver> {
    transport: T,
    files: FileAccessService<R>,
    content: ContentReader<R>,
    stats: ServeStats,
}

impl<T: Transport> SidecarServer<T, UriPathResolver> {
    /// Create a server resolving `file:` and `file-sidecar-*` identifiers
    #[must_use]
    pub fn with_default_resolver(transport: T) -> Self {
        Self::new(transport, UriPathResolver::new())
    }
}

impl<T, R> SidecarServer<T, R>
where
    T: Transport,
    R: PathResolver + Clone,
{
    /// Create a server over `transport`
    #[must_use]
    pub fn new(transport: T, resolver: R) -> Self {
        Self {
            transport,
            files: FileAccessService::new(resolver.clone()),
            content: ContentReader::new(resolver),
            stats: ServeStats::default(),
        }
    }

    /// The filesystem provider behind this server
    #[must_use]
    pub const fn files(&self) -> &FileAccessService<R> {
        &self.files
    }

    /// The content reader behind this server
    #[must_use]
    pub const fn content(&self) -> &ContentReader<R> {
        &self.content
    }

    /// Register both capabilities and announce them to the host
    ///
    /// Without a machine name nothing is registered and nothing is sent.
    /// Calling this again sends nothing.
    ///
    /// # Returns
    ///
    /// Number of registrations sent.
    ///
    /// # Errors
    ///
    /// Returns `SidecarError::Transport` if a frame cannot be written.
    pub async fn start(&mut self, machine_name: Option<&str>) -> Result<usize> {
        let mut pending = Vec::new();
        self.files.on_start(&mut pending, machine_name);
        self.content.on_start(&mut pending, machine_name);

        for registration in &pending {
            self.send(&Message::Register {
                capability: registration.capability,
                scheme: registration.scheme.clone(),
            })
            .await?;
        }

        if pending.is_empty() {
            warn!("No machine name available, serving without registration");
        }
        Ok(pending.len())
    }

    /// Answer requests until the host closes the stream
    ///
    /// # Errors
    ///
    /// Returns `SidecarError::Transport` if the stream breaks mid-frame or a
    /// response cannot be written. Filesystem failures are reported to the
    /// host, never returned here.
    pub async fn serve(&mut self) -> Result<ServeStats> {
        info!("Serving over {} transport", self.transport.name());

        while let Some(frame) = read_frame(&mut self.transport)
            .await
            .map_err(SidecarError::Transport)?
        {
            trace!("Received frame of {} bytes", frame.len());
            let response = self.handle_frame(&frame).await;
            self.send(&response).await?;
        }

        debug!("Host closed the stream: {:?}", self.stats);
        Ok(self.stats)
    }

    /// Counters so far
    #[must_use]
    pub const fn stats(&self) -> ServeStats {
        self.stats
    }

    async fn handle_frame(&mut self, frame: &[u8]) -> Message {
        let request: Request = match serde_json::from_slice(frame) {
            Ok(request) => request,
            Err(e) => {
                warn!("Malformed request: {e}");
                self.stats.malformed += 1;
                return Message::Response {
                    id: None,
                    outcome: Outcome::Err {
                        error: WireError::Invalid {
                            message: format!("Malformed request: {e}"),
                        },
                    },
                };
            }
        };

        let operation = request.call.operation();
        let outcome = dispatch(&self.files, &self.content, request.call).await;

        self.stats.requests += 1;
        if let Outcome::Err { error } = &outcome {
            self.stats.failures += 1;
            debug!("Request {} ({operation}) failed: {error:?}", request.id);
        }

        Message::Response {
            id: Some(request.id),
            outcome,
        }
    }

    async fn send(&mut self, message: &Message) -> Result<()> {
        let payload =
            serde_json::to_vec(message).map_err(|e| SidecarError::Protocol(e.to_string()))?;
        write_frame(&mut self.transport, &payload)
            .await
            .map_err(SidecarError::Transport)
    }
}

/// Run one call against the provider or the content reader
pub async fn dispatch<R: PathResolver>(
    files: &FileAccessService<R>,
    content: &ContentReader<R>,
    call: Call,
) -> Outcome {
    let result = match call {
        Call::Stat { resource } => files
            .stat(&resource)
            .await
            .map(|stat| Reply::Stat(WireStat::from(&stat))),
        Call::ReadFile { resource } => files
            .read_file(&resource)
            .await
            .map(|bytes| Reply::bytes(&bytes)),
        Call::Read { uri, encoding } => content
            .read(&uri, encoding.as_deref())
            .await
            .map(|text| Reply::Text { text }),
        Call::Delete {
            resource,
            recursive,
            use_trash,
        } => files
            .delete(
                &resource,
                DeleteOptions {
                    recursive,
                    use_trash,
                },
            )
            .await
            .map(|()| empty_reply()),
        Call::Mkdir { resource } => files.mkdir(&resource).await.map(|()| empty_reply()),
        Call::Rename {
            from,
            to,
            overwrite,
        } => files
            .rename(&from, &to, RenameOptions { overwrite })
            .await
            .map(|()| empty_reply()),
        // Payload is left encoded, the write is rejected regardless
        Call::WriteFile {
            resource,
            content,
            overwrite,
            create,
        } => {
            trace!("writeFile payload of {} encoded bytes", content.len());
            files
                .write_file(&resource, &[], WriteOptions { overwrite, create })
                .await
                .map(|()| empty_reply())
        }
        Call::Readdir { resource } => files.readdir(&resource).await.map(|_| empty_reply()),
    };

    match result {
        Ok(value) => Outcome::Ok { value },
        Err(e) => Outcome::Err {
            error: WireError::from(&e),
        },
    }
}

/// Reply for operations that return no value
const fn empty_reply() -> Reply {
    Reply::Text { text: None }
}

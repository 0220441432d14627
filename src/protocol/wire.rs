//! Wire messages
//!
//! Every frame carries one JSON document. Inbound frames are [`Request`]s;
//! outbound frames are [`Message`]s (registration notifications and
//! responses).
//!
//! Errors are split by `kind` so a receiver can tell a real filesystem
//! problem (`fileSystem`, with a taxonomy code) from a capability that was
//! never built (`unsupported`) without looking at message text.

use crate::error::{ErrorCode, SidecarError};
use crate::filesystem::{FileKind, FileStat};
use crate::service::{Capability, Operation};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Inbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id echoed in the response
    pub id: u64,
    /// The call to perform
    pub call: Call,
}

/// Calls of the provider surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Call {
    /// Link-aware stat
    Stat {
        /// Resource identifier
        resource: String,
    },
    /// Whole-file read
    ReadFile {
        /// Resource identifier
        resource: String,
    },
    /// Decoded read, `null` text for a missing file
    Read {
        /// Resource identifier
        uri: String,
        /// Optional encoding label
        #[serde(default)]
        encoding: Option<String>,
    },
    /// Unsupported
    Delete {
        /// Resource identifier
        resource: String,
        /// Recursive delete
        #[serde(default)]
        recursive: bool,
        /// Move to trash
        #[serde(default, rename = "useTrash")]
        use_trash: bool,
    },
    /// Unsupported
    Mkdir {
        /// Resource identifier
        resource: String,
    },
    /// Unsupported
    Rename {
        /// Source identifier
        from: String,
        /// Destination identifier
        to: String,
        /// Replace an existing destination
        #[serde(default)]
        overwrite: bool,
    },
    /// Unsupported
    WriteFile {
        /// Resource identifier
        resource: String,
        /// Base64 content (never decoded)
        content: String,
        /// Replace an existing file
        #[serde(default)]
        overwrite: bool,
        /// Create if missing
        #[serde(default)]
        create: bool,
    },
    /// Unsupported
    Readdir {
        /// Resource identifier
        resource: String,
    },
}

impl Call {
    /// Operation this call maps to
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Stat { .. } => Operation::Stat,
            Self::ReadFile { .. } => Operation::ReadFile,
            Self::Read { .. } => Operation::Read,
            Self::Delete { .. } => Operation::Delete,
            Self::Mkdir { .. } => Operation::Mkdir,
            Self::Rename { .. } => Operation::Rename,
            Self::WriteFile { .. } => Operation::WriteFile,
            Self::Readdir { .. } => Operation::Readdir,
        }
    }
}

/// Outbound frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    /// Registration issued at startup
    Register {
        /// Registered capability
        capability: Capability,
        /// Scheme it answers for
        scheme: String,
    },
    /// Answer to a request; `id` is `null` if the request could not be parsed
    Response {
        /// Correlation id of the request
        id: Option<u64>,
        /// Result of the call
        outcome: Outcome,
    },
}

/// Success or failure of a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    /// The call succeeded
    Ok {
        /// Returned value
        value: Reply,
    },
    /// The call failed
    Err {
        /// Failure description
        error: WireError,
    },
}

/// Successful reply values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Reply {
    /// Result of `stat`
    Stat(WireStat),
    /// Result of `readFile`, base64 encoded
    Bytes {
        /// Base64 file content
        content: String,
    },
    /// Result of `read`
    Text {
        /// Decoded text, `null` if the file does not exist
        text: Option<String>,
    },
}

impl Reply {
    /// Wrap raw file bytes
    #[must_use]
    pub fn bytes(content: &[u8]) -> Self {
        Self::Bytes {
            content: base64::engine::general_purpose::STANDARD.encode(content),
        }
    }

    /// Decode a `Bytes` reply
    ///
    /// Returns `None` for other replies or invalid base64.
    #[must_use]
    pub fn decode_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes { content } => base64::engine::general_purpose::STANDARD
                .decode(content)
                .ok(),
            _ => None,
        }
    }
}

/// Stat on the wire: bitset type and millisecond timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireStat {
    /// Bitset: Unknown 0, File 1, Directory 2, SymbolicLink 64
    #[serde(rename = "type")]
    pub kind: u32,
    /// Creation time, ms since epoch
    pub ctime: i64,
    /// Modification time, ms since epoch
    pub mtime: i64,
    /// Size in bytes
    pub size: u64,
}

impl WireStat {
    /// Decode the type bitset
    #[must_use]
    pub const fn file_kind(&self) -> Option<FileKind> {
        FileKind::from_bits(self.kind)
    }
}

impl From<&FileStat> for WireStat {
    fn from(stat: &FileStat) -> Self {
        Self {
            kind: stat.kind.bits(),
            ctime: stat.created_ms(),
            mtime: stat.modified_ms(),
            size: stat.size,
        }
    }
}

/// Failure on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WireError {
    /// Normalized filesystem failure
    FileSystem {
        /// Taxonomy code
        code: ErrorCode,
        /// Error name, `<code> (FileSystemError)`
        name: String,
        /// Human-readable message
        message: String,
    },
    /// Operation never implemented by the sidecar
    Unsupported {
        /// Rejected operation
        operation: Operation,
        /// Human-readable message
        message: String,
    },
    /// Request could not be understood
    Invalid {
        /// Human-readable message
        message: String,
    },
    /// Sidecar-side failure unrelated to the path
    Internal {
        /// Human-readable message
        message: String,
    },
}

impl From<&SidecarError> for WireError {
    fn from(error: &SidecarError) -> Self {
        match error {
            SidecarError::Access(access) => Self::FileSystem {
                code: access.code(),
                name: access.name(),
                message: access.message().to_string(),
            },
            SidecarError::Unsupported { operation } => Self::Unsupported {
                operation: *operation,
                message: error.to_string(),
            },
            SidecarError::InvalidResource { .. }
            | SidecarError::InvalidEncoding(_)
            | SidecarError::Protocol(_) => Self::Invalid {
                message: error.to_string(),
            },
            SidecarError::Transport(_) => Self::Internal {
                message: error.to_string(),
            },
        }
    }
}

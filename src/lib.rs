//! sidecar-fs - read-only filesystem sidecar
//!
//! Exposes a machine's local filesystem to a remote editor under the scheme
//! `file-sidecar-<machine>`. Only `stat` and whole-file reads are served;
//! mutations and directory listing are rejected with a distinct
//! "unsupported" error.
//!
//! # Layers
//!
//! - [`filesystem`]: link-aware stat and reads over compio
//! - [`error`]: normalization of OS failures into a small error taxonomy
//! - [`service`] and [`content`]: the operations offered to the host
//! - [`protocol`]: framed JSON over stdin/stdout

pub mod cli;
pub mod content;
pub mod error;
pub mod filesystem;
pub mod protocol;
pub mod resource;
pub mod service;

pub use content::ContentReader;
pub use error::{normalize, AccessError, ErrorCode, Result, SidecarError};
pub use filesystem::{BaseKind, FileKind, FileStat};
pub use resource::{PathResolver, UriPathResolver};
pub use service::{Capability, CapabilityRegistrar, FileAccessService, Operation, Registration};

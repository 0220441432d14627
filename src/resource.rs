//! Resource identifiers and scheme naming
//!
//! The remote editor addresses files with URIs. A sidecar registers the
//! scheme `file-sidecar-<machine>` and receives URIs in that scheme (or plain
//! `file:` URIs); both map onto the sidecar's local filesystem.

use crate::error::{Result, SidecarError};
use std::path::PathBuf;
use url::Url;

/// Prefix of every scheme registered by a sidecar
pub const SCHEME_PREFIX: &str = "file-sidecar-";

/// Build the scheme name for a machine identity
///
/// Returns `None` for an empty identity: a sidecar without a machine name
/// registers nothing.
#[must_use]
pub fn sidecar_scheme(machine_name: &str) -> Option<String> {
    if machine_name.is_empty() {
        None
    } else {
        Some(format!("{SCHEME_PREFIX}{machine_name}"))
    }
}

/// Maps an opaque resource identifier to a local path
pub trait PathResolver: Send + Sync {
    /// Resolve `resource` to a path on the local filesystem
    ///
    /// # Errors
    ///
    /// Returns `SidecarError::InvalidResource` if the identifier cannot be
    /// mapped to a local path.
    fn resolve(&self, resource: &str) -> Result<PathBuf>;
}

/// Default resolver for `file:` and `file-sidecar-*:` URIs
///
/// Bare absolute paths are accepted as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct UriPathResolver;

impl UriPathResolver {
    /// Create a new resolver
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PathResolver for UriPathResolver {
    fn resolve(&self, resource: &str) -> Result<PathBuf> {
        if resource.starts_with('/') {
            return Ok(PathBuf::from(resource));
        }

        let invalid = |reason: &str| SidecarError::InvalidResource {
            resource: resource.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = resource
            .split_once(':')
            .ok_or_else(|| invalid("not a URI or absolute path"))?;

        // Sidecar schemes are non-special to the URL parser; reparse them as
        // file URIs so host handling and percent-decoding match `file:`
        let is_file_scheme = scheme.eq_ignore_ascii_case("file")
            || scheme.to_ascii_lowercase().starts_with(SCHEME_PREFIX);
        if !is_file_scheme {
            return Err(invalid(&format!("unsupported scheme '{scheme}'")));
        }

        let url = Url::parse(&format!("file:{rest}")).map_err(|e| invalid(&e.to_string()))?;
        url.to_file_path()
            .map_err(|()| invalid("URI does not name a local file"))
    }
}

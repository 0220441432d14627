//! Content reader
//!
//! A second entrypoint next to [`FileAccessService::read_file`](crate::service::FileAccessService::read_file):
//! it decodes the file as text and answers `None` instead of failing when the
//! file does not exist. It registers separately under the same scheme.

use crate::error::Result;
use crate::filesystem::read_text_if_exists;
use crate::resource::{PathResolver, UriPathResolver};
use crate::service::{register_once, Capability, CapabilityRegistrar};
use std::sync::OnceLock;
use tracing::debug;

/// Text reader that tolerates missing files
pub struct ContentReader<R = UriPathResolver> {
    resolver: R,
    scheme: OnceLock<String>,
}

impl Default for ContentReader<UriPathResolver> {
    fn default() -> Self {
        Self::new(UriPathResolver::new())
    }
}

impl<R: PathResolver> ContentReader<R> {
    /// Create a reader resolving identifiers with `resolver`
    #[must_use]
    pub const fn new(resolver: R) -> Self {
        Self {
            resolver,
            scheme: OnceLock::new(),
        }
    }

    /// Register the content reader for this machine's scheme
    ///
    /// Same rules as the filesystem provider: skipped without a machine name,
    /// performed at most once.
    pub fn on_start(
        &self,
        registrar: &mut dyn CapabilityRegistrar,
        machine_name: Option<&str>,
    ) -> bool {
        register_once(
            &self.scheme,
            registrar,
            Capability::ContentReader,
            machine_name,
        )
    }

    /// Scheme registered by `on_start`, if any
    #[must_use]
    pub fn registered_scheme(&self) -> Option<&str> {
        self.scheme.get().map(String::as_str)
    }

    /// Read `uri` as text
    ///
    /// `encoding` is an optional label such as `utf8`, `latin1` or `base64`;
    /// UTF-8 when absent.
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the file does not exist, whatever the label.
    ///
    /// # Errors
    ///
    /// Returns `SidecarError::InvalidResource` for an unmappable identifier,
    /// `SidecarError::InvalidEncoding` for an unknown label on an existing
    /// file, or `SidecarError::Access` if an existing file cannot be read.
    #[allow(clippy::future_not_send)]
    pub async fn read(&self, uri: &str, encoding: Option<&str>) -> Result<Option<String>> {
        let path = self.resolver.resolve(uri)?;
        debug!("read {} ({})", path.display(), encoding.unwrap_or("utf8"));
        read_text_if_exists(&path, encoding).await
    }
}

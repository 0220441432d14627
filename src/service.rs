//! File access façade
//!
//! [`FileAccessService`] is what the remote editor talks to: `stat` and
//! `read_file` are implemented, every mutating or listing operation fails
//! immediately with [`SidecarError::Unsupported`].
//!
//! # Lifecycle
//!
//! The only state is the registered scheme. `on_start` registers
//! `file-sidecar-<machine>` once if a machine identity is available and is a
//! no-op otherwise. Requests carry no state between calls.

use crate::error::{normalize, Result, SidecarError};
use crate::filesystem::{read_file_content, stat_path, FileKind, FileStat};
use crate::resource::{sidecar_scheme, PathResolver, UriPathResolver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Capabilities a sidecar can register with the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Full filesystem provider (`stat`, `readFile`, ...)
    FileSystemProvider,
    /// Content reader (`read` with encoding)
    ContentReader,
}

/// A registration request issued at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// What is being registered
    pub capability: Capability,
    /// Scheme the capability answers for
    pub scheme: String,
}

/// Narrow interface to the remote side's registration call
///
/// Implemented by whatever carries messages to the remote editor. No retry
/// and no unregistration.
pub trait CapabilityRegistrar {
    /// Register `capability` for `scheme`
    fn register_capability(&mut self, capability: Capability, scheme: &str);
}

impl CapabilityRegistrar for Vec<Registration> {
    fn register_capability(&mut self, capability: Capability, scheme: &str) {
        self.push(Registration {
            capability,
            scheme: scheme.to_string(),
        });
    }
}

/// Register `capability` once for the machine's scheme
///
/// Returns `true` only for the call that performed the registration.
pub(crate) fn register_once(
    slot: &OnceLock<String>,
    registrar: &mut dyn CapabilityRegistrar,
    capability: Capability,
    machine_name: Option<&str>,
) -> bool {
    let Some(scheme) = machine_name.and_then(sidecar_scheme) else {
        debug!("No machine name, {capability:?} not registered");
        return false;
    };

    if slot.set(scheme.clone()).is_err() {
        debug!("{capability:?} already registered, ignoring repeated start");
        return false;
    }

    registrar.register_capability(capability, &scheme);
    info!("Registered {capability:?} for scheme {scheme}");
    true
}

/// Every operation of the provider surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Link-aware stat
    Stat,
    /// Whole-file read
    ReadFile,
    /// Decoded read that tolerates missing files
    Read,
    /// Not supported
    Delete,
    /// Not supported
    Mkdir,
    /// Not supported
    Rename,
    /// Not supported
    WriteFile,
    /// Not supported
    Readdir,
}

impl Operation {
    /// Wire name of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stat => "stat",
            Self::ReadFile => "readFile",
            Self::Read => "read",
            Self::Delete => "delete",
            Self::Mkdir => "mkdir",
            Self::Rename => "rename",
            Self::WriteFile => "writeFile",
            Self::Readdir => "readdir",
        }
    }

    /// Check if the sidecar implements this operation
    #[must_use]
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Stat | Self::ReadFile | Self::Read)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options accepted (and ignored) by `delete`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Delete directories recursively
    pub recursive: bool,
    /// Move to trash instead of deleting
    pub use_trash: bool,
}

/// Options accepted (and ignored) by `rename`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameOptions {
    /// Replace an existing destination
    pub overwrite: bool,
}

/// Options accepted (and ignored) by `write_file`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace an existing file
    pub overwrite: bool,
    /// Create the file if missing
    pub create: bool,
}

/// Read-only filesystem provider for one local filesystem
pub struct FileAccessService<R = UriPathResolver> {
    resolver: R,
    scheme: OnceLock<String>,
}

impl Default for FileAccessService<UriPathResolver> {
    fn default() -> Self {
        Self::new(UriPathResolver::new())
    }
}

impl<R: PathResolver> FileAccessService<R> {
    /// Create a service resolving identifiers with `resolver`
    #[must_use]
    pub const fn new(resolver: R) -> Self {
        Self {
            resolver,
            scheme: OnceLock::new(),
        }
    }

    /// Register the filesystem provider for this machine's scheme
    ///
    /// Does nothing when `machine_name` is absent or empty, and on every call
    /// after the first successful one.
    ///
    /// # Returns
    ///
    /// Returns `true` if this call registered the provider.
    pub fn on_start(
        &self,
        registrar: &mut dyn CapabilityRegistrar,
        machine_name: Option<&str>,
    ) -> bool {
        register_once(
            &self.scheme,
            registrar,
            Capability::FileSystemProvider,
            machine_name,
        )
    }

    /// Scheme registered by `on_start`, if any
    #[must_use]
    pub fn registered_scheme(&self) -> Option<&str> {
        self.scheme.get().map(String::as_str)
    }

    /// Link-aware stat of a resource
    ///
    /// A healthy symlink reports its target's kind and size with the link
    /// flag set; a dangling one reports `Unknown` with the link's own
    /// metadata.
    ///
    /// # Errors
    ///
    /// Returns `SidecarError::InvalidResource` if the identifier does not map
    /// to a local path, or `SidecarError::Access` for any filesystem failure.
    #[allow(clippy::future_not_send)]
    pub async fn stat(&self, resource: &str) -> Result<FileStat> {
        let path = self.resolver.resolve(resource)?;
        debug!("stat {}", path.display());
        let stat = stat_path(&path).await.map_err(normalize)?;
        Ok(stat)
    }

    /// Read a whole file
    ///
    /// # Errors
    ///
    /// Returns `SidecarError::InvalidResource` if the identifier does not map
    /// to a local path, or `SidecarError::Access` if the file cannot be read
    /// (`NotFound` when it does not exist).
    #[allow(clippy::future_not_send)]
    pub async fn read_file(&self, resource: &str) -> Result<Vec<u8>> {
        let path = self.resolver.resolve(resource)?;
        debug!("readFile {}", path.display());
        let content = read_file_content(&path).await.map_err(normalize)?;
        Ok(content)
    }

    /// Not supported
    ///
    /// # Errors
    ///
    /// Always returns `SidecarError::Unsupported`.
    #[allow(clippy::unused_async)]
    pub async fn delete(&self, resource: &str, options: DeleteOptions) -> Result<()> {
        debug!("delete {resource} rejected ({options:?})");
        Err(SidecarError::unsupported(Operation::Delete))
    }

    /// Not supported
    ///
    /// # Errors
    ///
    /// Always returns `SidecarError::Unsupported`.
    #[allow(clippy::unused_async)]
    pub async fn mkdir(&self, resource: &str) -> Result<()> {
        debug!("mkdir {resource} rejected");
        Err(SidecarError::unsupported(Operation::Mkdir))
    }

    /// Not supported
    ///
    /// # Errors
    ///
    /// Always returns `SidecarError::Unsupported`.
    #[allow(clippy::unused_async)]
    pub async fn rename(&self, from: &str, to: &str, options: RenameOptions) -> Result<()> {
        debug!("rename {from} -> {to} rejected ({options:?})");
        Err(SidecarError::unsupported(Operation::Rename))
    }

    /// Not supported
    ///
    /// # Errors
    ///
    /// Always returns `SidecarError::Unsupported`.
    #[allow(clippy::unused_async)]
    pub async fn write_file(
        &self,
        resource: &str,
        _content: &[u8],
        options: WriteOptions,
    ) -> Result<()> {
        debug!("writeFile {resource} rejected ({options:?})");
        Err(SidecarError::unsupported(Operation::WriteFile))
    }

    /// Not supported
    ///
    /// # Errors
    ///
    /// Always returns `SidecarError::Unsupported`.
    #[allow(clippy::unused_async)]
    pub async fn readdir(&self, resource: &str) -> Result<Vec<(String, FileKind)>> {
        debug!("readdir {resource} rejected");
        Err(SidecarError::unsupported(Operation::Readdir))
    }
}

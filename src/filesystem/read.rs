//! Whole-file reads
//!
//! Two contracts live here:
//!
//! - [`read_file_content`] fails with `NotFound` for a missing file.
//! - [`read_text_if_exists`] returns `None` for a missing file.

use crate::error::{normalize, AccessError, Result};
use crate::filesystem::encoding::TextEncoding;
use std::path::Path;
use tracing::trace;

/// Read an entire file
///
/// No streaming and no size limit: the whole file is returned in one buffer.
///
/// # Errors
///
/// Returns a normalized [`AccessError`] if the file cannot be read.
///
/// # Examples
///
/// ```rust,ignore
/// use sidecar_fs::filesystem::read_file_content;
///
/// #[compio::main]
/// async fn main() -> Result<(), sidecar_fs::error::AccessError> {
///     let content = read_file_content("/etc/hostname".as_ref()).await?;
///     println!("Read {} bytes", content.len());
///     Ok(())
/// }
/// ```
#[allow(clippy::future_not_send)]
pub async fn read_file_content(path: &Path) -> std::result::Result<Vec<u8>, AccessError> {
    compio::fs::read(path).await.map_err(normalize)
}

/// Read and decode a file, or `None` if it does not exist
///
/// Existence follows symlinks, so a dangling link counts as missing. A file
/// that disappears between the existence check and the read is also
/// reported as missing. The encoding `hint` is only parsed once the file is
/// known to exist, so a missing file is `None` whatever the hint.
///
/// # Errors
///
/// Returns `SidecarError::InvalidEncoding` for an unknown hint on an
/// existing file, or `SidecarError::Access` if the file exists but cannot be
/// read (a directory, no permission, ...).
#[allow(clippy::future_not_send)]
pub async fn read_text_if_exists(path: &Path, hint: Option<&str>) -> Result<Option<String>> {
    if compio::fs::metadata(path).await.is_err() {
        trace!("{} does not exist, no content", path.display());
        return Ok(None);
    }

    let encoding = TextEncoding::from_hint(hint)?;
    trace!("read {} as {encoding:?}", path.display());

    match read_file_content(path).await {
        Ok(bytes) => Ok(Some(encoding.decode(&bytes))),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

//! Link-aware stat
//!
//! Resolves a path in two phases: a non-following stat of the path itself,
//! then (only for symlinks, or when the first phase failed) a following stat
//! of the target. A healthy link reports its target's type and size; a link
//! whose target is missing reports its own metadata with `Unknown` type.
//!
//! # Known limitation
//!
//! A failure of the first phase is ignored and the path is treated as "not a
//! link". This masks errors other than ENOENT on the link itself (for example
//! EACCES on a parent directory only surfaces if the second phase also
//! fails). The swallowed error is logged at trace level.

use crate::error::{normalize, AccessError, ErrorCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Snapshot of the fields of an OS stat record that the sidecar reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatRecord {
    /// Regular file
    pub is_file: bool,
    /// Directory
    pub is_dir: bool,
    /// Symbolic link (only ever true for a non-following stat)
    pub is_symlink: bool,
    /// Size in bytes
    pub size: u64,
    /// Birth time, or the epoch when the filesystem does not record it
    pub created: SystemTime,
    /// Last modification time
    pub modified: SystemTime,
}

impl StatRecord {
    /// Capture the reported fields from compio metadata
    #[must_use]
    pub fn from_metadata(metadata: &compio::fs::Metadata) -> Self {
        Self {
            is_file: metadata.is_file(),
            is_dir: metadata.is_dir(),
            is_symlink: metadata.is_symlink(),
            size: metadata.len(),
            // Creation time on purpose, not ctime
            created: metadata.created().unwrap_or(UNIX_EPOCH),
            modified: metadata.modified().unwrap_or(UNIX_EPOCH),
        }
    }
}

/// Present when the resolved path was itself a symbolic link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolicLink {
    /// The link's target does not exist
    pub dangling: bool,
}

/// Outcome of the two-phase stat
///
/// `stat` holds the target's record for a healthy link and the link's own
/// record for a dangling one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkResolution {
    /// Record used for classification and reporting
    pub stat: StatRecord,
    /// Link information, `None` when the path is not a link
    pub symbolic_link: Option<SymbolicLink>,
}

impl LinkResolution {
    /// Check if the path was a symbolic link
    #[must_use]
    pub const fn is_symbolic_link(&self) -> bool {
        self.symbolic_link.is_some()
    }

    /// Check if the path was a link to a missing target
    #[must_use]
    pub const fn is_dangling(&self) -> bool {
        matches!(self.symbolic_link, Some(SymbolicLink { dangling: true }))
    }

    /// Classify into a file kind
    ///
    /// A dangling link is `Unknown` regardless of anything else; the link
    /// flag is added on top of the base kind.
    #[must_use]
    pub const fn kind(&self) -> FileKind {
        let base = if self.is_dangling() {
            BaseKind::Unknown
        } else if self.stat.is_file {
            BaseKind::File
        } else if self.stat.is_dir {
            BaseKind::Directory
        } else {
            BaseKind::Unknown
        };
        FileKind {
            base,
            symbolic_link: self.is_symbolic_link(),
        }
    }

    /// Convert into the reported stat
    #[must_use]
    pub const fn to_file_stat(&self) -> FileStat {
        FileStat {
            kind: self.kind(),
            created: self.stat.created,
            modified: self.stat.modified,
            size: self.stat.size,
        }
    }
}

/// Base type of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Anything else, including dangling links
    Unknown,
}

/// Entry type: a base kind plus an independent symbolic-link flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileKind {
    /// Base kind
    pub base: BaseKind,
    /// The entry was reached through a symbolic link
    pub symbolic_link: bool,
}

impl FileKind {
    /// Wire bit for `Unknown` (no bits set)
    pub const UNKNOWN_BIT: u32 = 0;
    /// Wire bit for `File`
    pub const FILE_BIT: u32 = 1;
    /// Wire bit for `Directory`
    pub const DIRECTORY_BIT: u32 = 2;
    /// Wire bit for `SymbolicLink`
    pub const SYMBOLIC_LINK_BIT: u32 = 64;

    /// Plain kind without the link flag
    #[must_use]
    pub const fn plain(base: BaseKind) -> Self {
        Self {
            base,
            symbolic_link: false,
        }
    }

    /// Encode as the wire bitset
    #[must_use]
    pub const fn bits(self) -> u32 {
        let base = match self.base {
            BaseKind::File => Self::FILE_BIT,
            BaseKind::Directory => Self::DIRECTORY_BIT,
            BaseKind::Unknown => Self::UNKNOWN_BIT,
        };
        if self.symbolic_link {
            base | Self::SYMBOLIC_LINK_BIT
        } else {
            base
        }
    }

    /// Decode a wire bitset
    ///
    /// Returns `None` if the bits do not describe exactly one base kind.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        let symbolic_link = bits & Self::SYMBOLIC_LINK_BIT != 0;
        let base = match bits & !Self::SYMBOLIC_LINK_BIT {
            Self::UNKNOWN_BIT => BaseKind::Unknown,
            Self::FILE_BIT => BaseKind::File,
            Self::DIRECTORY_BIT => BaseKind::Directory,
            _ => return None,
        };
        Some(Self {
            base,
            symbolic_link,
        })
    }
}

/// Stat result reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Entry type
    pub kind: FileKind,
    /// Creation time
    pub created: SystemTime,
    /// Last modification time
    pub modified: SystemTime,
    /// Size in bytes
    pub size: u64,
}

impl FileStat {
    /// Creation time in milliseconds since the Unix epoch
    #[must_use]
    pub fn created_ms(&self) -> i64 {
        millis_since_epoch(self.created)
    }

    /// Modification time in milliseconds since the Unix epoch
    #[must_use]
    pub fn modified_ms(&self) -> i64 {
        millis_since_epoch(self.modified)
    }
}

fn millis_since_epoch(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}

/// Resolve `path` with link awareness
///
/// # Errors
///
/// Returns a normalized [`AccessError`] if the following stat fails for any
/// reason other than a missing link target, or if neither phase succeeded.
#[allow(clippy::future_not_send)]
pub async fn resolve_link(path: &Path) -> Result<LinkResolution, AccessError> {
    let link_stat = match compio::fs::symlink_metadata(path).await {
        Ok(metadata) => {
            let record = StatRecord::from_metadata(&metadata);
            if !record.is_symlink {
                return Ok(LinkResolution {
                    stat: record,
                    symbolic_link: None,
                });
            }
            Some(record)
        }
        Err(e) => {
            trace!("lstat of {} failed, treating as non-link: {}", path.display(), e);
            None
        }
    };

    let followed = compio::fs::metadata(path)
        .await
        .map(|metadata| StatRecord::from_metadata(&metadata));
    let resolution = resolve_following(link_stat, followed)?;
    if resolution.is_dangling() {
        trace!("{} is a dangling symlink", path.display());
    }
    Ok(resolution)
}

/// Second phase: combine the optional lstat record with the following stat
///
/// `link_stat` is `Some` only when the path is a symlink. Without it the
/// path is never reported as a link.
fn resolve_following(
    link_stat: Option<StatRecord>,
    followed: std::io::Result<StatRecord>,
) -> Result<LinkResolution, AccessError> {
    match followed {
        Ok(stat) => Ok(LinkResolution {
            stat,
            symbolic_link: link_stat.map(|_| SymbolicLink { dangling: false }),
        }),
        Err(e) => match link_stat {
            Some(record) if ErrorCode::from_io_error(&e) == ErrorCode::NotFound => {
                Ok(LinkResolution {
                    stat: record,
                    symbolic_link: Some(SymbolicLink { dangling: true }),
                })
            }
            _ => Err(normalize(e)),
        },
    }
}

/// Link-aware stat of `path`
///
/// # Errors
///
/// See [`resolve_link`].
#[allow(clippy::future_not_send)]
pub async fn stat_path(path: &Path) -> Result<FileStat, AccessError> {
    let resolution = resolve_link(path).await?;
    Ok(resolution.to_file_stat())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;
    use std::time::Duration;
    use tempfile::TempDir;

    fn record(is_file: bool, is_dir: bool, is_symlink: bool) -> StatRecord {
        StatRecord {
            is_file,
            is_dir,
            is_symlink,
            size: 7,
            created: UNIX_EPOCH,
            modified: UNIX_EPOCH + Duration::from_millis(1_500),
        }
    }

    #[test]
    fn test_kind_plain_entries() {
        let file = LinkResolution {
            stat: record(true, false, false),
            symbolic_link: None,
        };
        assert_eq!(file.kind(), FileKind::plain(BaseKind::File));

        let dir = LinkResolution {
            stat: record(false, true, false),
            symbolic_link: None,
        };
        assert_eq!(dir.kind(), FileKind::plain(BaseKind::Directory));

        let fifo = LinkResolution {
            stat: record(false, false, false),
            symbolic_link: None,
        };
        assert_eq!(fifo.kind(), FileKind::plain(BaseKind::Unknown));
    }

    #[test]
    fn test_kind_dangling_overrides_base() {
        // Even if the record claims a file, a dangling link is Unknown
        let resolution = LinkResolution {
            stat: record(true, false, true),
            symbolic_link: Some(SymbolicLink { dangling: true }),
        };
        let kind = resolution.kind();
        assert_eq!(kind.base, BaseKind::Unknown);
        assert!(kind.symbolic_link);
        assert_eq!(kind.bits(), FileKind::SYMBOLIC_LINK_BIT);
    }

    #[test]
    fn test_kind_bits() {
        let link_to_dir = FileKind {
            base: BaseKind::Directory,
            symbolic_link: true,
        };
        assert_eq!(link_to_dir.bits(), 66);
        assert_eq!(FileKind::from_bits(66), Some(link_to_dir));
        assert_eq!(FileKind::plain(BaseKind::File).bits(), 1);
        assert_eq!(FileKind::plain(BaseKind::Unknown).bits(), 0);
        assert_eq!(FileKind::from_bits(3), None);
        assert_eq!(FileKind::from_bits(4), None);
    }

    #[test]
    fn test_millis_conversion() {
        let stat = LinkResolution {
            stat: record(true, false, false),
            symbolic_link: None,
        }
        .to_file_stat();
        assert_eq!(stat.modified_ms(), 1_500);
        assert_eq!(stat.created_ms(), 0);
        assert_eq!(millis_since_epoch(UNIX_EPOCH - Duration::from_millis(20)), -20);
    }

    #[test]
    fn test_following_without_lstat_is_not_a_link() {
        // lstat failed but the following stat succeeded
        let resolution = resolve_following(None, Ok(record(true, false, false))).unwrap();
        assert_eq!(resolution.symbolic_link, None);
        assert_eq!(resolution.kind(), FileKind::plain(BaseKind::File));
    }

    #[test]
    fn test_following_not_found_without_lstat_fails() {
        let err = resolve_following(None, Err(std::io::Error::from_raw_os_error(libc::ENOENT)))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_following_not_found_with_lstat_is_dangling() {
        let link = record(false, false, true);
        let resolution = resolve_following(
            Some(link),
            Err(std::io::Error::from_raw_os_error(libc::ENOENT)),
        )
        .unwrap();
        assert!(resolution.is_dangling());
        assert_eq!(resolution.stat, link);
    }

    #[test]
    fn test_following_other_error_with_lstat_is_returned() {
        let err = resolve_following(
            Some(record(false, false, true)),
            Err(std::io::Error::from_raw_os_error(libc::EACCES)),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoPermission);
    }

    #[compio::test]
    async fn test_resolve_regular_file_fast_path() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("f");
        fs::write(&file, b"0123456789")?;

        let resolution = resolve_link(&file).await?;
        assert!(!resolution.is_symbolic_link());
        assert!(!resolution.is_dangling());
        assert_eq!(resolution.stat.size, 10);
        assert_eq!(resolution.kind(), FileKind::plain(BaseKind::File));

        Ok(())
    }

    #[compio::test]
    async fn test_resolve_link_reports_target() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let target = temp_dir.path().join("target.txt");
        let link = temp_dir.path().join("link");
        fs::write(&target, b"0123456789")?;
        symlink(&target, &link)?;

        let resolution = resolve_link(&link).await?;
        assert_eq!(resolution.symbolic_link, Some(SymbolicLink { dangling: false }));
        assert_eq!(resolution.stat.size, 10);
        assert!(!resolution.stat.is_symlink);

        Ok(())
    }

    #[compio::test]
    async fn test_resolve_dangling_keeps_link_metadata() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let link = temp_dir.path().join("dangling");
        let missing = temp_dir.path().join("does-not-exist-at-all");
        symlink(&missing, &link)?;

        let resolution = resolve_link(&link).await?;
        assert!(resolution.is_dangling());
        assert!(resolution.stat.is_symlink);
        // The link's own size is the length of its target path
        let own = fs::symlink_metadata(&link)?;
        assert_eq!(resolution.stat.size, own.len());
        assert_eq!(resolution.stat.size, missing.as_os_str().len() as u64);

        Ok(())
    }

    #[compio::test]
    async fn test_resolve_missing_path_fails_not_found() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let err = resolve_link(&temp_dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.cause().is_some());

        Ok(())
    }

    #[compio::test]
    async fn test_resolve_link_loop_is_unknown_error() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        symlink(&b, &a)?;
        symlink(&a, &b)?;

        // ELOOP is not a missing target, so it propagates
        let err = resolve_link(&a).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unknown);

        Ok(())
    }

    #[compio::test]
    async fn test_resolve_through_file_component_not_a_directory() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("plain");
        fs::write(&file, b"x")?;

        let err = resolve_link(&file.join("child")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotADirectory);

        Ok(())
    }
}

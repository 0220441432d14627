//! Local filesystem operations behind the sidecar
//!
//! Link-aware stat, whole-file reads, and text decoding for the content
//! reader. Every OS failure leaving this module is already normalized.

pub mod encoding;
pub mod read;
pub mod stat;

pub use encoding::TextEncoding;
pub use read::{read_file_content, read_text_if_exists};
pub use stat::{
    resolve_link, stat_path, BaseKind, FileKind, FileStat, LinkResolution, StatRecord,
    SymbolicLink,
};

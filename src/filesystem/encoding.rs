//! Text encodings accepted by the content reader

use crate::error::{Result, SidecarError};
use base64::Engine;
use std::str::FromStr;

/// Decoding applied to file bytes before they are returned as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8, invalid sequences replaced with U+FFFD
    #[default]
    Utf8,
    /// UTF-16 little endian; a trailing odd byte is dropped
    Utf16Le,
    /// ISO-8859-1, one char per byte
    Latin1,
    /// 7-bit ASCII; the high bit of each byte is cleared
    Ascii,
    /// Standard base64 of the raw bytes
    Base64,
    /// URL-safe base64 without padding
    Base64Url,
    /// Lowercase hex of the raw bytes
    Hex,
}

impl TextEncoding {
    /// Parse an optional hint, defaulting to UTF-8
    ///
    /// # Errors
    ///
    /// Returns `SidecarError::InvalidEncoding` for an unrecognized label.
    pub fn from_hint(hint: Option<&str>) -> Result<Self> {
        hint.map_or(Ok(Self::Utf8), str::parse)
    }

    /// Decode `bytes` into text
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Ascii => bytes.iter().map(|&b| char::from(b & 0x7f)).collect(),
            Self::Base64 => base64::engine::general_purpose::STANDARD.encode(bytes),
            Self::Base64Url => base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes),
            Self::Hex => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = SidecarError;

    fn from_str(label: &str) -> Result<Self> {
        match label.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(Self::Utf16Le),
            "latin1" | "binary" => Ok(Self::Latin1),
            "ascii" => Ok(Self::Ascii),
            "base64" => Ok(Self::Base64),
            "base64url" => Ok(Self::Base64Url),
            "hex" => Ok(Self::Hex),
            _ => Err(SidecarError::InvalidEncoding(label.to_string())),
        }
    }
}

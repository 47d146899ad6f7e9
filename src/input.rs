//! URL list decoding
//!
//! Input files are plain text, one URL per line. UTF-16 files are recognised
//! by their byte-order mark; everything else is read as UTF-8.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to read file: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {encoding} content")]
    Malformed { encoding: TextEncoding },
}

/// Encoding detected from the leading bytes of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0xFF, 0xFE, ..] => TextEncoding::Utf16Le,
            [0xFE, 0xFF, ..] => TextEncoding::Utf16Be,
            _ => TextEncoding::Utf8,
        }
    }

    fn encoding(self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Utf16Le => UTF_16LE,
            TextEncoding::Utf16Be => UTF_16BE,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "UTF-8"),
            TextEncoding::Utf16Le => write!(f, "UTF-16LE"),
            TextEncoding::Utf16Be => write!(f, "UTF-16BE"),
        }
    }
}

/// Decode raw file bytes into trimmed, non-empty lines
///
/// UTF-8 input is decoded lossily; UTF-16 input with invalid code units is
/// rejected, since a half-decoded URL list is worse than none.
pub fn decode_lines(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    let detected = TextEncoding::detect(bytes);
    let (text, had_errors) = detected.encoding().decode_with_bom_removal(bytes);

    if had_errors && detected != TextEncoding::Utf8 {
        return Err(DecodeError::Malformed { encoding: detected });
    }

    info!(encoding = %detected, "Detected file encoding");

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Read and decode a URL list file
pub async fn read_url_file(path: &Path) -> Result<Vec<String>, DecodeError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let urls = decode_lines(&bytes)?;
    info!(count = urls.len(), "Read URLs from {}", path.display());
    Ok(urls)
}

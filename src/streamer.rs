//! Byte-range file streaming
//!
//! Parses `Range` request headers and opens bounded async read windows over
//! library files. Only single closed-or-half-open `bytes=` ranges are
//! supported; multipart ranges are rejected as malformed.

use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result};

/// Inclusive byte window within a file of known size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset served
    pub start: u64,
    /// Last byte offset served, inclusive
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the window. Parsed ranges are never empty.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Parse a `Range` header value against a file of `size` bytes.
///
/// The end offset defaults to the last byte when omitted and is clamped to
/// the file size, matching what download clients expect from resumable
/// servers.
///
/// # Errors
///
/// Returns [`Error::InvalidRange`] when the header is not a single
/// `bytes=` range, when offsets do not parse, when the start lies at or
/// beyond the end of file, or when the file is empty.
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange> {
    let spec = header
        .strip_prefix("bytes=")
        .ok_or_else(|| Error::InvalidRange(format!("unsupported range unit: {header}")))?;

    let (start_str, end_str) = spec
        .split_once('-')
        .ok_or_else(|| Error::InvalidRange(format!("malformed range: {header}")))?;

    let start: u64 = start_str
        .parse()
        .map_err(|_| Error::InvalidRange(format!("malformed range start: {header}")))?;

    let end: u64 = if end_str.is_empty() {
        size.saturating_sub(1)
    } else {
        let end: u64 = end_str
            .parse()
            .map_err(|_| Error::InvalidRange(format!("malformed range end: {header}")))?;
        end.min(size.saturating_sub(1))
    };

    if size == 0 {
        return Err(Error::InvalidRange("file is empty".to_string()));
    }
    if start >= size {
        return Err(Error::InvalidRange(format!(
            "range start {start} beyond end of {size} byte file"
        )));
    }
    if start > end {
        return Err(Error::InvalidRange(format!(
            "range start {start} after range end {end}"
        )));
    }

    Ok(ByteRange { start, end })
}

/// Open an async byte stream over `path`, bounded to `range` when given.
///
/// # Errors
///
/// Returns [`Error::FileUnavailable`] when the file cannot be opened or
/// seeked, e.g. because it was removed after the metadata cache last saw it.
pub async fn open_window(
    path: &Path,
    range: Option<&ByteRange>,
) -> Result<ReaderStream<tokio::io::Take<File>>> {
    let unavailable = |source: std::io::Error| Error::FileUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).await.map_err(unavailable)?;

    let limit = match range {
        Some(range) => {
            file.seek(SeekFrom::Start(range.start))
                .await
                .map_err(unavailable)?;
            range.len()
        }
        None => u64::MAX,
    };

    Ok(ReaderStream::new(file.take(limit)))
}

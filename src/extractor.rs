//! Per-file metadata extraction
//!
//! Turns one audio file into a normalized [`Item`] using the `lofty` crate
//! for container probing and tag parsing. Field values are layered, highest
//! priority first:
//!
//! 1. the vendor `json64` payload (base64-encoded JSON embedded in a tag)
//! 2. named native tag fields (`comment`, `genre`, `narrated_by`, `year`),
//!    matched case-insensitively across every tag container in the file
//! 3. container-level metadata (title/artist/copyright/duration/picture)
//! 4. hard defaults ("Untitled", "Unknown author", ...)
//!
//! A `json64` payload that fails to base64- or JSON-decode is treated as
//! absent rather than as an error; the payloads are sometimes truncated at
//! the source and a partial blob should not cost the item its native tags.
//!
//! Item ids are the hex MD5 of the file path, so identity is stable across
//! rescans even when tags change.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, Utc};
use lofty::file::{AudioFile, FileType, TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, ItemValue, Tag};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One audio file's normalized metadata record
#[derive(Debug, Clone)]
pub struct Item {
    /// Stable identifier, derived from the file path (not from tags)
    pub id: String,
    /// Episode title
    pub title: String,
    /// Episode author
    pub author: String,
    /// Episode description, also used for the feed's content field
    pub description: String,
    /// Copyright notice
    pub copyright: String,
    /// Publication date; extraction time when no release date was found
    pub published_at: DateTime<Utc>,
    /// Categories, parsed from a colon-delimited genre field
    pub categories: Vec<String>,
    /// Narrators, parsed from a comma-delimited field
    pub narrators: Vec<Narrator>,
    /// Duration in seconds, when the container or payload provides one
    pub duration_secs: Option<f64>,
    /// File size in bytes at scan time
    pub size_bytes: u64,
    /// MIME type derived from the container format
    pub mime_type: String,
    /// Embedded artwork, when present
    pub picture: Option<Picture>,
    /// Absolute path of the source file; internal, never exposed to clients
    pub file_path: PathBuf,
}

/// A single narrator credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narrator {
    /// Narrator name
    pub name: String,
}

/// Embedded artwork extracted from a tag
#[derive(Debug, Clone)]
pub struct Picture {
    /// MIME type of the image data (e.g. "image/jpeg")
    pub format: String,
    /// Raw image bytes
    pub data: Vec<u8>,
}

/// The vendor metadata payload embedded as base64 JSON in a `json64` tag
/// field. Every field is optional; unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
struct EmbeddedOverride {
    title: Option<String>,
    summary: Option<String>,
    author: Option<String>,
    copyright: Option<String>,
    duration: Option<f64>,
    narrated_by: Option<String>,
    genre: Option<String>,
    release_date: Option<String>,
}

/// Container-level data pulled out of a parsed file, kept separate from
/// `lofty`'s file object so item assembly stays a pure function.
#[derive(Default)]
pub(crate) struct ParsedFile {
    pub(crate) title: Option<String>,
    pub(crate) artist: Option<String>,
    pub(crate) copyright: Option<String>,
    pub(crate) duration_secs: Option<f64>,
    pub(crate) mime_type: Option<String>,
    pub(crate) picture: Option<Picture>,
    pub(crate) tags: Vec<Tag>,
}

impl ParsedFile {
    fn from_tagged(tagged: &TaggedFile) -> Self {
        let tag = tagged.primary_tag().or_else(|| tagged.first_tag());

        let picture = tag.and_then(|t| t.pictures().first()).map(|pic| Picture {
            format: pic
                .mime_type()
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            data: pic.data().to_vec(),
        });

        let duration = tagged.properties().duration().as_secs_f64();

        Self {
            title: tag.and_then(|t| t.title()).map(|s| s.to_string()),
            artist: tag.and_then(|t| t.artist()).map(|s| s.to_string()),
            copyright: tag
                .and_then(|t| t.get_string(&ItemKey::CopyrightMessage))
                .map(|s| s.to_string()),
            duration_secs: (duration > 0.0).then_some(duration),
            mime_type: Some(file_type_to_mime(tagged.file_type()).to_string()),
            picture,
            tags: tagged.tags().to_vec(),
        }
    }
}

/// Extract a normalized [`Item`] from one audio file.
///
/// # Errors
///
/// Returns [`Error::FileUnavailable`] when the file cannot be stat'ed and
/// [`Error::UnparsableMetadata`] when the tag parser rejects it. Both are
/// non-fatal to a cache rebuild; the caller logs and skips the file.
pub fn extract(path: &Path) -> Result<Item> {
    let stat = std::fs::metadata(path).map_err(|source| Error::FileUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let tagged = Probe::open(path)
        .map_err(|e| Error::UnparsableMetadata {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .read()
        .map_err(|e| Error::UnparsableMetadata {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let parsed = ParsedFile::from_tagged(&tagged);
    Ok(assemble_item(path, stat.len(), parsed, Utc::now()))
}

/// Assemble the final item from stat data and parsed container data.
///
/// Pure function of its inputs; `now` is injected so the release-date
/// fallback is reproducible in tests.
pub(crate) fn assemble_item(
    path: &Path,
    size_bytes: u64,
    parsed: ParsedFile,
    now: DateTime<Utc>,
) -> Item {
    let embedded = native_value(&parsed.tags, "json64")
        .and_then(|raw| decode_embedded(&raw))
        .unwrap_or_default();

    let title = embedded
        .title
        .or(parsed.title)
        .unwrap_or_else(|| "Untitled".to_string());
    let description = embedded
        .summary
        .or_else(|| native_value(&parsed.tags, "comment"))
        .unwrap_or_else(|| "No description".to_string());
    let author = embedded
        .author
        .or(parsed.artist)
        .unwrap_or_else(|| "Unknown author".to_string());
    let copyright = embedded
        .copyright
        .or(parsed.copyright)
        .unwrap_or_else(|| "Unknown".to_string());
    let duration_secs = embedded.duration.or(parsed.duration_secs);

    let narrators = embedded
        .narrated_by
        .or_else(|| native_value(&parsed.tags, "narrated_by"))
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Narrator {
            name: name.to_string(),
        })
        .collect();

    let categories = embedded
        .genre
        .or_else(|| native_value(&parsed.tags, "book_genre"))
        .or_else(|| native_value(&parsed.tags, "genre"))
        .unwrap_or_default()
        .split(':')
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .collect();

    let published_at = embedded
        .release_date
        .or_else(|| native_value(&parsed.tags, "year"))
        .and_then(|raw| parse_release_date(&raw))
        .unwrap_or(now);

    Item {
        id: item_id(path),
        title,
        author,
        description,
        copyright,
        published_at,
        categories,
        narrators,
        duration_secs,
        size_bytes,
        mime_type: parsed
            .mime_type
            .unwrap_or_else(|| "audio/mpeg".to_string()),
        picture: parsed.picture,
        file_path: path.to_path_buf(),
    }
}

/// Deterministic item id: hex MD5 of the file path.
pub(crate) fn item_id(path: &Path) -> String {
    format!("{:x}", md5::compute(path.to_string_lossy().as_bytes()))
}

/// Look up a named text field across every tag container in the file,
/// case-insensitively, returning the first match.
///
/// Unknown (user-defined) frames match on their description; the comment,
/// genre and year frames also answer to those well-known names so callers
/// do not need to care which container a field landed in.
pub(crate) fn native_value(tags: &[Tag], name: &str) -> Option<String> {
    for tag in tags {
        for item in tag.items() {
            let matches = match item.key() {
                ItemKey::Unknown(key) => key.eq_ignore_ascii_case(name),
                ItemKey::Comment => name.eq_ignore_ascii_case("comment"),
                ItemKey::Genre => name.eq_ignore_ascii_case("genre"),
                ItemKey::Year | ItemKey::RecordingDate => name.eq_ignore_ascii_case("year"),
                _ => false,
            };
            if matches {
                if let ItemValue::Text(text) = item.value() {
                    return Some(text.clone());
                }
            }
        }
    }
    None
}

/// Decode the vendor payload. Both decode stages soft-fail to `None`:
/// a corrupt payload means "no override", never an extraction error.
fn decode_embedded(raw: &str) -> Option<EmbeddedOverride> {
    let bytes = match BASE64.decode(raw.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring undecodable json64 payload");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed json64 payload");
            None
        }
    }
}

/// Parse a release-date string. Accepts RFC 3339, `YYYY-MM-DD` and bare
/// year values; anything else is `None` and the caller falls back to the
/// extraction time.
fn parse_release_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    if let Ok(year) = raw.parse::<i32>() {
        return Some(NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Map a lofty container format to the MIME type used for enclosures.
fn file_type_to_mime(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Aac => "audio/aac",
        FileType::Aiff => "audio/aiff",
        FileType::Ape => "audio/ape",
        FileType::Flac => "audio/flac",
        FileType::Mpeg => "audio/mpeg",
        FileType::Mp4 => "audio/mp4",
        FileType::Opus => "audio/opus",
        FileType::Vorbis => "audio/vorbis",
        FileType::Speex => "audio/speex",
        FileType::Wav => "audio/wav",
        FileType::WavPack => "audio/wavpack",
        _ => "audio/mpeg",
    }
}

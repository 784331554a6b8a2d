//! Feed query engine: filtering and sorting the cached item set
//!
//! Filter entries arrive on the wire as `pattern:field` (pattern first),
//! grouped into comma-separated lists. Filter-in groups are OR'd together,
//! with the entries inside a group conjunctive. Filter-out groups each
//! remove an item only when *every* entry in the group matches — this
//! conjunctive exclusion mirrors filter-in and is preserved as observed
//! behavior even though "any entry excludes" would be the more common
//! semantics; see DESIGN.md.
//!
//! Field names are an explicit enumerated set; an unknown field or a bad
//! sort direction rejects the whole request as an invalid query instead of
//! silently matching nothing.

use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::extractor::Item;

/// The filterable/sortable item fields, named as they appear in feed
/// queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    /// Item id (also addressable as `guid`)
    Id,
    /// Episode title
    Title,
    /// Episode author
    Author,
    /// Episode description (also addressable as `content`)
    Description,
    /// Copyright notice
    Copyright,
    /// Publication date
    PubDate,
    /// Category list
    Category,
    /// Narrator list
    Contributor,
    /// Duration in seconds
    Duration,
    /// File size in bytes
    Size,
    /// Enclosure MIME type
    Type,
}

impl FromStr for ItemField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "id" | "guid" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "description" | "content" => Ok(Self::Description),
            "copyright" => Ok(Self::Copyright),
            "pubDate" => Ok(Self::PubDate),
            "category" => Ok(Self::Category),
            "contributor" => Ok(Self::Contributor),
            "duration" => Ok(Self::Duration),
            "size" => Ok(Self::Size),
            "type" => Ok(Self::Type),
            other => Err(Error::InvalidQuery(format!("unknown field: {other}"))),
        }
    }
}

impl ItemField {
    /// String representation of the field for pattern matching. Non-string
    /// fields are stringified as JSON, matching what clients see in the
    /// feed. `None` means the field is absent on this item, which never
    /// matches.
    fn match_text(self, item: &Item) -> Option<String> {
        match self {
            Self::Id => Some(item.id.clone()),
            Self::Title => Some(item.title.clone()),
            Self::Author => Some(item.author.clone()),
            Self::Description => Some(item.description.clone()),
            Self::Copyright => Some(item.copyright.clone()),
            Self::PubDate => serde_json::to_string(&item.published_at).ok(),
            Self::Category => serde_json::to_string(&item.categories).ok(),
            Self::Contributor => serde_json::to_string(&item.narrators).ok(),
            Self::Duration => item.duration_secs.map(|d| d.to_string()),
            Self::Size => Some(item.size_bytes.to_string()),
            Self::Type => Some(item.mime_type.clone()),
        }
    }

    /// Typed comparison for sorting.
    fn compare(self, a: &Item, b: &Item) -> Ordering {
        match self {
            Self::PubDate => a.published_at.cmp(&b.published_at),
            Self::Size => a.size_bytes.cmp(&b.size_bytes),
            Self::Duration => a
                .duration_secs
                .partial_cmp(&b.duration_secs)
                .unwrap_or(Ordering::Equal),
            _ => {
                let left = self.match_text(a).unwrap_or_default();
                let right = self.match_text(b).unwrap_or_default();
                left.cmp(&right)
            }
        }
    }
}

/// One `pattern:field` filter condition
#[derive(Debug, Clone)]
pub struct FilterEntry {
    regex: Regex,
    field: ItemField,
}

impl FilterEntry {
    fn parse(entry: &str) -> Result<Self> {
        let (pattern, field) = entry
            .split_once(':')
            .ok_or_else(|| Error::InvalidQuery(format!("malformatted filter option: {entry}")))?;
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| Error::InvalidQuery(format!("invalid filter pattern {pattern}: {e}")))?;
        Ok(Self {
            regex,
            field: field.parse()?,
        })
    }

    fn matches(&self, item: &Item) -> bool {
        self.field
            .match_text(item)
            .is_some_and(|text| self.regex.is_match(&text))
    }
}

/// A comma-separated group of filter conditions; all entries in the group
/// must match for the group to match.
#[derive(Debug, Clone)]
pub struct FilterGroup(Vec<FilterEntry>);

impl FilterGroup {
    /// Parse one query-parameter value into a group.
    pub fn parse(raw: &str) -> Result<Self> {
        let entries = raw
            .split(',')
            .filter(|entry| !entry.is_empty())
            .map(FilterEntry::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(entries))
    }

    fn matches(&self, item: &Item) -> bool {
        self.0.iter().all(|entry| entry.matches(item))
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Apply filter-in and filter-out groups to the item set.
///
/// With no filter-in groups every item passes the inclusion stage. An item
/// is excluded when any filter-out group matches it in full.
pub fn filter_items(
    items: Vec<Arc<Item>>,
    filter_in: &[FilterGroup],
    filter_out: &[FilterGroup],
) -> Vec<Arc<Item>> {
    let include: Vec<&FilterGroup> = filter_in.iter().filter(|g| !g.is_empty()).collect();

    items
        .into_iter()
        .filter(|item| include.is_empty() || include.iter().any(|group| group.matches(item)))
        .filter(|item| !filter_out.iter().any(|group| !group.is_empty() && group.matches(item)))
        .collect()
}

/// Sort direction token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

/// Ordered multi-key sort specification
#[derive(Debug, Clone)]
pub struct SortSpec(Vec<(SortDirection, ItemField)>);

impl Default for SortSpec {
    /// Newest first by publication date.
    fn default() -> Self {
        Self(vec![(SortDirection::Desc, ItemField::PubDate)])
    }
}

impl SortSpec {
    /// Parse a comma-separated list of `dir:field` pairs.
    ///
    /// # Errors
    ///
    /// Anything other than an `asc`/`desc` direction marker, or an unknown
    /// field name, rejects the request as [`Error::InvalidQuery`].
    pub fn parse(raw: &str) -> Result<Self> {
        let keys = raw
            .split(',')
            .map(|set| {
                let (dir, field) = set.split_once(':').ok_or_else(|| {
                    Error::InvalidQuery(format!("malformatted sort option: {set}"))
                })?;
                let dir = match dir {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    _ => {
                        return Err(Error::InvalidQuery(format!(
                            "malformatted sort option: {set}"
                        )));
                    }
                };
                Ok((dir, field.parse()?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(keys))
    }

    /// Stable multi-key sort: ties on one key fall through to the next,
    /// final ties keep their prior relative order.
    pub fn apply(&self, items: &mut [Arc<Item>]) {
        items.sort_by(|a, b| {
            for (dir, field) in &self.0 {
                let ord = field.compare(a, b);
                let ord = match dir {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }
}

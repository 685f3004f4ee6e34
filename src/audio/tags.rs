//! Tag names and tag sets
//!
//! A `TagSet` only ever holds keys that are known to have a value. Merging is
//! first-write-wins: once a key is present it is never overwritten.

use std::collections::BTreeMap;
use std::fmt;

/// A metadata field name
///
/// The six well-known fields get their own variants; anything else read from
/// an embedded comment block is kept verbatim (upper-cased) in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKey {
    Title,
    Artist,
    Album,
    Date,
    TrackNumber,
    Genre,
    Other(String),
}

impl TagKey {
    /// Parse a tag name, case-insensitively
    pub fn parse(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "TITLE" => TagKey::Title,
            "ARTIST" => TagKey::Artist,
            "ALBUM" => TagKey::Album,
            "DATE" => TagKey::Date,
            "TRACKNUMBER" => TagKey::TrackNumber,
            "GENRE" => TagKey::Genre,
            _ => TagKey::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TagKey::Title => "TITLE",
            TagKey::Artist => "ARTIST",
            TagKey::Album => "ALBUM",
            TagKey::Date => "DATE",
            TagKey::TrackNumber => "TRACKNUMBER",
            TagKey::Genre => "GENRE",
            TagKey::Other(name) => name,
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from tag name to value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: BTreeMap<TagKey, String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value unless the key is already set.
    ///
    /// Returns true if the value was stored. Empty values are never stored,
    /// absence is how "unknown" is represented.
    pub fn insert_if_absent(&mut self, key: TagKey, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() || self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    /// Fill keys missing from `self` with values from `other`
    pub fn merge_missing(&mut self, other: TagSet) {
        for (key, value) in other.entries {
            self.entries.entry(key).or_insert(value);
        }
    }

    pub fn get(&self, key: &TagKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &TagKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }
}

impl FromIterator<(TagKey, String)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (TagKey, String)>>(iter: I) -> Self {
        let mut tags = TagSet::new();
        for (key, value) in iter {
            tags.insert_if_absent(key, value);
        }
        tags
    }
}

/// Combine embedded tags (primary) with path-derived tags (secondary)
pub fn merge_tags(embedded: TagSet, from_path: TagSet) -> TagSet {
    let mut merged = embedded;
    merged.merge_missing(from_path);
    merged
}

//! Domain models for preset documents.
//!
//! A document maps preset names to records; each record carries its
//! current value, an active flag and an append-only history.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Timestamp format used for history keys.
pub const HISTORY_TIME_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// One serialized mapping per (owner, category) pair.
pub type Document = BTreeMap<String, PresetRecord>;

/// A single immutable annotation in a preset's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Human-readable timestamp, unique within the history.
    pub timestamp: String,
    /// Fixed-precision value followed by the optional comment.
    pub note: String,
}

/// Ordered timestamp -> annotation mapping.
///
/// Serializes as a plain mapping but keeps insertion order, which
/// chronological display depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Look up a note by its timestamp key.
    #[must_use]
    pub fn get(&self, timestamp: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.timestamp == timestamp)
            .map(|e| e.note.as_str())
    }

    /// Append an entry, suffixing the key if another entry already owns it.
    pub fn append(&mut self, timestamp: &str, note: String) -> &HistoryEntry {
        let mut key = timestamp.to_string();
        let mut n = 2;
        while self.get(&key).is_some() {
            key = format!("{timestamp} #{n}");
            n += 1;
        }
        self.entries.push(HistoryEntry {
            timestamp: key,
            note,
        });
        &self.entries[self.entries.len() - 1]
    }
}

impl Serialize for History {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.timestamp, &entry.note)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for History {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HistoryVisitor;

        impl<'de> Visitor<'de> for HistoryVisitor {
            type Value = History;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of timestamp to annotation")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<History, E> {
                Ok(History::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<History, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((timestamp, note)) = access.next_entry::<String, String>()? {
                    entries.push(HistoryEntry { timestamp, note });
                }
                Ok(History { entries })
            }
        }

        deserializer.deserialize_any(HistoryVisitor)
    }
}

/// Stored state of one named preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetRecord {
    /// The saved position.
    pub value: f64,

    /// Inactive presets stay on disk but get no accessors.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Append-only annotations, one per value write.
    #[serde(default)]
    pub history: History,
}

const fn default_active() -> bool {
    true
}

impl PresetRecord {
    /// Create an active record with an empty history.
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self {
            value,
            active: true,
            history: History {
                entries: Vec::new(),
            },
        }
    }

    /// Overwrite the value and record it in the history.
    pub fn set_value(&mut self, value: f64, comment: Option<&str>, now: DateTime<Local>) {
        self.value = value;
        let stamp = now.format(HISTORY_TIME_FORMAT).to_string();
        self.history.append(&stamp, format_note(value, comment));
    }
}

/// Render a history annotation: `{:10.4}` value, then the comment if any.
#[must_use]
pub fn format_note(value: f64, comment: Option<&str>) -> String {
    match comment {
        Some(c) if !c.is_empty() => format!("{value:10.4} {c}"),
        _ => format!("{value:10.4}"),
    }
}

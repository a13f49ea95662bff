//! Core data types for vocabulary lists.

use crate::error::{Result, VocabError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned list identifier (the `Sets.id` rowid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(pub i64);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListId {
    type Err = VocabError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| VocabError::invalid("list id", format!("'{s}' is not a number")))
    }
}

/// A phrase/translation pair with its practice counters.
///
/// The position of an entry is not stored here: in memory it is the index in
/// the owning [`crate::WordList`], on disk it is the `ListPosition` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub phrase: String,
    pub translation: String,
    #[serde(default)]
    pub times_tried: u32,
    #[serde(default)]
    pub times_failed: u32,
}

impl Entry {
    /// A fresh entry with zeroed counters.
    pub fn new(phrase: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            translation: translation.into(),
            times_tried: 0,
            times_failed: 0,
        }
    }

    /// Read one property of this entry.
    #[must_use]
    pub fn property(&self, property: EntryProperty) -> PropertyValue {
        match property {
            EntryProperty::Phrase => PropertyValue::Phrase(self.phrase.clone()),
            EntryProperty::Translation => PropertyValue::Translation(self.translation.clone()),
            EntryProperty::TimesTried => PropertyValue::TimesTried(self.times_tried),
            EntryProperty::TimesFailed => PropertyValue::TimesFailed(self.times_failed),
        }
    }

    /// Overwrite one property of this entry.
    pub fn apply(&mut self, value: &PropertyValue) {
        match value {
            PropertyValue::Phrase(v) => self.phrase.clone_from(v),
            PropertyValue::Translation(v) => self.translation.clone_from(v),
            PropertyValue::TimesTried(v) => self.times_tried = *v,
            PropertyValue::TimesFailed(v) => self.times_failed = *v,
        }
    }
}

/// The fixed set of entry properties that can be read or updated individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryProperty {
    Phrase,
    Translation,
    TimesTried,
    TimesFailed,
}

impl EntryProperty {
    pub const ALL: [Self; 4] = [
        Self::Phrase,
        Self::Translation,
        Self::TimesTried,
        Self::TimesFailed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phrase => "Phrase",
            Self::Translation => "Translation",
            Self::TimesTried => "TimesTried",
            Self::TimesFailed => "TimesFailed",
        }
    }
}

impl fmt::Display for EntryProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryProperty {
    type Err = VocabError;

    /// Resolve a caller-supplied property name against the allow-list.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VocabError::invalid("property", format!("unknown entry property '{s}'")))
    }
}

/// A typed value for one [`EntryProperty`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    Phrase(String),
    Translation(String),
    TimesTried(u32),
    TimesFailed(u32),
}

impl PropertyValue {
    #[must_use]
    pub const fn property(&self) -> EntryProperty {
        match self {
            Self::Phrase(_) => EntryProperty::Phrase,
            Self::Translation(_) => EntryProperty::Translation,
            Self::TimesTried(_) => EntryProperty::TimesTried,
            Self::TimesFailed(_) => EntryProperty::TimesFailed,
        }
    }

    /// Build a value for `property` from its textual form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a counter is not a non-negative integer.
    pub fn parse(property: EntryProperty, text: &str) -> Result<Self> {
        let counter = || {
            text.trim().parse::<u32>().map_err(|_| {
                VocabError::invalid(property.as_str(), format!("'{text}' is not a count"))
            })
        };
        Ok(match property {
            EntryProperty::Phrase => Self::Phrase(text.to_string()),
            EntryProperty::Translation => Self::Translation(text.to_string()),
            EntryProperty::TimesTried => Self::TimesTried(counter()?),
            EntryProperty::TimesFailed => Self::TimesFailed(counter()?),
        })
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phrase(v) | Self::Translation(v) => write!(f, "{v:?}"),
            Self::TimesTried(v) | Self::TimesFailed(v) => write!(f, "{v}"),
        }
    }
}

/// Descriptive metadata of a list (the `Sets` row minus its id).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDate>,
}

impl ListInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Reject metadata that cannot be persisted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the name is blank.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(VocabError::invalid("name", "list name cannot be empty"));
        }
        Ok(())
    }
}

/// Catalog projection of a list; does not load entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub id: ListId,
    #[serde(flatten)]
    pub info: ListInfo,
    pub entry_count: usize,
}

/// One match from a cross-list substring search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub list_id: ListId,
    pub position: usize,
    #[serde(flatten)]
    pub entry: Entry,
}

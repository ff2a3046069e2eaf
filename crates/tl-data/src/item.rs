//! Render-ready timeline records

use chrono::{DateTime, SecondsFormat, Utc};
use tl_core::SelectionHandle;

/// A start or end value as read from the dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeValue {
    At(DateTime<Utc>),
    /// Present but not a timestamp; keeps the raw text for display
    Malformed(String),
    Missing,
}

impl TimeValue {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeValue::At(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, TimeValue::At(_))
    }

    /// Text form written onto rendered elements
    pub fn to_attribute(&self) -> String {
        match self {
            TimeValue::At(t) => t.to_rfc3339_opts(SecondsFormat::Millis, true),
            TimeValue::Malformed(raw) => raw.clone(),
            TimeValue::Missing => String::new(),
        }
    }
}

/// One timeline record derived from one dataset row
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Display and lane key taken from the identity column
    pub id: String,
    pub start: TimeValue,
    pub end: TimeValue,
    pub content: String,
    pub style_class: String,
    pub group: Option<String>,
    /// Position of the originating row in the snapshot
    pub row: usize,
    /// Host handle for the originating row; not the same thing as `id`
    pub selection: SelectionHandle,
}

impl Item {
    /// Both ends parsed. Ordering of start and end is not checked.
    pub fn has_valid_range(&self) -> bool {
        self.start.is_valid() && self.end.is_valid()
    }

    pub fn range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.start.timestamp()?, self.end.timestamp()?))
    }
}

/// A lane items are placed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub content: String,
}

/// Output of one mapping pass
#[derive(Debug, Clone, Default)]
pub struct MappedTimeline {
    pub items: Vec<Item>,
    /// Lanes in first-appearance order; empty means one implicit lane
    pub groups: Vec<Group>,
}

impl MappedTimeline {
    pub fn invalid_range_count(&self) -> usize {
        self.items.iter().filter(|item| !item.has_valid_range()).count()
    }
}

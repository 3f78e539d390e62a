//! Raw revision records as read from WordprocessingML markup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One `w:ins` or `w:del` wrapper with its collected text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRevisionRecord {
    /// Revision id (`w:id`)
    pub id: String,

    /// Revision author (`w:author`)
    pub author: String,

    /// Revision date (`w:date`), usually ISO 8601
    pub date: String,

    /// Trimmed text carried by the wrapper
    pub text: String,
}

impl RawRevisionRecord {
    /// Create a record.
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        date: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            date: date.into(),
            text: text.into(),
        }
    }

    /// Parse the revision date.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.date.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Insertions and deletions read from one XML part, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revisions {
    /// Insertion wrappers
    pub insertions: Vec<RawRevisionRecord>,

    /// Deletion wrappers
    pub deletions: Vec<RawRevisionRecord>,
}

impl Revisions {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.insertions.len() + self.deletions.len()
    }

    /// Check if there are no records.
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.deletions.is_empty()
    }

    /// Merge records from another part.
    pub fn extend(&mut self, other: Revisions) {
        self.insertions.extend(other.insertions);
        self.deletions.extend(other.deletions);
    }

    /// Convert into normalized changes.
    pub fn into_changes(self) -> Vec<super::Change> {
        crate::parser::normalize(self)
    }
}

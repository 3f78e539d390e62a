//! Normalization of raw revision records into [`Change`]s.

use crate::model::{Change, ChangeSourceKind, RawRevisionRecord, Revisions};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;

/// Sort key derived from a revision id: numeric ids first, in numeric order,
/// then everything else in lexical order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum IdKey {
    Numeric(i64),
    Lexical(String),
}

impl IdKey {
    fn from_id(id: &str) -> Self {
        match id.trim().parse::<i64>() {
            Ok(n) => IdKey::Numeric(n),
            Err(_) => IdKey::Lexical(id.to_string()),
        }
    }
}

/// Convert raw insertion/deletion records into normalized changes.
///
/// Changes are ordered by revision id; records with equal keys keep
/// insertions before deletions and document order within each list.
pub fn normalize(revisions: Revisions) -> Vec<Change> {
    let insertions = revisions
        .insertions
        .into_iter()
        .filter_map(|r| to_change(r, true));
    let deletions = revisions
        .deletions
        .into_iter()
        .filter_map(|r| to_change(r, false));

    let mut keyed: Vec<(IdKey, Change)> = insertions.chain(deletions).collect();
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    keyed.into_iter().map(|(_, change)| change).collect()
}

fn to_change(record: RawRevisionRecord, inserted: bool) -> Option<(IdKey, Change)> {
    let text: String = record.text.nfc().collect();
    let change = if inserted {
        Change::insertion(text, ChangeSourceKind::Docx)
    } else {
        Change::deletion(text, ChangeSourceKind::Docx)
    }?;

    let change = change
        .with_metadata("id", record.id.as_str())
        .with_metadata("author", record.author.as_str())
        .with_metadata("date", record.date.as_str());
    Some((IdKey::from_id(&record.id), change))
}

/// Compare two revision ids the way [`normalize`] orders them.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    IdKey::from_id(a).cmp(&IdKey::from_id(b))
}

//! Plain-text rendering of changes for language-model prompts.

use crate::model::{Change, ChangeKind};
use std::fmt::Write;

/// Format changes as titled sections: deletions, insertions, replacements.
///
/// Empty sections are left out and an empty list yields an empty string.
///
/// # Example
///
/// ```
/// use untrack::model::{Change, ChangeSourceKind};
/// use untrack::render::to_prompt;
///
/// let changes = vec![Change::deletion("Bye", ChangeSourceKind::Docx).unwrap()];
/// assert_eq!(to_prompt(&changes), "Deletions:\n- \"Bye\"");
/// ```
pub fn to_prompt(changes: &[Change]) -> String {
    let sections = [
        ("Deletions:", ChangeKind::Deletion),
        ("Insertions:", ChangeKind::Insertion),
        ("Replacements:", ChangeKind::Paired),
    ];

    let mut blocks: Vec<String> = Vec::with_capacity(sections.len());
    for (title, kind) in sections {
        let mut block = String::new();
        for change in changes.iter().filter(|c| c.kind == kind) {
            if block.is_empty() {
                block.push_str(title);
            }
            block.push('\n');
            write_item(&mut block, change);
        }
        if !block.is_empty() {
            blocks.push(block);
        }
    }

    blocks.join("\n\n")
}

fn write_item(out: &mut String, change: &Change) {
    let deleted = change.deleted_text.as_deref().unwrap_or_default();
    let inserted = change.inserted_text.as_deref().unwrap_or_default();

    // Writing into a String cannot fail.
    let _ = match change.kind {
        ChangeKind::Deletion => write!(out, "- \"{}\"", deleted),
        ChangeKind::Insertion => write!(out, "- \"{}\"", inserted),
        ChangeKind::Paired => write!(out, "- \"{}\" -> \"{}\"", deleted, inserted),
    };
    if let Some(location) = &change.location {
        let _ = write!(out, " ({})", location);
    }
}

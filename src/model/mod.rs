//! Data model for tracked changes.
//!
//! `RawRevisionRecord` is what the extractor reads from markup; `Change` is
//! the normalized, source-independent record handed to formatting.

mod change;
mod revision;

pub use change::{Change, ChangeKind, ChangeSourceKind};
pub use revision::{RawRevisionRecord, Revisions};

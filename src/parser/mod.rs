//! Read path: revision records from WordprocessingML parts.

mod normalize;
mod revisions;

pub use normalize::{compare_ids, normalize};
pub use revisions::extract_revisions;

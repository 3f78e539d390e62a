//! Rendering of normalized changes for prompts and tooling.

mod json;
mod prompt;

pub use json::{to_json, JsonFormat};
pub use prompt::to_prompt;

//! Stripping of leaked internal deliberation from completion output.
//!
//! Some models interleave their answer with `<think>...</think>` blocks.
//! Every completion result passes through [`scrub_reasoning`] before it is
//! stored into a draft or verdict field, so no other module needs to care.

use regex::Regex;
use std::sync::LazyLock;

static CLOSED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>\s*").expect("valid regex"));

// A block that was opened but never closed swallows the rest of the text.
static DANGLING_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*").expect("valid regex"));

/// Remove internal-deliberation markup from model output and trim.
pub fn scrub_reasoning(text: &str) -> String {
    let without_closed = CLOSED_BLOCK.replace_all(text, "");
    let without_dangling = DANGLING_BLOCK.replace_all(&without_closed, "");
    without_dangling.trim().to_string()
}

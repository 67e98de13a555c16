//! Deterministic "Sources:" section rendering.
//!
//! Whatever citation formatting the model produced is discarded and
//! replaced with a section built from graded-document metadata, so the
//! citation format is consistent regardless of model behavior. Rendering
//! the same documents twice yields byte-identical output.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::Document;

static SOURCES_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n\s*sources\s*:?\s*\n").expect("valid regex"));

pub const NO_SOURCES: &str = "- (no sources)";

/// Render one bullet per unique (title, url, source) triple, preserving
/// first-seen order.
pub fn cite_block(docs: &[Document]) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut lines = Vec::new();
    for doc in docs {
        let md = &doc.metadata;
        let key = (md.title.clone(), md.url.clone(), md.source.clone());
        if !seen.insert(key) {
            continue;
        }
        let title = md.title.as_deref().unwrap_or("(untitled)");
        let link = md
            .url
            .as_deref()
            .or(md.source.as_deref())
            .unwrap_or_default();
        lines.push(format!("- {title} — {link}"));
    }
    if lines.is_empty() {
        NO_SOURCES.to_string()
    } else {
        lines.join("\n")
    }
}

/// Drop any model-written "Sources:" section from the draft and append the
/// deterministic one.
pub fn normalize_sources(draft: &str, cites: &str) -> String {
    let body = SOURCES_HEADING
        .splitn(draft, 2)
        .next()
        .unwrap_or(draft)
        .trim_end();
    let cites = if cites.is_empty() { NO_SOURCES } else { cites };
    format!("{body}\n\nSources:\n{cites}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocMetadata;

    fn doc(title: Option<&str>, url: Option<&str>, source: Option<&str>) -> Document {
        Document::new(
            "content",
            DocMetadata {
                title: title.map(str::to_string),
                url: url.map(str::to_string),
                source: source.map(str::to_string),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_cite_block_unique_in_order() {
        let docs = vec![
            doc(Some("B"), Some("https://b"), None),
            doc(Some("A"), Some("https://a"), None),
            doc(Some("B"), Some("https://b"), None),
        ];
        let block = cite_block(&docs);
        assert_eq!(block, "- B — https://b\n- A — https://a");
    }

    #[test]
    fn test_cite_block_fallbacks() {
        let docs = vec![doc(None, None, Some("corpus/file.md"))];
        assert_eq!(cite_block(&docs), "- (untitled) — corpus/file.md");
        assert_eq!(cite_block(&[]), NO_SOURCES);
    }

    #[test]
    fn test_normalize_replaces_model_sources() {
        let draft = "The answer.\n\nSources:\n- something the model made up";
        let out = normalize_sources(draft, "- Real — https://real");
        assert_eq!(out, "The answer.\n\nSources:\n- Real — https://real");
    }

    #[test]
    fn test_normalize_handles_heading_variants() {
        for heading in ["Sources:", "sources", "SOURCES :"] {
            let draft = format!("Body text.\n{heading}\n- junk");
            let out = normalize_sources(&draft, NO_SOURCES);
            assert_eq!(out, format!("Body text.\n\nSources:\n{NO_SOURCES}"));
        }
    }

    #[test]
    fn test_normalize_appends_when_no_heading() {
        let out = normalize_sources("Just a body", "- S — https://s");
        assert_eq!(out, "Just a body\n\nSources:\n- S — https://s");
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let docs = vec![
            doc(Some("Paper"), Some("https://paper"), None),
            doc(None, None, Some("feed")),
        ];
        let first = normalize_sources("Answer body", &cite_block(&docs));
        let second = normalize_sources(&first, &cite_block(&docs));
        assert_eq!(first, second);
    }
}

//! Prompt text for the pipeline stages.
//!
//! Kept in one place so the stage logic stays readable and the wording can
//! be tuned without touching control flow.

/// PLAN: advisory corpus/outside classification.
pub const PLAN_SYSTEM: &str = "Classify if this question should be answerable \
from the ingested corpus. Reply 'CORPUS' or 'OUTSIDE'. No extra text.";

/// EXPAND: alternative phrasings and hypothetical-answer search strings.
pub fn expand_system(max_alternatives: usize) -> String {
    format!(
        "Expand the user question into short, focused search queries and/or a \
brief hypothetical-answer note. Generate up to {max_alternatives} \
alternatives; one per line."
    )
}

/// GRADE: binary relevance check.
pub const GRADE_SYSTEM: &str =
    "You rate if a passage is RELEVANT to the question. Reply only 'YES' or 'NO'.";

pub fn grade_user(question: &str, passage: &str) -> String {
    format!("Question:\n{question}\n\nPassage:\n{passage}")
}

/// GENERATE: strictly grounded answering over an enumerated context block.
pub fn generate_system(context: &str) -> String {
    format!(
        "You are a STRICT RAG assistant.\n\
- Answer ONLY using the context. If insufficient, say exactly:\n  \
\"I couldn't find enough information in the indexed documents.\" and suggest 1-2 improved queries.\n\
- No chain-of-thought. Be concise, precise, and cite.\n\
- End with a 'Sources:' list (bullet points).\n\n\
### Context ###\n{context}"
    )
}

/// VERIFY: strict single-token grounding verdict.
pub const VERIFY_SYSTEM: &str = "Judge if the answer is fully grounded in the \
provided context and addresses the question. Reply STRICTLY with one token \
among: PASS / REFINE.";

pub fn verify_user(question: &str, context: &str, answer: &str) -> String {
    format!("Question:\n{question}\n\nContext:\n{context}\n\nAnswer:\n{answer}")
}

/// VERIFY (refine branch): sharper follow-up queries.
pub const REFINE_SYSTEM: &str =
    "Suggest 1-2 sharper search queries for the question. One per line.";

/// Fixed refusal used when no graded context exists.
pub const INSUFFICIENT_INFO: &str =
    "I couldn't find enough information in the indexed documents.";

/// Generic query suggestions when the turn produced none of its own.
pub const GENERIC_SUGGESTIONS: [&str; 2] = [
    "Ask about the ingested document's content (use specific keywords).",
    "Example: 'What were the main findings reported in the paper?'",
];

//! The six pipeline stages.
//!
//! Each stage is a pure transformation of [`SessionState`]: it takes the
//! state by value and returns a new one, talking to the completion service
//! and the retriever only through their traits. Failure policy differs per
//! stage (see each function); no stage leaves the state half-written.

use crate::completion::CompletionProvider;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::retrieval::Retriever;
use crate::sanitize::scrub_reasoning;
use crate::types::{Document, PlanVerdict, SessionState};

use super::prompts;
use super::sources::{cite_block, normalize_sources};

/// One completion round trip with reasoning-block scrubbing applied.
async fn ask(
    llm: &dyn CompletionProvider,
    system: &str,
    user: &str,
) -> Result<String, EngineError> {
    let raw = llm.complete(system, user).await?;
    Ok(scrub_reasoning(&raw))
}

/// Strip list markers and surrounding whitespace from a model-emitted line.
fn clean_line(line: &str) -> &str {
    line.trim_matches(|c: char| c == '-' || c == '*' || c.is_whitespace())
}

/// Parse up to `max` non-blank query lines out of model output.
fn parse_query_lines(text: &str, max: usize) -> Vec<String> {
    text.lines()
        .map(clean_line)
        .filter(|l| !l.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

fn chars_prefix(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// PLAN: advisory answerability classification; always seeds the query
/// list with the original question. A classifier failure stays advisory:
/// the verdict defaults to `Corpus` and the pipeline continues.
pub async fn plan(llm: &dyn CompletionProvider, mut state: SessionState) -> SessionState {
    state.plan = match ask(llm, prompts::PLAN_SYSTEM, &state.question).await {
        Ok(reply) => {
            if reply.trim().to_uppercase().starts_with("OUTSIDE") {
                PlanVerdict::Outside
            } else {
                PlanVerdict::Corpus
            }
        }
        Err(e) => {
            log::debug!("plan classification failed, assuming corpus: {e}");
            PlanVerdict::Corpus
        }
    };
    state.queries = vec![state.question.clone()];
    state
}

/// EXPAND: ask for alternative phrasings, one per line, and prepend the
/// original question. Zero usable lines (or a failed call) falls back to
/// the original question alone.
pub async fn expand(
    llm: &dyn CompletionProvider,
    config: &EngineConfig,
    mut state: SessionState,
) -> SessionState {
    let alternatives = match ask(
        llm,
        &prompts::expand_system(config.max_expansions),
        &state.question,
    )
    .await
    {
        Ok(reply) => parse_query_lines(&reply, config.max_expansions),
        Err(e) => {
            log::warn!("query expansion failed, using original question only: {e}");
            Vec::new()
        }
    };

    let mut queries = vec![state.question.clone()];
    queries.extend(alternatives);
    state.queries = queries;
    state
}

/// RETRIEVE: replace the candidate list with a fresh fused retrieval over
/// the current queries.
pub async fn retrieve(
    retriever: &dyn Retriever,
    mut state: SessionState,
) -> Result<SessionState, EngineError> {
    state.docs = retriever.retrieve(&state.queries).await?;
    log::debug!("retrieved {} fused candidates", state.docs.len());
    Ok(state)
}

/// GRADE: binary relevance filter over a bounded content prefix.
///
/// Policy: when grading keeps nothing but candidates exist, the top-2
/// candidates in fusion order are kept anyway so GENERATE always has some
/// context. A failed grading call counts as NO for that candidate only.
pub async fn grade(
    llm: &dyn CompletionProvider,
    config: &EngineConfig,
    mut state: SessionState,
) -> SessionState {
    let mut graded: Vec<Document> = Vec::new();
    for doc in &state.docs {
        let passage = chars_prefix(&doc.content, config.grade_prefix_chars);
        let user = prompts::grade_user(&state.question, &passage);
        match ask(llm, prompts::GRADE_SYSTEM, &user).await {
            Ok(reply) => {
                if reply.trim().to_uppercase().starts_with('Y') {
                    graded.push(doc.clone());
                }
            }
            Err(e) => {
                log::warn!("grading call failed, dropping candidate: {e}");
            }
        }
    }

    if graded.is_empty() && !state.docs.is_empty() {
        graded = state.docs.iter().take(2).cloned().collect();
        log::debug!("grading kept nothing; falling back to top-2 candidates");
    }

    state.graded_docs = graded;
    state
}

/// GENERATE: grounded answer over the graded context, with the Sources
/// section rebuilt deterministically from metadata.
///
/// With no graded context at all this produces the fixed insufficient-
/// information message plus query suggestions. A completion failure here
/// is user-visible and propagates; fabricating an answer is not an option.
pub async fn generate(
    llm: &dyn CompletionProvider,
    mut state: SessionState,
) -> Result<SessionState, EngineError> {
    if state.graded_docs.is_empty() {
        let mut suggestions: Vec<String> = state
            .queries
            .iter()
            .filter(|q| !q.trim().is_empty())
            .take(2)
            .cloned()
            .collect();
        if suggestions.is_empty() {
            suggestions = prompts::GENERIC_SUGGESTIONS
                .iter()
                .map(|s| s.to_string())
                .collect();
        }

        let draft = format!(
            "{}\nTry one of these queries:\n- {}",
            prompts::INSUFFICIENT_INFO,
            suggestions.join("\n- ")
        );
        state.draft = normalize_sources(&draft, "");
        return Ok(state);
    }

    let context = state
        .graded_docs
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let title = d.metadata.title.as_deref().unwrap_or("(untitled)");
            let link = d
                .metadata
                .url
                .as_deref()
                .or(d.metadata.source.as_deref())
                .unwrap_or_default();
            format!("[{}] {title} ({link})\n{}", i + 1, d.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    let draft = ask(llm, &prompts::generate_system(&context), &state.question).await?;
    state.draft = normalize_sources(&draft, &cite_block(&state.graded_docs));
    Ok(state)
}

/// Outcome of the VERIFY stage, consumed by the stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The draft is grounded; the turn can finish.
    Pass,
    /// The draft needs another retrieval pass; queries were updated and
    /// the loop counter advanced.
    Refine,
}

/// VERIFY: strict PASS/REFINE grounding check.
///
/// At the loop bound the state passes through untouched. Any failure
/// (transport or malformed verdict) degrades to PASS: never loop on a
/// broken verifier. A REFINE without at least one usable new query also
/// degrades to PASS.
pub async fn verify(
    llm: &dyn CompletionProvider,
    config: &EngineConfig,
    mut state: SessionState,
) -> (SessionState, Verdict) {
    if state.loop_count >= config.max_loops {
        return (state, Verdict::Pass);
    }

    let context: String = {
        let joined = state
            .graded_docs
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        chars_prefix(&joined, config.verify_context_chars)
    };
    let answer = chars_prefix(&state.draft, config.verify_answer_chars);

    let verdict = match ask(
        llm,
        prompts::VERIFY_SYSTEM,
        &prompts::verify_user(&state.question, &context, &answer),
    )
    .await
    {
        Ok(reply) => reply.trim().to_uppercase(),
        Err(e) => {
            log::warn!("verification call failed, treating as PASS: {e}");
            return (state, Verdict::Pass);
        }
    };

    if !verdict.starts_with("REFINE") {
        return (state, Verdict::Pass);
    }

    let new_queries = match ask(llm, prompts::REFINE_SYSTEM, &state.question).await {
        Ok(reply) => parse_query_lines(&reply, 2),
        Err(e) => {
            log::warn!("refinement query request failed, treating as PASS: {e}");
            return (state, Verdict::Pass);
        }
    };
    if new_queries.is_empty() {
        return (state, Verdict::Pass);
    }

    let mut queries = vec![state.question.clone()];
    queries.extend(new_queries);
    state.queries = queries;
    state.loop_count += 1;
    (state, Verdict::Refine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_line_strips_markers() {
        assert_eq!(clean_line("- a query"), "a query");
        assert_eq!(clean_line("  * another  "), "another");
        assert_eq!(clean_line("plain"), "plain");
    }

    #[test]
    fn test_parse_query_lines_filters_and_bounds() {
        let text = "- first\n\n- second\n- third\n- fourth";
        assert_eq!(parse_query_lines(text, 3), vec!["first", "second", "third"]);
        assert!(parse_query_lines("\n\n- \n", 3).is_empty());
    }

    #[test]
    fn test_chars_prefix_is_char_based() {
        assert_eq!(chars_prefix("héllo", 2), "hé");
        assert_eq!(chars_prefix("ok", 10), "ok");
    }
}

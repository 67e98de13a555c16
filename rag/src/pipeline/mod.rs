//! Turn orchestration: a bounded state machine over the six stages.
//!
//! Transitions are fixed except for the single conditional edge out of
//! VERIFY, which loops back to RETRIEVE only when the verifier demanded a
//! refinement and the loop budget allows it. With `max_loops` refinement
//! rounds a turn performs at most `max_loops + 1` retrieval passes.

pub mod prompts;
pub mod sources;
pub mod stages;

pub use stages::Verdict;

use std::sync::Arc;

use crate::completion::CompletionProvider;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::retrieval::Retriever;
use crate::types::SessionState;

/// Pipeline stage identifiers, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Plan,
    Expand,
    Retrieve,
    Grade,
    Generate,
    Verify,
    Done,
}

impl Stage {
    /// Next stage. `verdict` is only consulted on the edge out of
    /// [`Stage::Verify`].
    pub fn next(self, verdict: Option<&Verdict>) -> Stage {
        match self {
            Stage::Plan => Stage::Expand,
            Stage::Expand => Stage::Retrieve,
            Stage::Retrieve => Stage::Grade,
            Stage::Grade => Stage::Generate,
            Stage::Generate => Stage::Verify,
            Stage::Verify => match verdict {
                Some(Verdict::Refine) => Stage::Retrieve,
                _ => Stage::Done,
            },
            Stage::Done => Stage::Done,
        }
    }
}

/// Drives one question through the full pipeline.
pub struct TurnEngine {
    llm: Arc<dyn CompletionProvider>,
    retriever: Arc<dyn Retriever>,
    checkpoint: Option<Arc<dyn crate::checkpoint::CheckpointStore>>,
    config: EngineConfig,
}

impl TurnEngine {
    pub fn new(
        llm: Arc<dyn CompletionProvider>,
        retriever: Arc<dyn Retriever>,
        config: EngineConfig,
    ) -> Self {
        Self {
            llm,
            retriever,
            checkpoint: None,
            config,
        }
    }

    /// Persist finished turns under their thread id.
    pub fn with_checkpoint(
        mut self,
        checkpoint: Arc<dyn crate::checkpoint::CheckpointStore>,
    ) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one complete turn. Each turn starts from fresh state; the
    /// thread id scopes where the finished state is checkpointed.
    pub async fn run_turn(
        &self,
        question: &str,
        thread_id: &str,
    ) -> Result<SessionState, EngineError> {
        let mut state = SessionState::new(question);
        let mut stage = Stage::Plan;

        loop {
            log::debug!("stage {stage:?} (loop {})", state.loop_count);
            let verdict = match stage {
                Stage::Plan => {
                    state = stages::plan(self.llm.as_ref(), state).await;
                    None
                }
                Stage::Expand => {
                    state = stages::expand(self.llm.as_ref(), &self.config, state).await;
                    None
                }
                Stage::Retrieve => {
                    state = stages::retrieve(self.retriever.as_ref(), state).await?;
                    None
                }
                Stage::Grade => {
                    state = stages::grade(self.llm.as_ref(), &self.config, state).await;
                    None
                }
                Stage::Generate => {
                    state = stages::generate(self.llm.as_ref(), state).await?;
                    None
                }
                Stage::Verify => {
                    let (next_state, verdict) =
                        stages::verify(self.llm.as_ref(), &self.config, state).await;
                    state = next_state;
                    Some(verdict)
                }
                Stage::Done => break,
            };
            stage = stage.next(verdict.as_ref());
        }

        if let Some(store) = &self.checkpoint {
            store.save(thread_id, &state);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_transitions() {
        assert_eq!(Stage::Plan.next(None), Stage::Expand);
        assert_eq!(Stage::Expand.next(None), Stage::Retrieve);
        assert_eq!(Stage::Retrieve.next(None), Stage::Grade);
        assert_eq!(Stage::Grade.next(None), Stage::Generate);
        assert_eq!(Stage::Generate.next(None), Stage::Verify);
    }

    #[test]
    fn test_verify_edge_is_the_only_conditional_one() {
        assert_eq!(Stage::Verify.next(Some(&Verdict::Pass)), Stage::Done);
        assert_eq!(Stage::Verify.next(None), Stage::Done);
        assert_eq!(Stage::Verify.next(Some(&Verdict::Refine)), Stage::Retrieve);
        assert_eq!(Stage::Done.next(None), Stage::Done);
    }
}

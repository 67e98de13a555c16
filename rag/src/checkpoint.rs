//! Session checkpointing by opaque thread identifier.
//!
//! Persistence mechanics are out of scope; what the engine relies on is
//! the contract that a finished turn's state can be stored and later
//! fetched under the same thread id, and that different thread ids never
//! interfere.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::SessionState;

/// Store of per-thread session state.
pub trait CheckpointStore: Send + Sync {
    /// Fetch the last saved state for a thread, if any.
    fn load(&self, thread_id: &str) -> Option<SessionState>;

    /// Save the state for a thread, replacing any previous checkpoint.
    fn save(&self, thread_id: &str, state: &SessionState);
}

/// In-memory checkpoint store.
#[derive(Default)]
pub struct MemoryCheckpoint {
    inner: Mutex<HashMap<String, SessionState>>,
}

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpoint {
    fn load(&self, thread_id: &str) -> Option<SessionState> {
        self.inner.lock().expect("checkpoint lock").get(thread_id).cloned()
    }

    fn save(&self, thread_id: &str, state: &SessionState) {
        self.inner
            .lock()
            .expect("checkpoint lock")
            .insert(thread_id.to_string(), state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_round_trip() {
        let store = MemoryCheckpoint::new();
        assert!(store.load("t1").is_none());

        let mut state = SessionState::new("q");
        state.draft = "answer".to_string();
        store.save("t1", &state);

        let loaded = store.load("t1").unwrap();
        assert_eq!(loaded.question, "q");
        assert_eq!(loaded.draft, "answer");
    }

    #[test]
    fn test_threads_do_not_interfere() {
        let store = MemoryCheckpoint::new();
        store.save("a", &SessionState::new("question a"));
        store.save("b", &SessionState::new("question b"));

        assert_eq!(store.load("a").unwrap().question, "question a");
        assert_eq!(store.load("b").unwrap().question, "question b");

        store.save("a", &SessionState::new("question a v2"));
        assert_eq!(store.load("a").unwrap().question, "question a v2");
        assert_eq!(store.load("b").unwrap().question, "question b");
    }
}

//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::MemoryStore;
use crate::config::Config;
use doodle_notes_core::{AuthStore, NoteAccessController, NoteStore, UserDirectory};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub notes: NoteAccessController,
    pub users: Arc<dyn UserDirectory>,
    pub auth: Arc<dyn AuthStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the access controller to the given ports using the configured
    /// read policy and username matching.
    pub fn new(
        config: Arc<Config>,
        note_store: Arc<dyn NoteStore>,
        users: Arc<dyn UserDirectory>,
        auth: Arc<dyn AuthStore>,
    ) -> Self {
        let notes = NoteAccessController::new(
            note_store,
            users.clone(),
            config.read_policy,
            config.username_match,
        );
        Self {
            notes,
            users,
            auth,
            config,
        }
    }

    /// All three ports backed by one fresh `MemoryStore`.
    pub fn in_memory(config: Arc<Config>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store.clone(), store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doodle_notes_core::ReadPolicy;

    #[test]
    fn controller_uses_the_configured_read_policy() {
        let mut config = Config::in_memory();
        config.read_policy = ReadPolicy::OwnerOnly;
        let state = AppState::in_memory(Arc::new(config));
        assert_eq!(state.notes.read_policy(), ReadPolicy::OwnerOnly);

        let state = AppState::in_memory(Arc::new(Config::in_memory()));
        assert_eq!(state.notes.read_policy(), ReadPolicy::Unrestricted);
    }
}

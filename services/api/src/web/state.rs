//! services/api/src/web/state.rs
//!
//! Defines the application's shared state: one injected context object
//! holding every port, constructed at startup and passed to all handlers.
//! There are no ambient singletons.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::config::Config;
use learnai_core::ports::{
    ChatAnswerService, PlanExportService, PlanGenerationService, StorageService,
};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StorageService>,
    pub config: Arc<Config>,
    pub plan_generator: Arc<dyn PlanGenerationService>,
    pub chat_answerer: Arc<dyn ChatAnswerService>,
    pub pdf_exporter: Arc<dyn PlanExportService>,
    /// Users with a generation request in flight. One generation at a time
    /// per account; a concurrent attempt is rejected rather than queued.
    pub generating: Arc<Mutex<HashSet<Uuid>>>,
}

/// Marker for a user's in-flight generation slot; the slot frees itself when
/// the marker drops, on success and error paths alike.
pub struct GenerationSlot {
    generating: Arc<Mutex<HashSet<Uuid>>>,
    user_id: Uuid,
}

impl AppState {
    /// Claims the generation slot for `user_id`, or returns `None` when a
    /// request for the same account is already in flight.
    pub fn try_begin_generation(&self, user_id: Uuid) -> Option<GenerationSlot> {
        let mut generating = self.generating.lock().expect("generation set poisoned");
        if !generating.insert(user_id) {
            return None;
        }
        Some(GenerationSlot {
            generating: self.generating.clone(),
            user_id,
        })
    }
}

impl Drop for GenerationSlot {
    fn drop(&mut self) {
        if let Ok(mut generating) = self.generating.lock() {
            generating.remove(&self.user_id);
        }
    }
}

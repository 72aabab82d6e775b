//! Application state shared across request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use opforms_engine::{Form, Session};
use opforms_storage::{MemoryResponseStore, ResponseStore};

/// Loaded forms, live fill sessions, and the response store.
pub(crate) struct AppState {
    /// Form definitions keyed by form id.
    pub(crate) forms: RwLock<HashMap<String, Form>>,
    /// In-flight fill sessions keyed by session id. A session is removed
    /// once its response has been persisted.
    pub(crate) sessions: Mutex<HashMap<String, Session>>,
    /// Submitted responses.
    pub(crate) store: Arc<dyn ResponseStore>,
}

impl AppState {
    pub(crate) fn new() -> AppState {
        AppState::with_store(Arc::new(MemoryResponseStore::new()))
    }

    pub(crate) fn with_store(store: Arc<dyn ResponseStore>) -> AppState {
        AppState {
            forms: RwLock::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            store,
        }
    }
}

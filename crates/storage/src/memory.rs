//! In-memory response store, the default backend for the CLI server and
//! for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use opforms_engine::Response;

use crate::error::StorageError;
use crate::traits::ResponseStore;

/// Responses held per form id, newest first.
#[derive(Debug, Default)]
pub struct MemoryResponseStore {
    inner: RwLock<BTreeMap<String, Vec<Response>>>,
}

impl MemoryResponseStore {
    pub fn new() -> MemoryResponseStore {
        MemoryResponseStore::default()
    }
}

#[async_trait]
impl ResponseStore for MemoryResponseStore {
    async fn submit(&self, response: Response) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let duplicate = inner
            .values()
            .flatten()
            .any(|stored| stored.id == response.id);
        if duplicate {
            return Err(StorageError::AlreadySubmitted {
                response_id: response.id,
            });
        }
        inner
            .entry(response.form_id.clone())
            .or_default()
            .insert(0, response);
        Ok(())
    }

    async fn responses_for_form(&self, form_id: &str) -> Result<Vec<Response>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.get(form_id).cloned().unwrap_or_default())
    }

    async fn response_count(&self, form_id: &str) -> Result<usize, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.get(form_id).map_or(0, Vec::len))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use opforms_engine::{Answer, AnswerValue};

    fn response(id: &str, form_id: &str, submitted_at: &str) -> Response {
        Response {
            id: id.to_string(),
            form_id: form_id.to_string(),
            submitted_at: submitted_at.to_string(),
            answers: vec![Answer {
                question_id: "q1".to_string(),
                value: AnswerValue::Text("hi".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn stores_and_lists_newest_first() {
        let store = MemoryResponseStore::new();
        store
            .submit(response("r1", "f1", "2026-08-23T10:00:00Z"))
            .await
            .unwrap();
        store
            .submit(response("r2", "f1", "2026-08-23T11:00:00Z"))
            .await
            .unwrap();

        let listed = store.responses_for_form("f1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "r2");
        assert_eq!(listed[1].id, "r1");
        assert_eq!(store.response_count("f1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_form_lists_empty() {
        let store = MemoryResponseStore::new();
        assert!(store.responses_for_form("ghost").await.unwrap().is_empty());
        assert_eq!(store.response_count("ghost").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_response_id_is_rejected() {
        let store = MemoryResponseStore::new();
        store
            .submit(response("r1", "f1", "2026-08-23T10:00:00Z"))
            .await
            .unwrap();
        let err = store
            .submit(response("r1", "f2", "2026-08-23T10:05:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::AlreadySubmitted { response_id } if response_id == "r1"
        ));
    }

    #[tokio::test]
    async fn forms_are_isolated() {
        let store = MemoryResponseStore::new();
        store
            .submit(response("r1", "f1", "2026-08-23T10:00:00Z"))
            .await
            .unwrap();
        store
            .submit(response("r2", "f2", "2026-08-23T10:01:00Z"))
            .await
            .unwrap();
        assert_eq!(store.response_count("f1").await.unwrap(), 1);
        assert_eq!(store.response_count("f2").await.unwrap(), 1);
    }
}

//! HTTP route handlers: health, forms, sessions, responses.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use opforms_engine::{
    generate_response_id, lint_form, AdvanceOutcome, AnswerValue, Form, Session, StepView,
};
use super::json_error;
use super::state::AppState;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// GET /forms
pub(crate) async fn handle_list_forms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let forms = state.forms.read().await;
    let mut list = Vec::new();
    for form in forms.values() {
        let count = state
            .store
            .response_count(&form.id)
            .await
            .unwrap_or_default();
        list.push(serde_json::json!({
            "id": form.id,
            "title": form.title,
            "stepCount": form.step_count(),
            "responseCount": count,
        }));
    }
    (StatusCode::OK, Json(serde_json::json!({ "forms": list })))
}

/// POST /forms -- register a form definition.
pub(crate) async fn handle_put_form(
    State(state): State<Arc<AppState>>,
    Json(doc): Json<serde_json::Value>,
) -> impl IntoResponse {
    let form = match Form::from_json(&doc) {
        Ok(form) => form,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response(),
    };
    let findings: Vec<String> = lint_form(&form).iter().map(|f| f.to_string()).collect();
    let form_id = form.id.clone();
    state.forms.write().await.insert(form_id.clone(), form);
    tracing::info!(form_id = %form_id, "form registered");
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": form_id, "findings": findings })),
    )
        .into_response()
}

/// POST /forms/{id}/sessions -- start a fill session.
pub(crate) async fn handle_create_session(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
) -> impl IntoResponse {
    let forms = state.forms.read().await;
    let Some(form) = forms.get(&form_id) else {
        return json_error(
            StatusCode::NOT_FOUND,
            &format!("form '{}' not found", form_id),
        )
        .into_response();
    };
    let session = Session::new(form.clone());
    drop(forms);

    let session_id = generate_response_id();
    let body = serde_json::json!({
        "sessionId": session_id,
        "step": step_json(&session),
        "progress": session.progress(),
    });
    state.sessions.lock().await.insert(session_id, session);
    (StatusCode::CREATED, Json(body)).into_response()
}

/// GET /sessions/{id}
pub(crate) async fn handle_get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.lock().await;
    let Some(session) = sessions.get(&session_id) else {
        return session_not_found(&session_id).into_response();
    };
    (StatusCode::OK, Json(session_view(session))).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerBody {
    question_id: String,
    value: AnswerValue,
}

/// POST /sessions/{id}/answers -- record one answer without navigating.
pub(crate) async fn handle_record_answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(body): Json<AnswerBody>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.lock().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return session_not_found(&session_id).into_response();
    };
    session.record_answer(&body.question_id, body.value);
    (StatusCode::OK, Json(session_view(session))).into_response()
}

/// POST /sessions/{id}/advance
pub(crate) async fn handle_advance(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.lock().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return session_not_found(&session_id).into_response();
    };

    match session.advance() {
        AdvanceOutcome::Advanced => {
            (StatusCode::OK, Json(session_view(session))).into_response()
        }
        AdvanceOutcome::ValidationFailed => {
            let mut view = session_view(session);
            view["outcome"] = serde_json::json!("validationFailed");
            (StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response()
        }
        AdvanceOutcome::Submitted(response) => {
            tracing::info!(session_id = %session_id, response_id = %response.id, "session submitted");
            let payload = serde_json::to_value(&response).unwrap_or_default();
            if let Err(e) = state.store.submit(response).await {
                // Keep the session and hand the assembled payload back so
                // a persistence failure loses nothing.
                tracing::warn!(session_id = %session_id, error = %e, "response persistence failed");
                let body = serde_json::json!({
                    "error": e.to_string(),
                    "response": payload,
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
            sessions.remove(&session_id);
            let body = serde_json::json!({
                "outcome": "submitted",
                "response": payload,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        AdvanceOutcome::NoOp => {
            json_error(StatusCode::CONFLICT, "session already completed").into_response()
        }
    }
}

/// POST /sessions/{id}/back
pub(crate) async fn handle_back(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.lock().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        return session_not_found(&session_id).into_response();
    };
    let moved = session.back();
    let mut view = session_view(session);
    view["moved"] = serde_json::json!(moved);
    (StatusCode::OK, Json(view)).into_response()
}

/// GET /forms/{id}/responses
pub(crate) async fn handle_list_responses(
    State(state): State<Arc<AppState>>,
    Path(form_id): Path<String>,
) -> impl IntoResponse {
    match state.store.responses_for_form(&form_id).await {
        Ok(responses) => (
            StatusCode::OK,
            Json(serde_json::json!({ "responses": responses })),
        )
            .into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()).into_response(),
    }
}

fn session_not_found(session_id: &str) -> impl IntoResponse {
    json_error(
        StatusCode::NOT_FOUND,
        &format!("session '{}' not found", session_id),
    )
}

fn session_view(session: &Session) -> serde_json::Value {
    let errors: serde_json::Map<String, serde_json::Value> = session
        .validation_errors()
        .iter()
        .map(|(id, kind)| (id.clone(), serde_json::json!(kind.to_string())))
        .collect();
    serde_json::json!({
        "formId": session.form().id,
        "step": step_json(session),
        "progress": session.progress(),
        "errors": errors,
    })
}

/// Shape of the current step for API consumers.
fn step_json(session: &Session) -> serde_json::Value {
    match session.current_step() {
        StepView::Welcome(welcome) => serde_json::json!({
            "kind": "welcome",
            "title": welcome.title,
            "description": welcome.description,
            "buttonText": welcome.button_text,
        }),
        StepView::Question { question, index } => serde_json::json!({
            "kind": "question",
            "index": index,
            "questionId": question.id,
            "title": question.title,
            "required": question.required,
            "subQuestions": question
                .sub_questions()
                .map(|subs| subs.iter().map(|s| s.id.clone()).collect::<Vec<_>>()),
        }),
        StepView::GroupSub {
            group,
            sub,
            index,
            sub_index,
        } => serde_json::json!({
            "kind": "groupSub",
            "index": index,
            "subIndex": sub_index,
            "groupId": group.id,
            "questionId": sub.id,
            "title": sub.title,
            "required": sub.required,
        }),
        StepView::Final(screen) => serde_json::json!({
            "kind": "final",
            "finalId": screen.id,
            "title": screen.title,
            "description": screen.description,
        }),
        StepView::Completed => serde_json::json!({ "kind": "completed" }),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use opforms_engine::Response;
    use opforms_storage::{MemoryResponseStore, ResponseStore, StorageError};

    /// Backend that refuses every submission.
    struct RejectingStore;

    #[async_trait]
    impl ResponseStore for RejectingStore {
        async fn submit(&self, _response: Response) -> Result<(), StorageError> {
            Err(StorageError::Backend("disk full".to_string()))
        }

        async fn responses_for_form(&self, _form_id: &str) -> Result<Vec<Response>, StorageError> {
            Ok(Vec::new())
        }

        async fn response_count(&self, _form_id: &str) -> Result<usize, StorageError> {
            Ok(0)
        }
    }

    async fn state_with_session(store: Arc<dyn ResponseStore>) -> Arc<AppState> {
        let state = Arc::new(AppState::with_store(store));
        let form = Form::from_json(&serde_json::json!({
            "id": "f1",
            "questions": [{ "id": "q1", "type": "short-text" }]
        }))
        .unwrap();
        let mut session = Session::new(form.clone());
        session.record_answer("q1", AnswerValue::Text("hi".to_string()));
        state.forms.write().await.insert("f1".to_string(), form);
        state.sessions.lock().await.insert("s1".to_string(), session);
        state
    }

    #[tokio::test]
    async fn successful_submission_persists_and_drops_the_session() {
        let store = Arc::new(MemoryResponseStore::new());
        let state = state_with_session(store.clone()).await;

        let response = handle_advance(State(state.clone()), Path("s1".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!state.sessions.lock().await.contains_key("s1"));
        assert_eq!(store.response_count("f1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_persistence_keeps_session_and_returns_the_response() {
        let state = state_with_session(Arc::new(RejectingStore)).await;

        let response = handle_advance(State(state.clone()), Path("s1".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("disk full"));
        // The assembled payload rides along so nothing is lost.
        assert_eq!(body["response"]["formId"], "f1");
        assert_eq!(body["response"]["answers"][0]["value"], "hi");
        // The session is still addressable.
        assert!(state.sessions.lock().await.contains_key("s1"));
    }
}

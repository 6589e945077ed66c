//! HTTP route handlers for the chat, mind-map and session API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::{SessionSummary, Turn};
use crate::llm::SourceLink;
use crate::prompt::{assemble, build_context_block, build_mindmap_prompt};
use crate::recovery::recover_from_model_output;
use crate::scraping::WebSource;

use super::error::ApiError;
use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ask", post(ask))
        .route("/generate_mindmap", post(generate_mindmap))
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/title", post(update_title))
        .route("/memory/{id}", get(get_memory).delete(clear_memory))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "chatmap",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.model.model_name(),
    }))
}

/// Trim a field and treat blank values as absent.
fn required(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|value| !value.is_empty())
}

/// Chat request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AskRequest {
    /// Target session.
    pub session_id: Option<String>,
    /// User question.
    pub query: Option<String>,
}

/// Chat response.
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    /// Assistant reply.
    pub response: String,
    /// Session the exchange was stored in.
    pub session_id: String,
    /// Sources cited by the model followed by scraped context pages.
    pub sources: Vec<SourceLink>,
}

impl From<&WebSource> for SourceLink {
    fn from(source: &WebSource) -> Self {
        Self {
            link: source.url.clone(),
            title: (!source.title.is_empty()).then(|| source.title.clone()),
        }
    }
}

/// Answer a query within a session and record the exchange.
async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload?;
    let (Some(session_id), Some(query)) = (
        request
            .session_id
            .as_deref()
            .filter(|id| !id.trim().is_empty()),
        required(request.query.as_deref()),
    ) else {
        return Err(ApiError::BadRequest(
            "Both session_id and query are required".to_string(),
        ));
    };

    let history = state.store.get(session_id).await?;

    let scraped = match &state.web {
        Some(web) => Some(web.gather(query).await),
        None => None,
    };
    let context = scraped.as_deref().map(build_context_block);

    let messages = assemble(state.prompt_style, &history, query, context.as_deref());
    let reply = state.model.complete(&messages).await?;

    state
        .store
        .append(
            session_id,
            vec![Turn::user(query), Turn::assistant(reply.message.as_str())],
        )
        .await?;
    if state.store.assign_title_from_query(session_id, query).await? {
        tracing::debug!(session_id, "Session titled from first query");
    }

    let mut sources = reply.sources;
    sources.extend(scraped.iter().flatten().map(SourceLink::from));

    Ok(Json(AskResponse {
        response: reply.message,
        session_id: session_id.to_string(),
        sources,
    }))
}

/// Mind map request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MindMapRequest {
    /// Scenario to map.
    pub prompt: Option<String>,
}

/// Generate a mind map and return the recovered JSON object.
async fn generate_mindmap(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MindMapRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = payload?;
    let prompt = required(request.prompt.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Prompt is missing".to_string()))?;

    let messages = [Turn::user(build_mindmap_prompt(prompt))];
    let reply = state.model.complete(&messages).await?;
    tracing::debug!(raw = %reply.message, "Raw mind map response");

    let recovered = recover_from_model_output(&reply.message)?;
    tracing::info!(strategy = %recovered.strategy, "Mind map parsed");

    Ok(Json(recovered.value))
}

/// Generic success body.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always `true`.
    pub success: bool,
}

const SUCCESS: SuccessResponse = SuccessResponse { success: true };

/// Create a session with a fresh UUID.
async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSummary>, ApiError> {
    let id = Uuid::new_v4().to_string();
    let summary = state.store.create(&id).await?;
    tracing::info!(session_id = %summary.id, "Session created");
    Ok(Json(summary))
}

/// List sessions in creation order.
async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// Delete a session. Unknown ids succeed.
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.store.delete(&id).await?;
    Ok(Json(SUCCESS))
}

/// Rename request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TitleRequest {
    /// New title.
    pub title: Option<String>,
}

/// Rename a session.
async fn update_title(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<TitleRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = payload?;
    let title = required(request.title.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

    if state.store.rename(&id, title).await? {
        Ok(Json(SUCCESS))
    } else {
        Err(ApiError::NotFound)
    }
}

/// Stored turns of a session; empty for unknown ids.
async fn get_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Turn>>, ApiError> {
    Ok(Json(state.store.get(&id).await?))
}

/// Clear the turns of an existing session.
async fn clear_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if state.store.clear(&id).await? {
        Ok(Json(SUCCESS))
    } else {
        Err(ApiError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;
    use std::sync::Mutex;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::llm::{ChatModel, LlmError, LlmResult, ModelFuture, ModelReply};
    use crate::prompt::{NO_WEB_CONTEXT, PromptStyle};
    use crate::scraping::{ScrapeFuture, WebContext};

    struct FakeModel {
        reply: Result<String, String>,
        seen: Mutex<Vec<Vec<Turn>>>,
    }

    impl FakeModel {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<Turn>> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl ChatModel for FakeModel {
        fn complete<'a>(
            &'a self,
            messages: &'a [Turn],
        ) -> ModelFuture<'a, LlmResult<ModelReply>> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let result = match &self.reply {
                Ok(text) => Ok(ModelReply::text(text.as_str())),
                Err(message) => Err(LlmError::Api {
                    status: 503,
                    message: message.clone(),
                }),
            };
            Box::pin(ready(result))
        }

        fn model_name(&self) -> &str {
            "fake-model"
        }
    }

    struct FakeWeb(Vec<WebSource>);

    impl WebContext for FakeWeb {
        fn gather<'a>(&'a self, _query: &'a str) -> ScrapeFuture<'a, Vec<WebSource>> {
            Box::pin(ready(self.0.clone()))
        }
    }

    fn app(model: Arc<FakeModel>) -> Router {
        create_router(AppState::new(model).shared())
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn ask(app: &Router, session_id: &str, query: &str) -> (StatusCode, Value) {
        call(
            app,
            "POST",
            "/ask",
            Some(json!({"session_id": session_id, "query": query})),
        )
        .await
    }

    async fn titles(app: &Router) -> Vec<String> {
        let (_, sessions) = call(app, "GET", "/sessions", None).await;
        sessions
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["title"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(FakeModel::replying("x"));
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "fake-model");
    }

    #[tokio::test]
    async fn test_ask_records_exchange_and_titles_session() {
        let model = FakeModel::replying("Paris.");
        let app = app(model.clone());

        let (status, body) = ask(&app, "s1", "  Capital of France?  ").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Paris.");
        assert_eq!(body["session_id"], "s1");
        assert_eq!(body["sources"], json!([]));

        let (_, memory) = call(&app, "GET", "/memory/s1", None).await;
        assert_eq!(
            memory,
            json!([
                {"role": "user", "content": "Capital of France?"},
                {"role": "assistant", "content": "Paris."}
            ])
        );
        assert_eq!(titles(&app).await, ["Capital of France?"]);
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_ask_requires_query_and_session() {
        let model = FakeModel::replying("x");
        let app = app(model.clone());

        let (status, body) = ask(&app, "s1", "   ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Both session_id and query are required");

        let (status, _) = call(&app, "POST", "/ask", Some(json!({"query": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_session_id_is_used_verbatim() {
        let app = app(FakeModel::replying("ok"));

        let (status, body) = ask(&app, " s1 ", "hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_id"], " s1 ");

        let (_, memory) = call(&app, "GET", "/memory/s1", None).await;
        assert_eq!(memory, json!([]));
        let (_, memory) = call(&app, "GET", "/memory/%20s1%20", None).await;
        assert_eq!(memory.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app(FakeModel::replying("x"));
        let request = Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_model_failure_is_reported_and_not_stored() {
        let app = app(FakeModel::failing("upstream down"));

        let (status, body) = ask(&app, "s1", "hello").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "LLM error");
        assert!(body["details"].as_str().unwrap().contains("upstream down"));

        let (_, memory) = call(&app, "GET", "/memory/s1", None).await;
        assert_eq!(memory, json!([]));
    }

    #[tokio::test]
    async fn test_prompt_carries_recent_history() {
        let model = FakeModel::replying("ok");
        let app = app(model.clone());

        for i in 0..5 {
            ask(&app, "s1", &format!("question {i}")).await;
        }

        let calls = model.calls();
        let last_prompt = &calls.last().unwrap()[0].content;
        assert!(!last_prompt.contains("question 0"));
        assert!(last_prompt.contains("User: question 1\nAssistant: ok"));
        assert!(last_prompt.ends_with("User: question 4"));
    }

    #[tokio::test]
    async fn test_rename_survives_later_queries() {
        let app = app(FakeModel::replying("ok"));

        let (_, session) = call(&app, "POST", "/sessions", None).await;
        let id = session["id"].as_str().unwrap().to_string();
        assert_eq!(session["title"], "New Chat");

        let (status, body) = call(
            &app,
            "POST",
            &format!("/sessions/{id}/title"),
            Some(json!({"title": "Trip planning"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        for query in ["first", "second", "third"] {
            ask(&app, &id, query).await;
        }
        assert_eq!(titles(&app).await, ["Trip planning"]);
    }

    #[tokio::test]
    async fn test_first_query_replaces_placeholder_title() {
        let app = app(FakeModel::replying("ok"));

        let (_, session) = call(&app, "POST", "/sessions", None).await;
        let id = session["id"].as_str().unwrap().to_string();
        ask(&app, &id, &"long question ".repeat(10)).await;
        ask(&app, &id, "another").await;

        let titles = titles(&app).await;
        assert_eq!(titles.len(), 1);
        assert!(titles[0].ends_with("..."));
        assert_eq!(titles[0].chars().count(), 53);
    }

    #[tokio::test]
    async fn test_title_validation_and_not_found() {
        let app = app(FakeModel::replying("ok"));

        let (status, body) =
            call(&app, "POST", "/sessions/ghost/title", Some(json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");

        let (status, body) = call(&app, "POST", "/sessions/ghost/title", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title is required");
    }

    #[tokio::test]
    async fn test_memory_of_unknown_session_is_empty() {
        let app = app(FakeModel::replying("ok"));
        let (status, body) = call(&app, "GET", "/memory/unknown", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_clear_memory() {
        let app = app(FakeModel::replying("ok"));

        let (status, _) = call(&app, "DELETE", "/memory/s1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        ask(&app, "s1", "hello").await;
        let (status, body) = call(&app, "DELETE", "/memory/s1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (_, memory) = call(&app, "GET", "/memory/s1", None).await;
        assert_eq!(memory, json!([]));
    }

    #[tokio::test]
    async fn test_delete_session_is_idempotent() {
        let app = app(FakeModel::replying("ok"));
        ask(&app, "s1", "hello").await;

        for _ in 0..2 {
            let (status, body) = call(&app, "DELETE", "/sessions/s1", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"success": true}));
        }
        assert!(titles(&app).await.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_listed_in_creation_order() {
        let app = app(FakeModel::replying("ok"));
        let mut ids = Vec::new();
        for _ in 0..3 {
            let (_, session) = call(&app, "POST", "/sessions", None).await;
            ids.push(session["id"].as_str().unwrap().to_string());
        }

        let (_, sessions) = call(&app, "GET", "/sessions", None).await;
        let listed: Vec<&str> = sessions
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap())
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_ask_with_web_context() {
        let model = FakeModel::replying("Answer [Source 1].");
        let sources: Vec<WebSource> = (1..=3)
            .map(|n| WebSource::new(format!("https://s{n}.example"), format!("S{n}"), &"t".repeat(1200)))
            .collect();
        let state = AppState::new(model.clone())
            .with_web_context(Arc::new(FakeWeb(sources)))
            .with_prompt_style(PromptStyle::Messages);
        let app = create_router(state.shared());

        let (status, body) = ask(&app, "s1", "what?").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sources"].as_array().unwrap().len(), 3);
        assert_eq!(body["sources"][0], json!({"link": "https://s1.example", "title": "S1"}));

        let calls = model.calls();
        let question = &calls[0].last().unwrap().content;
        assert_eq!(question.matches("[Source ").count(), 3);
        assert!(question.ends_with("Question: what?"));

        let (_, memory) = call(&app, "GET", "/memory/s1", None).await;
        assert_eq!(memory[0]["content"], "what?");
    }

    #[tokio::test]
    async fn test_ask_with_empty_web_context_uses_sentinel() {
        let model = FakeModel::replying("ok");
        let state = AppState::new(model.clone()).with_web_context(Arc::new(FakeWeb(Vec::new())));
        let app = create_router(state.shared());

        ask(&app, "s1", "anything").await;
        assert!(model.calls()[0][0].content.contains(NO_WEB_CONTEXT));
    }

    #[tokio::test]
    async fn test_mindmap_recovers_wrapped_json() {
        let raw = "Here is the map:\n{'nodes': [{'id': 'Node1', 'label': 'Rust',}], 'edges': [],}\nEnjoy!";
        let model = FakeModel::replying(raw);
        let app = app(model.clone());

        let (status, body) =
            call(&app, "POST", "/generate_mindmap", Some(json!({"prompt": "Rust"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nodes"][0]["label"], "Rust");
        assert_eq!(body["edges"], json!([]));
        assert!(model.calls()[0][0].content.contains("SCENARIO: Rust"));
    }

    #[tokio::test]
    async fn test_mindmap_failure_and_validation() {
        let app = app(FakeModel::replying("Sorry, I can't help with that."));

        let (status, body) =
            call(&app, "POST", "/generate_mindmap", Some(json!({"prompt": "x"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to parse mind map JSON: repaired-relaxed"));

        let (status, body) = call(&app, "POST", "/generate_mindmap", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Prompt is missing");
    }
}

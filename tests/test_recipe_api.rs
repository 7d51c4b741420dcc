use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use recipe_chef::server::cors_layer;
use recipe_chef::{
    generate_recipe, router, ApiError, AppState, CallError, RecipePrompt, RecipeProvider,
    RetryPolicy, RunMode,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Provider that replays scripted outcomes and records every prompt it receives
struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<String, CallError>>>,
    prompts: Mutex<Vec<RecipePrompt>>,
    calls: AtomicU32,
    name_lookups: AtomicU32,
}

impl ScriptedProvider {
    fn new(outcomes: Vec<Result<String, CallError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            name_lookups: AtomicU32::new(0),
        })
    }

    fn always_failing() -> Arc<Self> {
        Self::new((0..3).map(|_| Err(provider_failure())).collect())
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipeProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        "scripted"
    }

    fn model(&self) -> &str {
        "test-model"
    }

    async fn generate(&self, prompt: &RecipePrompt) -> Result<String, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(provider_failure()))
    }
}

fn provider_failure() -> CallError {
    CallError::Status {
        status: 401,
        body: "Invalid credentials in Authorization header".to_string(),
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
    }
}

fn app(provider: Arc<ScriptedProvider>, mode: RunMode) -> Router {
    let state = AppState::new(provider, fast_retry(), mode);
    let cors = cors_layer(&["http://localhost:5173".to_string()]).unwrap();
    router(state, cors)
}

async fn post_recipe(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/recipe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_recipe_success() {
    let provider = ScriptedProvider::new(vec![Ok("# Omelette\n...".to_string())]);
    let (status, body) = post_recipe(
        app(provider.clone(), RunMode::Production),
        r#"{"ingredients": ["eggs", "flour", "milk"]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "recipe": "# Omelette\n..." }));
    assert_eq!(provider.calls(), 1);
    // Generation logs name the provider
    assert!(provider.name_lookups.load(Ordering::SeqCst) > 0);

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts[0].system, "You are a professional chef.");
    assert!(prompts[0].user.contains("Ingredients: eggs, flour, milk"));
}

#[tokio::test]
async fn test_invalid_ingredients_never_call_provider() {
    let bodies = [
        r#"{}"#,
        r#"{"ingredients": []}"#,
        r#"{"ingredients": null}"#,
        r#"{"ingredients": "eggs"}"#,
        r#"{"ingredients": [1, 2]}"#,
        r#"{"ingredients": ["eggs", "  "]}"#,
        r#"not json"#,
    ];

    for body in bodies {
        let provider = ScriptedProvider::new(vec![Ok("unused".to_string())]);
        let (status, json) = post_recipe(app(provider.clone(), RunMode::Production), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json, json!({ "error": "Please provide valid ingredients" }));
        assert_eq!(provider.calls(), 0, "body: {}", body);
    }

    let provider = ScriptedProvider::new(vec![Ok("unused".to_string())]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/recipe")
        .body(Body::from(r#"{"ingredients": ["eggs"]}"#))
        .unwrap();
    let response = app(provider.clone(), RunMode::Production)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, json!({ "error": "Please provide valid ingredients" }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_exhausted_retries_hide_details_in_production() {
    let provider = ScriptedProvider::always_failing();
    let (status, body) = post_recipe(
        app(provider.clone(), RunMode::Production),
        r#"{"ingredients": ["rice"]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "error": "Failed to generate recipe",
            "message": "The AI service is temporarily unavailable. Please try again."
        })
    );
    assert!(!body.to_string().contains("Invalid credentials"));
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_exhausted_retries_show_details_in_development() {
    let provider = ScriptedProvider::always_failing();
    let (status, body) = post_recipe(
        app(provider, RunMode::Development),
        r#"{"ingredients": ["rice"]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("Invalid credentials"));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let provider = ScriptedProvider::new(vec![
        Err(provider_failure()),
        Err(CallError::MalformedResponse("empty choices".to_string())),
        Ok("# Risotto".to_string()),
    ]);
    let state = AppState::new(provider.clone(), fast_retry(), RunMode::Production);

    let response = generate_recipe(&state, Some(vec!["rice".to_string()]))
        .await
        .unwrap();

    assert_eq!(response.recipe, "# Risotto");
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_generate_recipe_validation_error() {
    let provider = ScriptedProvider::new(Vec::new());
    let state = AppState::new(provider.clone(), fast_retry(), RunMode::Production);

    let result = generate_recipe(&state, None).await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_health() {
    let provider = ScriptedProvider::new(Vec::new());
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let response = app(provider, RunMode::Production)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok", "model": "test-model" }));
}

#[tokio::test]
async fn test_cors_allows_listed_origin_only() {
    let provider = ScriptedProvider::new(Vec::new());
    let app = app(provider, RunMode::Production);

    let allowed = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let denied = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(denied).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

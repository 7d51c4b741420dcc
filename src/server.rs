//! HTTP surface: recipe generation and health endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, info};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{AppConfig, RunMode};
use crate::error::{ApiError, StartupError};
use crate::model::{HealthResponse, IngredientList, RecipeRequest, RecipeResponse};
use crate::providers::{HuggingFaceProvider, RecipePrompt, RecipeProvider};
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Everything a request handler needs, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn RecipeProvider>,
    pub retry: RetryPolicy,
    pub mode: RunMode,
}

impl AppState {
    pub fn new(provider: Arc<dyn RecipeProvider>, retry: RetryPolicy, mode: RunMode) -> Self {
        Self {
            provider,
            retry,
            mode,
        }
    }
}

/// Validate the ingredients and generate a recipe, retrying failed calls.
///
/// Validation failures return before the provider is called.
pub async fn generate_recipe(
    state: &AppState,
    ingredients: Option<Vec<String>>,
) -> Result<RecipeResponse, ApiError> {
    let ingredients = IngredientList::parse(ingredients)?;
    let provider = state.provider.as_ref();
    let provider_name = provider.provider_name();
    info!(
        "Generating recipe with {} for: {}",
        provider_name,
        ingredients.joined()
    );

    let prompt = RecipePrompt::from_ingredients(&ingredients);

    match retry_with_backoff(&state.retry, |_| provider.generate(&prompt)).await {
        Ok(recipe) => {
            info!("Recipe generated successfully using {}", provider_name);
            Ok(RecipeResponse { recipe })
        }
        Err(e) => {
            error!("Recipe generation with {} failed: {}", provider_name, e);
            Err(ApiError::service_unavailable(&e, state.mode))
        }
    }
}

async fn recipe_handler(
    State(state): State<AppState>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected recipe request body: {}", rejection);
            return Err(ApiError::invalid_ingredients());
        }
    };

    generate_recipe(&state, request.ingredients).await.map(Json)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.provider.model()))
}

/// Build the application router
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/recipe", post(recipe_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Configure CORS for the browser frontend.
///
/// Only the listed origins receive CORS headers. Requests without an Origin
/// header (curl, server-to-server) are served as usual.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, StartupError> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| StartupError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Build the state from configuration and serve until Ctrl-C
pub async fn serve(config: AppConfig) -> Result<(), StartupError> {
    let token = config.access_token()?;
    let provider = HuggingFaceProvider::new(&config.provider, token)?;
    let state = AppState::new(
        Arc::new(provider),
        RetryPolicy::from(&config.retry),
        config.mode,
    );
    let cors = cors_layer(&config.server.origins())?;

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("AI backend running on port {}", config.server.port);
    info!("Using model: {}", config.provider.model);
    if config.mode == RunMode::Development {
        info!("Development mode: error details are included in responses");
    }

    axum::serve(listener, router(state, cors))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

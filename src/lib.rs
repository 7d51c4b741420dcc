//! Recipe generation service.
//!
//! Accepts a list of ingredients over HTTP, asks a hosted chat-completion
//! model for a recipe, and returns the markdown it writes. Failed model calls
//! are retried with exponential backoff before the client sees an error.

pub mod config;
pub mod error;
pub mod model;
pub mod providers;
pub mod retry;
pub mod server;

pub use crate::config::{AppConfig, RunMode};
pub use crate::error::{ApiError, CallError, StartupError};
pub use crate::model::{IngredientList, RecipeRequest, RecipeResponse};
pub use crate::providers::{HuggingFaceProvider, RecipePrompt, RecipeProvider};
pub use crate::retry::{retry_with_backoff, RetryPolicy, RetryState};
pub use crate::server::{generate_recipe, router, AppState};

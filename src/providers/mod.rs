mod hugging_face;
mod prompt;

pub use hugging_face::HuggingFaceProvider;
pub use prompt::{RecipePrompt, CHEF_SYSTEM_PROMPT};

use async_trait::async_trait;

use crate::error::CallError;

/// A chat-completion service able to write a recipe
#[async_trait]
pub trait RecipeProvider: Send + Sync {
    /// Get the provider name (e.g., "huggingface")
    fn provider_name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Perform one chat-completion call and return the generated markdown
    async fn generate(&self, prompt: &RecipePrompt) -> Result<String, CallError>;
}

use crate::model::IngredientList;

/// System message sent with every recipe request
pub const CHEF_SYSTEM_PROMPT: &str = "You are a professional chef.";

const RECIPE_INSTRUCTIONS: &str = "Generate a detailed recipe with:
1. Creative recipe title
2. Complete ingredients list with quantities
3. Step-by-step cooking instructions
4. Professional cooking tips

Format in clean Markdown.";

/// The system and user messages for one recipe request
#[derive(Debug, Clone, PartialEq)]
pub struct RecipePrompt {
    pub system: String,
    pub user: String,
}

impl RecipePrompt {
    pub fn from_ingredients(ingredients: &IngredientList) -> Self {
        Self {
            system: CHEF_SYSTEM_PROMPT.to_string(),
            user: format!(
                "Ingredients: {}\n\n{}",
                ingredients.joined(),
                RECIPE_INSTRUCTIONS
            ),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Body of `POST /api/recipe`
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct RecipeRequest {
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RecipeResponse {
    /// Markdown recipe, relayed verbatim from the model
    pub recipe: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

impl HealthResponse {
    pub fn ok(model: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            model: model.into(),
        }
    }
}

/// JSON error shape shared by every failing response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A validated, non-empty list of trimmed ingredient names.
///
/// Order and duplicates are kept as the client sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientList(Vec<String>);

impl IngredientList {
    pub fn parse(ingredients: Option<Vec<String>>) -> Result<Self, ApiError> {
        let items = ingredients.ok_or_else(ApiError::invalid_ingredients)?;
        if items.is_empty() {
            return Err(ApiError::invalid_ingredients());
        }

        let trimmed = items
            .into_iter()
            .map(|item| {
                let item = item.trim();
                if item.is_empty() {
                    Err(ApiError::invalid_ingredients())
                } else {
                    Ok(item.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(IngredientList(trimmed))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_parse_trims_and_keeps_order() {
        let parsed = IngredientList::parse(list(&["  eggs", "flour ", "eggs"])).unwrap();
        assert_eq!(parsed.as_slice(), &["eggs", "flour", "eggs"]);
        assert_eq!(parsed.joined(), "eggs, flour, eggs");
    }

    #[test]
    fn test_parse_rejects_missing_and_empty() {
        assert!(matches!(
            IngredientList::parse(None),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            IngredientList::parse(Some(Vec::new())),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_rejects_blank_entry() {
        let result = IngredientList::parse(list(&["eggs", "   "]));
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_error_body_omits_empty_fields() {
        let body = ErrorBody {
            error: "Please provide valid ingredients".to_string(),
            message: None,
            details: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "error": "Please provide valid ingredients" })
        );
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Recipe;

/// A requested ingredient line. On create `id` is an ingredient id; on update it
/// may also be the id of one of the recipe's existing lines.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    /// Base64 image, optionally as a `data:image/<ext>;base64,` URI.
    pub image: String,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct RecipeList {
    #[schema(value_type = Vec<Recipe>)]
    pub items: Vec<Recipe>,
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Ingredient, Tag};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TagList {
    #[schema(value_type = Vec<Tag>)]
    pub items: Vec<Tag>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct IngredientList {
    #[schema(value_type = Vec<Ingredient>)]
    pub items: Vec<Ingredient>,
}

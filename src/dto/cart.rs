use serde::Serialize;
use utoipa::ToSchema;

/// One aggregated row of the shopping list.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct ShoppingListEntry {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Ingredient line of a recipe sitting in the cart, before aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

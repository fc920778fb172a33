use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
pub struct Pagination {
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    /// Returns `(page, per_page, offset)`. The offset saturates instead of
    /// overflowing on absurd page numbers.
    pub fn normalize(&self, default_per_page: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(default_per_page)
            .clamp(1, MAX_PER_PAGE);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

/// Parses `true`/`false`/`1`/`0` query flags; anything else means "not set".
pub fn parse_flag(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
pub struct RecipeQuery {
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub per_page: Option<i64>,
    pub author: Option<Uuid>,
    /// Comma separated tag slugs; a recipe matches if it carries any of them.
    pub tags: Option<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

impl RecipeQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }

    pub fn tag_slugs(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema, IntoParams)]
pub struct SubscriptionQuery {
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub per_page: Option<i64>,
    /// Maximum number of recipes listed per author.
    pub recipes_limit: Option<i64>,
}

impl SubscriptionQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Author;

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SubscriptionList {
    #[schema(value_type = Vec<Author>)]
    pub items: Vec<Author>,
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::reference::{CreateIngredientRequest, IngredientList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Ingredient,
    response::ApiResponse,
    routes::params::IngredientQuery,
    services::reference_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients).post(create_ingredient))
        .route("/{id}", get(get_ingredient))
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(IngredientQuery),
    responses(
        (status = 200, description = "List ingredients, optionally by name prefix", body = ApiResponse<IngredientList>)
    ),
    tag = "Ingredients"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<ApiResponse<IngredientList>>> {
    Ok(Json(reference_service::list_ingredients(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(("id" = i64, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Get ingredient", body = ApiResponse<Ingredient>),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "Ingredients"
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Ingredient>>> {
    Ok(Json(reference_service::get_ingredient(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Create ingredient", body = ApiResponse<Ingredient>),
        (status = 400, description = "Invalid or duplicate ingredient"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Ingredients"
)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateIngredientRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Ingredient>>)> {
    let resp = reference_service::create_ingredient(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    dto::recipes::{CreateRecipeRequest, RecipeList, UpdateRecipeRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Recipe,
    response::{ApiResponse, StatusMessage},
    routes::params::RecipeQuery,
    services::{cart_service, favorite_service, recipe_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route(
            "/{id}",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route("/{id}/favorite", post(add_favorite).delete(remove_favorite))
        .route(
            "/{id}/shopping_cart",
            post(add_to_shopping_cart).delete(remove_from_shopping_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(RecipeQuery),
    responses(
        (status = 200, description = "List recipes, newest first", body = ApiResponse<RecipeList>)
    ),
    tag = "Recipes"
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<ApiResponse<RecipeList>>> {
    let resp = recipe_service::list_recipes(&state, viewer.as_ref(), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Get recipe", body = ApiResponse<Recipe>),
        (status = 404, description = "Recipe not found")
    ),
    tag = "Recipes"
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Recipe>>> {
    let resp = recipe_service::get_recipe(&state, viewer.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Create recipe", body = ApiResponse<Recipe>),
        (status = 400, description = "Invalid recipe"),
        (status = 404, description = "Unknown tag or ingredient")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Recipe>>)> {
    let resp = recipe_service::create_recipe(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Update recipe", body = ApiResponse<Recipe>),
        (status = 400, description = "Invalid recipe"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe, tag or ingredient not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> AppResult<Json<ApiResponse<Recipe>>> {
    let resp = recipe_service::update_recipe(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    recipe_service::delete_recipe(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to favorites", body = StatusMessage),
        (status = 400, description = "Already in favorites"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<StatusMessage>)> {
    let status = favorite_service::add_favorite(&state, &user, id).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from favorites", body = StatusMessage),
        (status = 400, description = "Not in favorites"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<StatusMessage>)> {
    let status = favorite_service::remove_favorite(&state, &user, id).await?;
    Ok((StatusCode::NO_CONTENT, Json(status)))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to shopping cart", body = StatusMessage),
        (status = 400, description = "Already in the shopping cart"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn add_to_shopping_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<StatusMessage>)> {
    let status = cart_service::add_to_cart(&state, &user, id).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from shopping cart", body = StatusMessage),
        (status = 400, description = "Not in the shopping cart"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn remove_from_shopping_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<StatusMessage>)> {
    let status = cart_service::remove_from_cart(&state, &user, id).await?;
    Ok((StatusCode::NO_CONTENT, Json(status)))
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Shopping list as PDF; the cart is emptied", body = Vec<u8>, content_type = "application/pdf"),
        (status = 400, description = "Shopping cart is empty")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let document = cart_service::export_shopping_list(&state, &user).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        cart_service::SHOPPING_LIST_FILENAME
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    ))
}

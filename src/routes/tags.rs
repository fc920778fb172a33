use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::reference::{CreateTagRequest, TagList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Tag,
    response::ApiResponse,
    services::reference_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{id}", get(get_tag))
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "List tags", body = ApiResponse<TagList>)
    ),
    tag = "Tags"
)]
pub async fn list_tags(State(state): State<AppState>) -> AppResult<Json<ApiResponse<TagList>>> {
    Ok(Json(reference_service::list_tags(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Get tag", body = ApiResponse<Tag>),
        (status = 404, description = "Tag not found")
    ),
    tag = "Tags"
)]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Tag>>> {
    Ok(Json(reference_service::get_tag(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Create tag", body = ApiResponse<Tag>),
        (status = 400, description = "Invalid or duplicate tag"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
pub async fn create_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTagRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Tag>>)> {
    let resp = reference_service::create_tag(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        subscriptions::SubscriptionList,
        users::{RegisterRequest, SetPasswordRequest, UpdateMeRequest, UserList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, StatusMessage},
    routes::params::{Pagination, SubscriptionQuery},
    services::{auth_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(register))
        .route("/me", get(me).patch(update_me))
        .route("/set_password", post(set_password))
        .route("/subscriptions", get(subscriptions))
        .route("/{id}", get(get_user))
        .route("/{id}/subscribe", post(subscribe).delete(unsubscribe))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<User>),
        (status = 400, description = "Invalid or duplicate credentials")
    ),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(Pagination),
    responses(
        (status = 200, description = "List users", body = ApiResponse<UserList>)
    ),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&state, viewer.as_ref(), pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Get user", body = ApiResponse<User>),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_user(&state, viewer.as_ref(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(user_service::me(&state, &user).await?))
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Update current user", body = ApiResponse<User>),
        (status = 400, description = "Invalid or duplicate fields")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateMeRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(user_service::update_me(&state, &user, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/users/set_password",
    request_body = SetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = StatusMessage),
        (status = 400, description = "Wrong current password or weak new password")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn set_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SetPasswordRequest>,
) -> AppResult<Json<StatusMessage>> {
    Ok(Json(user_service::set_password(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    params(SubscriptionQuery),
    responses(
        (status = 200, description = "Authors the caller is subscribed to", body = ApiResponse<SubscriptionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SubscriptionQuery>,
) -> AppResult<Json<ApiResponse<SubscriptionList>>> {
    Ok(Json(user_service::list_subscriptions(&state, &user, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 201, description = "Subscribed", body = StatusMessage),
        (status = 400, description = "Already subscribed or self-subscription"),
        (status = 404, description = "Author not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<StatusMessage>)> {
    let status = user_service::subscribe(&state, &user, id).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Unsubscribed", body = StatusMessage),
        (status = 400, description = "Not subscribed"),
        (status = 404, description = "Author not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<StatusMessage>)> {
    let status = user_service::unsubscribe(&state, &user, id).await?;
    Ok((StatusCode::NO_CONTENT, Json(status)))
}

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        subscriptions::SubscriptionList,
        users::{SetPasswordRequest, UpdateMeRequest, UserList},
    },
    entity::{
        subscriptions::{ActiveModel as SubscriptionActive, Column as SubCol, Entity as Subscriptions},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Author, RecipeShort, User},
    response::{ApiResponse, Meta, StatusMessage},
    routes::params::{Pagination, SubscriptionQuery},
    services::{
        auth_service::{ensure_identity_free, hash_password, validate_password, verify_password},
        media::image_url,
        toggle::{self, ToggleAction},
    },
    state::AppState,
};

/// Authors among `author_ids` that `viewer` is subscribed to.
pub async fn subscribed_authors<C: ConnectionTrait>(
    db: &C,
    viewer: Option<Uuid>,
    author_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids = Subscriptions::find()
        .select_only()
        .column(SubCol::AuthorId)
        .filter(SubCol::SubscriberId.eq(viewer))
        .filter(SubCol::AuthorId.is_in(author_ids.to_vec()))
        .into_tuple::<Uuid>()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn list_users(
    state: &AppState,
    viewer: Option<&AuthUser>,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = pagination.normalize(state.config.page_size);
    let finder = Users::find().order_by_asc(UserCol::Username);
    let total = finder.clone().count(&state.orm).await? as i64;

    let users = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let subscribed = subscribed_authors(&state.orm, viewer.map(|v| v.user_id), &ids).await?;

    let items = users
        .into_iter()
        .map(|user| {
            let is_subscribed = subscribed.contains(&user.id);
            User::from_entity(user, is_subscribed)
        })
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_user(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    let user = find_user(state, id).await?;
    let subscribed = subscribed_authors(&state.orm, viewer.map(|v| v.user_id), &[user.id]).await?;
    let is_subscribed = subscribed.contains(&user.id);
    Ok(ApiResponse::success("User", User::from_entity(user, is_subscribed), None))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = find_user(state, user.user_id).await?;
    Ok(ApiResponse::success("User", User::from_entity(model, false), None))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateMeRequest,
) -> AppResult<ApiResponse<User>> {
    let model = find_user(state, user.user_id).await?;
    let mut active: crate::entity::users::ActiveModel = model.clone().into();

    if let Some(email) = payload.email.map(|e| e.trim().to_lowercase()) {
        if !email.contains('@') {
            return Err(AppError::Validation("Enter a valid email address".into()));
        }
        ensure_identity_free(state, Some(&email), None, Some(user.user_id)).await?;
        active.email = Set(email);
    }
    if let Some(username) = payload.username.map(|u| u.trim().to_string()) {
        if username.is_empty() {
            return Err(AppError::Validation("Username cannot be empty".into()));
        }
        ensure_identity_free(state, None, Some(&username), Some(user.user_id)).await?;
        active.username = Set(username);
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name.trim().to_string());
    }

    let updated = if active.is_changed() {
        active
            .update(&state.orm)
            .await
            .map_err(|err| AppError::on_unique_violation(err, "Email or username is already taken"))?
    } else {
        model
    };

    Ok(ApiResponse::success("Updated", User::from_entity(updated, false), Some(Meta::empty())))
}

pub async fn set_password(
    state: &AppState,
    user: &AuthUser,
    payload: SetPasswordRequest,
) -> AppResult<StatusMessage> {
    let model = find_user(state, user.user_id).await?;
    if !verify_password(&payload.current_password, &model.password_hash)? {
        return Err(AppError::Validation("Current password is incorrect".into()));
    }
    validate_password(&payload.new_password)?;

    let mut active: crate::entity::users::ActiveModel = model.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "password_change",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(StatusMessage::new("Password changed"))
}

pub async fn subscribe(
    state: &AppState,
    user: &AuthUser,
    author_id: Uuid,
) -> AppResult<StatusMessage> {
    toggle_subscription(state, user, author_id, ToggleAction::Add).await
}

pub async fn unsubscribe(
    state: &AppState,
    user: &AuthUser,
    author_id: Uuid,
) -> AppResult<StatusMessage> {
    toggle_subscription(state, user, author_id, ToggleAction::Remove).await
}

async fn toggle_subscription(
    state: &AppState,
    user: &AuthUser,
    author_id: Uuid,
    action: ToggleAction,
) -> AppResult<StatusMessage> {
    if action == ToggleAction::Add && author_id == user.user_id {
        return Err(AppError::Validation("You cannot subscribe to yourself".into()));
    }
    find_user(state, author_id).await?;

    let existing = Subscriptions::find()
        .filter(SubCol::AuthorId.eq(author_id))
        .filter(SubCol::SubscriberId.eq(user.user_id))
        .one(&state.orm)
        .await?;

    let message = toggle::check_transition(action, existing.is_some(), &toggle::SUBSCRIPTION)?;

    match existing {
        None => {
            SubscriptionActive {
                id: NotSet,
                author_id: Set(author_id),
                subscriber_id: Set(user.user_id),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await
            .map_err(|err| {
                AppError::on_unique_violation(err, toggle::SUBSCRIPTION.already_present)
            })?;
        }
        Some(row) => {
            Subscriptions::delete_by_id(row.id).exec(&state.orm).await?;
        }
    }

    audit::record(
        &state.pool,
        user.user_id,
        match action {
            ToggleAction::Add => "subscribe",
            ToggleAction::Remove => "unsubscribe",
        },
        "subscriptions",
        serde_json::json!({ "author_id": author_id }),
    )
    .await;

    Ok(StatusMessage::new(message))
}

#[derive(FromRow)]
struct AuthorRow {
    id: Uuid,
    email: String,
    username: String,
    first_name: String,
    last_name: String,
}

#[derive(FromRow)]
struct AuthorRecipeRow {
    id: i64,
    author_id: Uuid,
    name: String,
    image: String,
    cooking_time: i32,
}

pub async fn list_subscriptions(
    state: &AppState,
    user: &AuthUser,
    query: SubscriptionQuery,
) -> AppResult<ApiResponse<SubscriptionList>> {
    let (page, limit, offset) = query.pagination().normalize(state.config.page_size);

    let authors = sqlx::query_as::<_, AuthorRow>(
        r#"
        SELECT u.id, u.email, u.username, u.first_name, u.last_name
        FROM subscriptions s
        JOIN users u ON u.id = s.author_id
        WHERE s.subscriber_id = $1
        ORDER BY s.created_at DESC, s.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;

    let author_ids: Vec<Uuid> = authors.iter().map(|a| a.id).collect();
    let recipes = sqlx::query_as::<_, AuthorRecipeRow>(
        r#"
        SELECT id, author_id, name, image, cooking_time
        FROM recipes
        WHERE author_id = ANY($1)
        ORDER BY id DESC
        "#,
    )
    .bind(author_ids.as_slice())
    .fetch_all(&state.pool)
    .await?;

    let recipes_limit = query.recipes_limit.filter(|l| *l >= 0).map(|l| l as usize);
    let mut by_author: HashMap<Uuid, Vec<RecipeShort>> = HashMap::new();
    let mut counts: HashMap<Uuid, i64> = HashMap::new();
    for row in recipes {
        *counts.entry(row.author_id).or_default() += 1;
        let list = by_author.entry(row.author_id).or_default();
        if recipes_limit.is_none_or(|limit| list.len() < limit) {
            list.push(RecipeShort {
                id: row.id,
                name: row.name,
                image: image_url(&row.image),
                cooking_time: row.cooking_time,
            });
        }
    }

    let items = authors
        .into_iter()
        .map(|row| Author {
            recipes: by_author.remove(&row.id).unwrap_or_default(),
            recipes_count: counts.get(&row.id).copied().unwrap_or(0),
            user: User {
                id: row.id,
                email: row.email,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                is_subscribed: true,
            },
        })
        .collect();

    Ok(ApiResponse::success(
        "Subscriptions",
        SubscriptionList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

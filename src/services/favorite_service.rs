use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;

use crate::{
    audit,
    entity::favorites::{ActiveModel as FavoriteActive, Column as FavCol, Entity as Favorites},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::StatusMessage,
    services::{
        recipe_service::ensure_recipe_exists,
        toggle::{self, ToggleAction},
    },
    state::AppState,
};

pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    recipe_id: i64,
) -> AppResult<StatusMessage> {
    toggle_favorite(state, user, recipe_id, ToggleAction::Add).await
}

pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    recipe_id: i64,
) -> AppResult<StatusMessage> {
    toggle_favorite(state, user, recipe_id, ToggleAction::Remove).await
}

async fn toggle_favorite(
    state: &AppState,
    user: &AuthUser,
    recipe_id: i64,
    action: ToggleAction,
) -> AppResult<StatusMessage> {
    ensure_recipe_exists(&state.orm, recipe_id).await?;

    let existing = Favorites::find()
        .filter(FavCol::UserId.eq(user.user_id))
        .filter(FavCol::RecipeId.eq(recipe_id))
        .one(&state.orm)
        .await?;

    let message = toggle::check_transition(action, existing.is_some(), &toggle::FAVORITE)?;

    match existing {
        None => {
            FavoriteActive {
                id: NotSet,
                user_id: Set(user.user_id),
                recipe_id: Set(recipe_id),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await
            // a concurrent add may win the race; report it as a repeated add
            .map_err(|err| AppError::on_unique_violation(err, toggle::FAVORITE.already_present))?;
        }
        Some(row) => {
            Favorites::delete_by_id(row.id).exec(&state.orm).await?;
        }
    }

    audit::record(
        &state.pool,
        user.user_id,
        match action {
            ToggleAction::Add => "favorite_add",
            ToggleAction::Remove => "favorite_remove",
        },
        "favorites",
        serde_json::json!({ "recipe_id": recipe_id }),
    )
    .await;

    Ok(StatusMessage::new(message))
}

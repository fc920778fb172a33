use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;

use crate::{
    audit,
    dto::cart::{CartLine, ShoppingListEntry},
    entity::{
        cart_entries::{ActiveModel as CartActive, Column as CartCol, Entity as CartEntries},
        ingredients::{Column as IngredientCol, Entity as Ingredients},
        recipe_ingredients::{Column as LineCol, Entity as RecipeIngredients},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    pdf,
    response::StatusMessage,
    services::{
        recipe_service::ensure_recipe_exists,
        shopping_list,
        toggle::{self, ToggleAction},
    },
    state::AppState,
};

pub const SHOPPING_LIST_TITLE: &str = "Shopping list";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.pdf";

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    recipe_id: i64,
) -> AppResult<StatusMessage> {
    toggle_cart(state, user, recipe_id, ToggleAction::Add).await
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    recipe_id: i64,
) -> AppResult<StatusMessage> {
    toggle_cart(state, user, recipe_id, ToggleAction::Remove).await
}

async fn toggle_cart(
    state: &AppState,
    user: &AuthUser,
    recipe_id: i64,
    action: ToggleAction,
) -> AppResult<StatusMessage> {
    ensure_recipe_exists(&state.orm, recipe_id).await?;

    let existing = CartEntries::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::RecipeId.eq(recipe_id))
        .one(&state.orm)
        .await?;

    let message = toggle::check_transition(action, existing.is_some(), &toggle::SHOPPING_CART)?;

    match existing {
        None => {
            CartActive {
                id: NotSet,
                user_id: Set(user.user_id),
                recipe_id: Set(recipe_id),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await
            .map_err(|err| {
                AppError::on_unique_violation(err, toggle::SHOPPING_CART.already_present)
            })?;
        }
        Some(row) => {
            CartEntries::delete_by_id(row.id).exec(&state.orm).await?;
        }
    }

    audit::record(
        &state.pool,
        user.user_id,
        match action {
            ToggleAction::Add => "cart_add",
            ToggleAction::Remove => "cart_remove",
        },
        "cart_entries",
        serde_json::json!({ "recipe_id": recipe_id }),
    )
    .await;

    Ok(StatusMessage::new(message))
}

/// Aggregates every ingredient of every recipe in the cart, renders the
/// shopping list as PDF and empties the cart.
///
/// Reading the cart, reading the lines and clearing the cart share one
/// transaction, so a failure leaves the cart intact.
pub async fn export_shopping_list(state: &AppState, user: &AuthUser) -> AppResult<Vec<u8>> {
    let txn = state.orm.begin().await?;

    let recipe_ids: Vec<i64> = CartEntries::find()
        .select_only()
        .column(CartCol::RecipeId)
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::Id)
        .into_tuple::<i64>()
        .all(&txn)
        .await?;
    if recipe_ids.is_empty() {
        return Err(AppError::BadRequest("Shopping cart is empty".into()));
    }

    let lines = RecipeIngredients::find()
        .filter(LineCol::RecipeId.is_in(recipe_ids.clone()))
        .order_by_asc(LineCol::Id)
        .all(&txn)
        .await?;
    let ingredient_ids: Vec<i64> = lines.iter().map(|line| line.ingredient_id).collect();
    let ingredients: HashMap<i64, _> = Ingredients::find()
        .filter(IngredientCol::Id.is_in(ingredient_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|ingredient| (ingredient.id, ingredient))
        .collect();

    let cart_lines = lines.into_iter().filter_map(|line| {
        ingredients.get(&line.ingredient_id).map(|ingredient| CartLine {
            name: ingredient.name.clone(),
            measurement_unit: ingredient.measurement_unit.clone(),
            amount: line.amount,
        })
    });
    let entries: Vec<ShoppingListEntry> = shopping_list::aggregate(cart_lines);
    let rendered: Vec<String> = entries.iter().map(shopping_list::format_entry).collect();
    let document = pdf::render_text_document(SHOPPING_LIST_TITLE, &rendered);

    let cleared = CartEntries::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        recipes = recipe_ids.len(),
        entries = entries.len(),
        cleared = cleared.rows_affected,
        "shopping list exported"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "shopping_list_export",
        "cart_entries",
        serde_json::json!({ "recipe_ids": recipe_ids, "entries": entries.len() }),
    )
    .await;

    Ok(document)
}

use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sea_orm::ActiveValue::NotSet;

use crate::{
    audit,
    dto::reference::{CreateIngredientRequest, CreateTagRequest, IngredientList, TagList},
    entity::{
        ingredients::{ActiveModel as IngredientActive, Column as IngredientCol, Entity as Ingredients},
        tags::{ActiveModel as TagActive, Column as TagCol, Entity as Tags},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Ingredient, Tag},
    response::{ApiResponse, Meta},
    routes::params::IngredientQuery,
    state::AppState,
};

const SLUG_MAX_LEN: usize = 50;

/// Lowercases the name and joins its alphanumeric runs with `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for word in name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.extend(word.chars().flat_map(char::to_lowercase));
    }
    slug.chars().take(SLUG_MAX_LEN).collect::<String>().trim_end_matches('-').to_string()
}

pub fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub async fn list_tags(state: &AppState) -> AppResult<ApiResponse<TagList>> {
    let items = Tags::find()
        .order_by_asc(TagCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Tag::from)
        .collect();
    Ok(ApiResponse::success("Tags", TagList { items }, None))
}

pub async fn get_tag(state: &AppState, id: i64) -> AppResult<ApiResponse<Tag>> {
    let tag = Tags::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Tag"))?;
    Ok(ApiResponse::success("Tag", Tag::from(tag), None))
}

pub async fn create_tag(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTagRequest,
) -> AppResult<ApiResponse<Tag>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(AppError::Validation("Tag name must contain letters or digits".into()));
    }
    let color = payload.color.trim().to_ascii_uppercase();
    if !is_hex_color(&color) {
        return Err(AppError::Validation("Color must look like #RRGGBB".into()));
    }

    let tag = TagActive {
        id: NotSet,
        name: Set(name),
        color: Set(color),
        slug: Set(slug),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::on_unique_violation(err, "Tag with this name already exists"))?;

    audit::record(
        &state.pool,
        user.user_id,
        "tag_create",
        "tags",
        serde_json::json!({ "tag_id": tag.id }),
    )
    .await;

    Ok(ApiResponse::success("Tag created", Tag::from(tag), Some(Meta::empty())))
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub async fn list_ingredients(
    state: &AppState,
    query: IngredientQuery,
) -> AppResult<ApiResponse<IngredientList>> {
    let mut finder = Ingredients::find();
    if let Some(prefix) = query.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("{}%", escape_like(prefix));
        finder = finder.filter(Expr::col(IngredientCol::Name).ilike(pattern));
    }

    let items = finder
        .order_by_asc(IngredientCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Ingredient::from)
        .collect();
    Ok(ApiResponse::success("Ingredients", IngredientList { items }, None))
}

pub async fn get_ingredient(state: &AppState, id: i64) -> AppResult<ApiResponse<Ingredient>> {
    let ingredient = Ingredients::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Ingredient"))?;
    Ok(ApiResponse::success("Ingredient", Ingredient::from(ingredient), None))
}

pub async fn create_ingredient(
    state: &AppState,
    user: &AuthUser,
    payload: CreateIngredientRequest,
) -> AppResult<ApiResponse<Ingredient>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    let unit = payload.measurement_unit.trim().to_string();
    if name.is_empty() || unit.is_empty() {
        return Err(AppError::Validation(
            "Ingredient name and measurement unit are required".into(),
        ));
    }

    let ingredient = IngredientActive {
        id: NotSet,
        name: Set(name),
        measurement_unit: Set(unit),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::on_unique_violation(err, "Ingredient with this name already exists"))?;

    audit::record(
        &state.pool,
        user.user_id,
        "ingredient_create",
        "ingredients",
        serde_json::json!({ "ingredient_id": ingredient.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Ingredient created",
        Ingredient::from(ingredient),
        Some(Meta::empty()),
    ))
}

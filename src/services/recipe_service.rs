use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::recipes::{CreateRecipeRequest, RecipeList, UpdateRecipeRequest},
    entity::{
        cart_entries::{Column as CartCol, Entity as CartEntries},
        favorites::{Column as FavCol, Entity as Favorites},
        ingredients::{Column as IngredientCol, Entity as Ingredients},
        recipe_ingredients::{
            ActiveModel as LineActive, Column as LineCol, Entity as RecipeIngredients,
        },
        recipe_tags::{ActiveModel as RecipeTagActive, Column as RecipeTagCol, Entity as RecipeTags},
        recipes::{ActiveModel as RecipeActive, Column as RecipeCol, Entity as Recipes, Model as RecipeModel},
        tags::{Column as TagCol, Entity as Tags},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{IngredientLine, Recipe, Tag, User},
    response::{ApiResponse, Meta},
    routes::params::{RecipeQuery, parse_flag},
    services::{
        media::{self, DecodedImage},
        reconcile::{self, ExistingLine, LinePlan, NewLine, TagDiff},
        user_service::subscribed_authors,
    },
    state::AppState,
};

pub const NAME_MAX_LEN: usize = 200;

fn validate_name(name: &str) -> AppResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Recipe name is required".into()));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(AppError::Validation(format!(
            "Recipe name must be at most {NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_cooking_time(cooking_time: i32) -> AppResult<()> {
    if cooking_time < 1 {
        return Err(AppError::Validation("Cooking time must be at least 1 minute".into()));
    }
    Ok(())
}

async fn ensure_tags_exist<C: ConnectionTrait>(db: &C, ids: &[i64]) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found: HashSet<i64> = Tags::find()
        .select_only()
        .column(TagCol::Id)
        .filter(TagCol::Id.is_in(ids.to_vec()))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(AppError::not_found(format!("Tag {missing}"))),
        None => Ok(()),
    }
}

async fn ensure_ingredients_exist<C: ConnectionTrait>(db: &C, ids: &[i64]) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found: HashSet<i64> = Ingredients::find()
        .select_only()
        .column(IngredientCol::Id)
        .filter(IngredientCol::Id.is_in(ids.to_vec()))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(AppError::not_found(format!("Ingredient {missing}"))),
        None => Ok(()),
    }
}

async fn attach_tags(txn: &DatabaseTransaction, recipe_id: i64, tag_ids: &[i64]) -> AppResult<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let rows = tag_ids.iter().map(|tag_id| RecipeTagActive {
        id: NotSet,
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
    });
    RecipeTags::insert_many(rows).exec(txn).await?;
    Ok(())
}

async fn insert_lines(txn: &DatabaseTransaction, recipe_id: i64, lines: &[NewLine]) -> AppResult<()> {
    if lines.is_empty() {
        return Ok(());
    }
    let rows = lines.iter().map(|line| LineActive {
        id: NotSet,
        recipe_id: Set(recipe_id),
        ingredient_id: Set(line.ingredient_id),
        amount: Set(line.amount),
    });
    RecipeIngredients::insert_many(rows)
        .exec(txn)
        .await
        .map_err(|err| AppError::on_unique_violation(err, "Duplicate ingredient in recipe"))?;
    Ok(())
}

/// Applies a tag diff; shared tags are never touched.
async fn apply_tag_diff(txn: &DatabaseTransaction, recipe_id: i64, diff: &TagDiff) -> AppResult<()> {
    if !diff.detach.is_empty() {
        RecipeTags::delete_many()
            .filter(RecipeTagCol::RecipeId.eq(recipe_id))
            .filter(RecipeTagCol::TagId.is_in(diff.detach.clone()))
            .exec(txn)
            .await?;
    }
    attach_tags(txn, recipe_id, &diff.attach).await
}

/// Deletes unsatisfied lines before inserting new ones so that replacing the
/// amount of an ingredient never collides with the `(recipe, ingredient)` constraint.
async fn apply_line_plan(txn: &DatabaseTransaction, recipe_id: i64, plan: &LinePlan) -> AppResult<()> {
    if !plan.delete.is_empty() {
        RecipeIngredients::delete_many()
            .filter(LineCol::RecipeId.eq(recipe_id))
            .filter(LineCol::Id.is_in(plan.delete.clone()))
            .exec(txn)
            .await?;
    }
    insert_lines(txn, recipe_id, &plan.create).await
}

/// Builds the read models for `recipes`, preserving their order.
pub async fn load_recipe_views<C: ConnectionTrait>(
    db: &C,
    viewer: Option<Uuid>,
    recipes: Vec<RecipeModel>,
) -> AppResult<Vec<Recipe>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let recipe_ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<Uuid> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let tag_links = RecipeTags::find()
        .filter(RecipeTagCol::RecipeId.is_in(recipe_ids.clone()))
        .order_by_asc(RecipeTagCol::TagId)
        .all(db)
        .await?;
    let tag_ids: Vec<i64> = tag_links.iter().map(|link| link.tag_id).collect();
    let tags: HashMap<i64, Tag> = Tags::find()
        .filter(TagCol::Id.is_in(tag_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|tag| (tag.id, Tag::from(tag)))
        .collect();

    let lines = RecipeIngredients::find()
        .filter(LineCol::RecipeId.is_in(recipe_ids.clone()))
        .order_by_asc(LineCol::Id)
        .all(db)
        .await?;
    let ingredient_ids: Vec<i64> = lines.iter().map(|line| line.ingredient_id).collect();
    let ingredients: HashMap<i64, _> = Ingredients::find()
        .filter(IngredientCol::Id.is_in(ingredient_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|ingredient| (ingredient.id, ingredient))
        .collect();

    let authors: HashMap<Uuid, _> = Users::find()
        .filter(UserCol::Id.is_in(author_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let (favorited, in_cart) = match viewer {
        Some(viewer) => {
            let favorited: HashSet<i64> = Favorites::find()
                .select_only()
                .column(FavCol::RecipeId)
                .filter(FavCol::UserId.eq(viewer))
                .filter(FavCol::RecipeId.is_in(recipe_ids.clone()))
                .into_tuple::<i64>()
                .all(db)
                .await?
                .into_iter()
                .collect();
            let in_cart: HashSet<i64> = CartEntries::find()
                .select_only()
                .column(CartCol::RecipeId)
                .filter(CartCol::UserId.eq(viewer))
                .filter(CartCol::RecipeId.is_in(recipe_ids.clone()))
                .into_tuple::<i64>()
                .all(db)
                .await?
                .into_iter()
                .collect();
            (favorited, in_cart)
        }
        None => (HashSet::new(), HashSet::new()),
    };
    let subscribed = subscribed_authors(db, viewer, &author_ids).await?;

    let mut tags_by_recipe: HashMap<i64, Vec<Tag>> = HashMap::new();
    for link in tag_links {
        if let Some(tag) = tags.get(&link.tag_id) {
            tags_by_recipe.entry(link.recipe_id).or_default().push(tag.clone());
        }
    }

    let mut lines_by_recipe: HashMap<i64, Vec<IngredientLine>> = HashMap::new();
    for line in lines {
        if let Some(ingredient) = ingredients.get(&line.ingredient_id) {
            lines_by_recipe
                .entry(line.recipe_id)
                .or_default()
                .push(IngredientLine {
                    id: line.id,
                    ingredient_id: ingredient.id,
                    name: ingredient.name.clone(),
                    measurement_unit: ingredient.measurement_unit.clone(),
                    amount: line.amount,
                });
        }
    }

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors
                .get(&recipe.author_id)
                .cloned()
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("recipe author is missing")))?;
            let is_subscribed = subscribed.contains(&author.id);
            Ok(Recipe {
                id: recipe.id,
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                author: User::from_entity(author, is_subscribed),
                ingredients: lines_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                image: media::image_url(&recipe.image),
                text: recipe.text,
                cooking_time: recipe.cooking_time,
                created_at: recipe.created_at.with_timezone(&Utc),
            })
        })
        .collect()
}

async fn load_recipe_view<C: ConnectionTrait>(
    db: &C,
    viewer: Option<Uuid>,
    recipe: RecipeModel,
) -> AppResult<Recipe> {
    load_recipe_views(db, viewer, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Recipe"))
}

pub async fn list_recipes(
    state: &AppState,
    viewer: Option<&AuthUser>,
    query: RecipeQuery,
) -> AppResult<ApiResponse<RecipeList>> {
    let (page, limit, offset) = query.pagination().normalize(state.config.page_size);
    let viewer_id = viewer.map(|v| v.user_id);
    let mut condition = Condition::all();

    if let Some(author) = query.author {
        condition = condition.add(RecipeCol::AuthorId.eq(author));
    }

    let slugs = query.tag_slugs();
    if !slugs.is_empty() {
        let tag_ids: Vec<i64> = Tags::find()
            .select_only()
            .column(TagCol::Id)
            .filter(TagCol::Slug.is_in(slugs))
            .into_tuple::<i64>()
            .all(&state.orm)
            .await?;
        let recipe_ids: Vec<i64> = RecipeTags::find()
            .select_only()
            .column(RecipeTagCol::RecipeId)
            .filter(RecipeTagCol::TagId.is_in(tag_ids))
            .distinct()
            .into_tuple::<i64>()
            .all(&state.orm)
            .await?;
        condition = condition.add(RecipeCol::Id.is_in(recipe_ids));
    }

    if let Some(viewer_id) = viewer_id {
        if let Some(flag) = parse_flag(query.is_favorited.as_deref()) {
            let ids: Vec<i64> = Favorites::find()
                .select_only()
                .column(FavCol::RecipeId)
                .filter(FavCol::UserId.eq(viewer_id))
                .into_tuple::<i64>()
                .all(&state.orm)
                .await?;
            condition = condition.add(if flag {
                RecipeCol::Id.is_in(ids)
            } else {
                RecipeCol::Id.is_not_in(ids)
            });
        }
        if let Some(flag) = parse_flag(query.is_in_shopping_cart.as_deref()) {
            let ids: Vec<i64> = CartEntries::find()
                .select_only()
                .column(CartCol::RecipeId)
                .filter(CartCol::UserId.eq(viewer_id))
                .into_tuple::<i64>()
                .all(&state.orm)
                .await?;
            condition = condition.add(if flag {
                RecipeCol::Id.is_in(ids)
            } else {
                RecipeCol::Id.is_not_in(ids)
            });
        }
    }

    let finder = Recipes::find()
        .filter(condition)
        .order_by_desc(RecipeCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;

    let recipes = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = load_recipe_views(&state.orm, viewer_id, recipes).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Recipes", RecipeList { items }, Some(meta)))
}

pub async fn get_recipe(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: i64,
) -> AppResult<ApiResponse<Recipe>> {
    let recipe = Recipes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe"))?;
    let view = load_recipe_view(&state.orm, viewer.map(|v| v.user_id), recipe).await?;
    Ok(ApiResponse::success("Recipe", view, None))
}

/// Validates the whole request, then inserts the recipe, its tag links and its
/// ingredient lines in one transaction.
pub async fn create_recipe(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRecipeRequest,
) -> AppResult<ApiResponse<Recipe>> {
    validate_name(&payload.name)?;
    validate_cooking_time(payload.cooking_time)?;
    let tag_ids = reconcile::dedup_ids(&payload.tags);
    let plan = reconcile::plan_lines(&[], &payload.ingredients)?;
    let image = media::decode_image(&payload.image)?;

    let txn = state.orm.begin().await?;
    ensure_tags_exist(&txn, &tag_ids).await?;
    ensure_ingredients_exist(&txn, &plan.ingredient_ids_to_create()).await?;

    let image_path = media::store_image(&state.config.media_root, &image).await?;
    let inserted = async {
        let recipe = RecipeActive {
            id: NotSet,
            author_id: Set(user.user_id),
            name: Set(payload.name.trim().to_string()),
            text: Set(payload.text),
            cooking_time: Set(payload.cooking_time),
            image: Set(image_path.clone()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        attach_tags(&txn, recipe.id, &tag_ids).await?;
        insert_lines(&txn, recipe.id, &plan.create).await?;
        Ok::<_, AppError>(recipe)
    }
    .await;

    let committed = match inserted {
        Ok(recipe) => txn.commit().await.map(|()| recipe).map_err(AppError::from),
        Err(err) => Err(err),
    };
    let recipe =
        media::discard_on_error(&state.config.media_root, Some(&image_path), committed).await?;

    tracing::info!(recipe_id = recipe.id, author = %user.user_id, "recipe created");
    audit::record(
        &state.pool,
        user.user_id,
        "recipe_create",
        "recipes",
        serde_json::json!({ "recipe_id": recipe.id }),
    )
    .await;

    let view = load_recipe_view(&state.orm, Some(user.user_id), recipe).await?;
    Ok(ApiResponse::success("Recipe created", view, Some(Meta::empty())))
}

/// Reconciles scalar fields, tags and ingredient lines with the request.
///
/// Every check (ownership, field validation, duplicate ingredients, referenced
/// tags and ingredients) runs before the first write; all writes share one
/// transaction and are rolled back together on failure.
pub async fn update_recipe(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateRecipeRequest,
) -> AppResult<ApiResponse<Recipe>> {
    if let Some(name) = payload.name.as_deref() {
        validate_name(name)?;
    }
    if let Some(cooking_time) = payload.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    let new_image: Option<DecodedImage> = payload
        .image
        .as_deref()
        .map(media::decode_image)
        .transpose()?;

    let txn = state.orm.begin().await?;

    let existing = Recipes::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe"))?;
    if existing.author_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let tag_diff = match payload.tags.as_deref() {
        Some(requested) => {
            let current: Vec<i64> = RecipeTags::find()
                .select_only()
                .column(RecipeTagCol::TagId)
                .filter(RecipeTagCol::RecipeId.eq(id))
                .into_tuple::<i64>()
                .all(&txn)
                .await?;
            let diff = reconcile::diff_tags(&current, requested);
            ensure_tags_exist(&txn, &diff.attach).await?;
            Some(diff)
        }
        None => None,
    };

    let line_plan = match payload.ingredients.as_deref() {
        Some(requested) => {
            let current: Vec<ExistingLine> = RecipeIngredients::find()
                .filter(LineCol::RecipeId.eq(id))
                .order_by_asc(LineCol::Id)
                .all(&txn)
                .await?
                .iter()
                .map(ExistingLine::from)
                .collect();
            let plan = reconcile::plan_lines(&current, requested)?;
            ensure_ingredients_exist(&txn, &plan.ingredient_ids_to_create()).await?;
            Some(plan)
        }
        None => None,
    };

    let new_image_path = match &new_image {
        Some(image) => Some(media::store_image(&state.config.media_root, image).await?),
        None => None,
    };
    let old_image = existing.image.clone();

    let applied = async {
        let mut active: RecipeActive = existing.clone().into();
        if let Some(name) = payload.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(text) = payload.text {
            active.text = Set(text);
        }
        if let Some(cooking_time) = payload.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        if let Some(path) = &new_image_path {
            active.image = Set(path.clone());
        }
        let recipe = if active.is_changed() {
            active.update(&txn).await?
        } else {
            existing
        };

        if let Some(diff) = &tag_diff {
            apply_tag_diff(&txn, id, diff).await?;
        }
        if let Some(plan) = &line_plan {
            apply_line_plan(&txn, id, plan).await?;
        }
        Ok::<_, AppError>(recipe)
    }
    .await;

    let committed = match applied {
        Ok(recipe) => txn.commit().await.map(|()| recipe).map_err(AppError::from),
        Err(err) => Err(err),
    };
    let recipe = media::discard_on_error(
        &state.config.media_root,
        new_image_path.as_deref(),
        committed,
    )
    .await?;

    if new_image_path.is_some() {
        media::remove_image(&state.config.media_root, &old_image).await;
    }

    tracing::info!(
        recipe_id = id,
        tags_changed = tag_diff.as_ref().is_some_and(|d| !d.is_noop()),
        lines_changed = line_plan.as_ref().is_some_and(|p| !p.is_noop()),
        "recipe updated"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "recipe_update",
        "recipes",
        serde_json::json!({
            "recipe_id": id,
            "lines_created": line_plan.as_ref().map_or(0, |p| p.create.len()),
            "lines_deleted": line_plan.as_ref().map_or(0, |p| p.delete.len()),
        }),
    )
    .await;

    let view = load_recipe_view(&state.orm, Some(user.user_id), recipe).await?;
    Ok(ApiResponse::success("Updated", view, Some(Meta::empty())))
}

/// Lines, tag links, favorites and cart entries go with the recipe (FK cascade).
pub async fn delete_recipe(state: &AppState, user: &AuthUser, id: i64) -> AppResult<()> {
    let recipe = Recipes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe"))?;
    if recipe.author_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let result = Recipes::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Recipe"));
    }
    media::remove_image(&state.config.media_root, &recipe.image).await;

    audit::record(
        &state.pool,
        user.user_id,
        "recipe_delete",
        "recipes",
        serde_json::json!({ "recipe_id": id }),
    )
    .await;

    Ok(())
}

/// 404 unless the recipe exists; used by the toggle services.
pub async fn ensure_recipe_exists<C: ConnectionTrait>(db: &C, id: i64) -> AppResult<()> {
    let exists = Recipes::find_by_id(id).count(db).await? > 0;
    if !exists {
        return Err(AppError::not_found("Recipe"));
    }
    Ok(())
}

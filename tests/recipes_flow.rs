mod common;

use foodgram::{
    dto::{
        recipes::{CreateRecipeRequest, IngredientAmount, UpdateRecipeRequest},
        reference::{CreateIngredientRequest, CreateTagRequest},
    },
    entity::{
        favorites::{Column as FavCol, Entity as Favorites},
        ingredients::Entity as Ingredients,
        recipe_tags::{Column as RecipeTagCol, Entity as RecipeTags},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Recipe,
    routes::params::RecipeQuery,
    services::{cart_service, favorite_service, recipe_service, reference_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

struct Fixture {
    admin: AuthUser,
    cook: AuthUser,
    tags: Vec<i64>,
    ingredients: Vec<(i64, String)>,
}

async fn fixture(state: &AppState) -> anyhow::Result<Fixture> {
    let admin = common::create_admin(state).await?;
    let cook = common::create_cook(state).await?;

    let mut tags = Vec::new();
    for _ in 0..3 {
        let tag = reference_service::create_tag(
            state,
            &admin,
            CreateTagRequest {
                name: common::unique("tag"),
                color: "#49b64e".into(),
            },
        )
        .await?;
        tags.push(tag.data.expect("tag").id);
    }

    let mut ingredients = Vec::new();
    for _ in 0..3 {
        let ingredient = reference_service::create_ingredient(
            state,
            &admin,
            CreateIngredientRequest {
                name: common::unique("ingredient"),
                measurement_unit: "g".into(),
            },
        )
        .await?
        .data
        .expect("ingredient");
        ingredients.push((ingredient.id, ingredient.name));
    }

    Ok(Fixture {
        admin,
        cook,
        tags,
        ingredients,
    })
}

fn amount(id: i64, amount: i32) -> IngredientAmount {
    IngredientAmount { id, amount }
}

async fn create(
    state: &AppState,
    author: &AuthUser,
    tags: Vec<i64>,
    ingredients: Vec<IngredientAmount>,
) -> Result<Recipe, AppError> {
    let resp = recipe_service::create_recipe(
        state,
        author,
        CreateRecipeRequest {
            name: common::unique("recipe"),
            text: "Mix and bake.".into(),
            cooking_time: 30,
            image: common::png_base64(),
            tags,
            ingredients,
        },
    )
    .await?;
    Ok(resp.data.expect("recipe"))
}

fn line_for(recipe: &Recipe, ingredient_id: i64) -> Option<(i64, i32)> {
    recipe
        .ingredients
        .iter()
        .find(|line| line.ingredient_id == ingredient_id)
        .map(|line| (line.id, line.amount))
}

#[tokio::test]
async fn create_then_reconcile_tags_and_lines() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let fx = fixture(&state).await?;
    let (i1, i2, i3) = (fx.ingredients[0].0, fx.ingredients[1].0, fx.ingredients[2].0);

    let recipe = create(
        &state,
        &fx.cook,
        vec![fx.tags[0], fx.tags[1], fx.tags[1]],
        vec![amount(i1, 100), amount(i2, 3)],
    )
    .await?;
    assert_eq!(recipe.tags.len(), 2);
    assert_eq!(recipe.ingredients.len(), 2);
    assert!(recipe.image.starts_with("/media/recipes/"));
    let shared_link = RecipeTags::find()
        .filter(RecipeTagCol::RecipeId.eq(recipe.id))
        .filter(RecipeTagCol::TagId.eq(fx.tags[1]))
        .one(&state.orm)
        .await?
        .expect("link for shared tag");
    let (line1, _) = line_for(&recipe, i1).expect("line for i1");
    let (line2, _) = line_for(&recipe, i2).expect("line for i2");

    // keep i1 by line id, change i2's amount, add i3, swap tag 0 for tag 2
    let updated = recipe_service::update_recipe(
        &state,
        &fx.cook,
        recipe.id,
        UpdateRecipeRequest {
            tags: Some(vec![fx.tags[1], fx.tags[2]]),
            ingredients: Some(vec![amount(line1, 100), amount(i2, 5), amount(i3, 7)]),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("recipe");

    let tag_ids: Vec<i64> = updated.tags.iter().map(|t| t.id).collect();
    assert_eq!(tag_ids.len(), 2);
    assert!(tag_ids.contains(&fx.tags[1]) && tag_ids.contains(&fx.tags[2]));
    let shared_after = RecipeTags::find_by_id(shared_link.id).one(&state.orm).await?;
    assert!(shared_after.is_some(), "shared tag link must not be recreated");

    assert_eq!(line_for(&updated, i1), Some((line1, 100)));
    let (new_line2, amount2) = line_for(&updated, i2).expect("line for i2");
    assert_ne!(new_line2, line2);
    assert_eq!(amount2, 5);
    assert_eq!(line_for(&updated, i3).map(|(_, a)| a), Some(7));

    // dropping i3 from the request removes its line
    let trimmed = recipe_service::update_recipe(
        &state,
        &fx.cook,
        recipe.id,
        UpdateRecipeRequest {
            ingredients: Some(vec![amount(i1, 100), amount(i2, 5)]),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("recipe");
    assert_eq!(trimmed.ingredients.len(), 2);
    assert!(line_for(&trimmed, i3).is_none());
    assert_eq!(trimmed.tags.len(), 2, "omitted tags stay untouched");

    // a line id sent with a new amount no longer matches that line and is
    // read as an ingredient id, which replaces the old line when it resolves
    let (kept_line1, _) = line_for(&trimmed, i1).expect("line for i1");
    let as_ingredient = Ingredients::find_by_id(kept_line1).one(&state.orm).await?;
    let resubmitted = recipe_service::update_recipe(
        &state,
        &fx.cook,
        recipe.id,
        UpdateRecipeRequest {
            ingredients: Some(vec![amount(kept_line1, 250), amount(i2, 5)]),
            ..Default::default()
        },
    )
    .await;
    match as_ingredient {
        Some(ingredient) if ingredient.id != i2 => {
            let replaced = resubmitted?.data.expect("recipe");
            assert!(replaced.ingredients.iter().all(|line| line.id != kept_line1));
            if ingredient.id != i1 {
                assert!(line_for(&replaced, i1).is_none());
            }
            assert_eq!(line_for(&replaced, ingredient.id).map(|(_, a)| a), Some(250));
        }
        Some(_) => assert!(matches!(resubmitted, Err(AppError::Validation(_)))),
        None => {
            assert!(matches!(resubmitted, Err(AppError::NotFound(_))));
            let current = recipe_service::get_recipe(&state, Some(&fx.cook), recipe.id)
                .await?
                .data
                .expect("recipe");
            assert_eq!(line_for(&current, i1), Some((kept_line1, 100)));
        }
    }

    Ok(())
}

#[tokio::test]
async fn rejected_update_leaves_recipe_unchanged() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let fx = fixture(&state).await?;
    let (i1, i2) = (fx.ingredients[0].0, fx.ingredients[1].0);

    let recipe = create(&state, &fx.cook, vec![fx.tags[0]], vec![amount(i1, 100)]).await?;

    let err = recipe_service::update_recipe(
        &state,
        &fx.cook,
        recipe.id,
        UpdateRecipeRequest {
            name: Some("Renamed".into()),
            ingredients: Some(vec![amount(i2, 1), amount(i2, 2)]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = recipe_service::update_recipe(
        &state,
        &fx.cook,
        recipe.id,
        UpdateRecipeRequest {
            ingredients: Some(vec![amount(i1, 100), amount(i64::MAX, 1)]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = recipe_service::update_recipe(
        &state,
        &fx.admin,
        recipe.id,
        UpdateRecipeRequest {
            name: Some("Hijacked".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let current = recipe_service::get_recipe(&state, Some(&fx.cook), recipe.id)
        .await?
        .data
        .expect("recipe");
    assert_eq!(current.name, recipe.name);
    assert_eq!(current.ingredients, recipe.ingredients);
    Ok(())
}

#[tokio::test]
async fn create_with_duplicate_ingredient_writes_nothing() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let fx = fixture(&state).await?;
    let i1 = fx.ingredients[0].0;

    let err = create(&state, &fx.cook, vec![], vec![amount(i1, 1), amount(i1, 2)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mine = recipe_service::list_recipes(
        &state,
        Some(&fx.cook),
        RecipeQuery {
            author: Some(fx.cook.user_id),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(mine.data.expect("list").items.len(), 0);
    Ok(())
}

#[tokio::test]
async fn favorites_cart_and_shopping_list_export() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let fx = fixture(&state).await?;
    let (i1, i2) = (fx.ingredients[0].0, fx.ingredients[1].0);

    let first = create(&state, &fx.admin, vec![fx.tags[0]], vec![amount(i1, 100), amount(i2, 2)]).await?;
    let second = create(&state, &fx.admin, vec![fx.tags[1]], vec![amount(i1, 5)]).await?;

    favorite_service::add_favorite(&state, &fx.cook, first.id).await?;
    let err = favorite_service::add_favorite(&state, &fx.cook, first.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let count = Favorites::find()
        .filter(FavCol::UserId.eq(fx.cook.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(count, 1);

    let favorites = recipe_service::list_recipes(
        &state,
        Some(&fx.cook),
        RecipeQuery {
            is_favorited: Some("1".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list");
    assert!(favorites.items.iter().any(|r| r.id == first.id && r.is_favorited));
    assert!(favorites.items.iter().all(|r| r.id != second.id));

    favorite_service::remove_favorite(&state, &fx.cook, first.id).await?;
    let err = favorite_service::remove_favorite(&state, &fx.cook, first.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = cart_service::export_shopping_list(&state, &fx.cook)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    cart_service::add_to_cart(&state, &fx.cook, first.id).await?;
    cart_service::add_to_cart(&state, &fx.cook, second.id).await?;

    let viewed = recipe_service::get_recipe(&state, Some(&fx.cook), second.id)
        .await?
        .data
        .expect("recipe");
    assert!(viewed.is_in_shopping_cart);

    let pdf = cart_service::export_shopping_list(&state, &fx.cook).await?;
    assert!(pdf.starts_with(b"%PDF-"));
    let expected = format!("({} - 105 g) Tj", fx.ingredients[0].1);
    assert!(
        pdf.windows(expected.len()).any(|w| w == expected.as_bytes()),
        "aggregated line missing from document"
    );

    // the export emptied the cart
    let err = cart_service::export_shopping_list(&state, &fx.cook)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let missing = cart_service::add_to_cart(&state, &fx.cook, i64::MAX)
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));
    Ok(())
}

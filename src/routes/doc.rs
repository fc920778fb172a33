use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        recipes::{CreateRecipeRequest, IngredientAmount, RecipeList, UpdateRecipeRequest},
        reference::{CreateIngredientRequest, CreateTagRequest, IngredientList, TagList},
        subscriptions::SubscriptionList,
        users::{RegisterRequest, SetPasswordRequest, UpdateMeRequest, UserList},
    },
    models::{Author, Ingredient, IngredientLine, Recipe, RecipeShort, Tag, User},
    response::{ApiResponse, Meta, StatusMessage},
    routes::{auth, health, ingredients, params, recipes, tags, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        users::register,
        users::list_users,
        users::get_user,
        users::me,
        users::update_me,
        users::set_password,
        users::subscriptions,
        users::subscribe,
        users::unsubscribe,
        tags::list_tags,
        tags::get_tag,
        tags::create_tag,
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        ingredients::create_ingredient,
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_shopping_cart,
        recipes::remove_from_shopping_cart,
        recipes::download_shopping_cart
    ),
    components(
        schemas(
            User,
            Author,
            Tag,
            Ingredient,
            IngredientLine,
            Recipe,
            RecipeShort,
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            UpdateMeRequest,
            SetPasswordRequest,
            CreateTagRequest,
            CreateIngredientRequest,
            CreateRecipeRequest,
            UpdateRecipeRequest,
            IngredientAmount,
            UserList,
            SubscriptionList,
            TagList,
            IngredientList,
            RecipeList,
            StatusMessage,
            params::Pagination,
            params::RecipeQuery,
            params::IngredientQuery,
            params::SubscriptionQuery,
            Meta,
            ApiResponse<Recipe>,
            ApiResponse<RecipeList>,
            ApiResponse<User>,
            ApiResponse<UserList>,
            ApiResponse<SubscriptionList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Token login"),
        (name = "Users", description = "Registration, profiles and subscriptions"),
        (name = "Tags", description = "Recipe tags"),
        (name = "Ingredients", description = "Ingredient catalogue"),
        (name = "Recipes", description = "Recipes, favorites and shopping cart"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

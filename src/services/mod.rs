pub mod auth_service;
pub mod cart_service;
pub mod favorite_service;
pub mod media;
pub mod reconcile;
pub mod recipe_service;
pub mod reference_service;
pub mod shopping_list;
pub mod toggle;
pub mod user_service;

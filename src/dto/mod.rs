pub mod auth;
pub mod cart;
pub mod recipes;
pub mod reference;
pub mod subscriptions;
pub mod users;

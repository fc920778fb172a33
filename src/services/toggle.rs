use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Add,
    Remove,
}

/// User-facing messages of one toggleable relation.
#[derive(Debug, Clone, Copy)]
pub struct ToggleMessages {
    pub added: &'static str,
    pub removed: &'static str,
    pub already_present: &'static str,
    pub not_present: &'static str,
}

pub const FAVORITE: ToggleMessages = ToggleMessages {
    added: "Added to favorites",
    removed: "Removed from favorites",
    already_present: "Recipe is already in favorites",
    not_present: "Recipe is not in favorites, nothing to remove",
};

pub const SHOPPING_CART: ToggleMessages = ToggleMessages {
    added: "Added to shopping cart",
    removed: "Removed from shopping cart",
    already_present: "Recipe is already in the shopping cart",
    not_present: "Recipe is not in the shopping cart, nothing to remove",
};

pub const SUBSCRIPTION: ToggleMessages = ToggleMessages {
    added: "Subscribed",
    removed: "Unsubscribed",
    already_present: "Already subscribed to this author",
    not_present: "Not subscribed to this author, nothing to remove",
};

/// Repeating a transition is an error, never a no-op.
/// Returns the success message of the transition.
pub fn check_transition(
    action: ToggleAction,
    present: bool,
    messages: &ToggleMessages,
) -> AppResult<&'static str> {
    match (action, present) {
        (ToggleAction::Add, false) => Ok(messages.added),
        (ToggleAction::Add, true) => Err(AppError::Validation(messages.already_present.into())),
        (ToggleAction::Remove, true) => Ok(messages.removed),
        (ToggleAction::Remove, false) => Err(AppError::Validation(messages.not_present.into())),
    }
}

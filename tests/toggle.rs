use foodgram::{
    error::AppError,
    services::toggle::{FAVORITE, SHOPPING_CART, SUBSCRIPTION, ToggleAction, check_transition},
};

#[test]
fn add_when_absent_and_remove_when_present_succeed() {
    assert_eq!(
        check_transition(ToggleAction::Add, false, &FAVORITE).expect("add"),
        FAVORITE.added
    );
    assert_eq!(
        check_transition(ToggleAction::Remove, true, &SHOPPING_CART).expect("remove"),
        SHOPPING_CART.removed
    );
}

#[test]
fn repeated_transitions_are_errors() {
    let err = check_transition(ToggleAction::Add, true, &SUBSCRIPTION).unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg == SUBSCRIPTION.already_present));

    let err = check_transition(ToggleAction::Remove, false, &FAVORITE).unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg == FAVORITE.not_present));
}

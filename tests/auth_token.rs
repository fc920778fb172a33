use foodgram::{
    error::AppError,
    middleware::auth::{ROLE_ADMIN, ROLE_USER, decode_token, ensure_admin},
    services::auth_service::{hash_password, issue_token, validate_password, verify_password},
};
use uuid::Uuid;

const SECRET: &str = "test-secret";

#[test]
fn issued_token_decodes_to_the_same_user() -> anyhow::Result<()> {
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, ROLE_ADMIN, SECRET)?;

    let user = decode_token(&token, SECRET)?;
    assert_eq!(user.user_id, user_id);
    assert!(user.is_admin());
    assert!(ensure_admin(&user).is_ok());
    Ok(())
}

#[test]
fn token_signed_with_other_secret_is_rejected() -> anyhow::Result<()> {
    let token = issue_token(Uuid::new_v4(), ROLE_USER, SECRET)?;
    assert!(matches!(
        decode_token(&token, "other-secret"),
        Err(AppError::Unauthorized)
    ));
    assert!(matches!(
        decode_token("not-a-token", SECRET),
        Err(AppError::Unauthorized)
    ));
    Ok(())
}

#[test]
fn regular_user_is_not_admin() -> anyhow::Result<()> {
    let token = issue_token(Uuid::new_v4(), ROLE_USER, SECRET)?;
    let user = decode_token(&token, SECRET)?;
    assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
    Ok(())
}

#[test]
fn password_hash_round_trip() -> anyhow::Result<()> {
    let hash = hash_password("correct horse")?;
    assert!(verify_password("correct horse", &hash)?);
    assert!(!verify_password("wrong horse", &hash)?);
    Ok(())
}

#[test]
fn weak_passwords_are_rejected() {
    assert!(validate_password("short").is_err());
    assert!(validate_password("12345678901").is_err());
    assert!(validate_password("letters-and-1").is_ok());
}

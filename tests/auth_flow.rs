mod common;

use foodgram::{
    dto::{
        auth::LoginRequest,
        users::{RegisterRequest, UpdateMeRequest},
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::{AuthUser, ROLE_USER, decode_token},
    services::{
        auth_service::{hash_password, login_user, register_user},
        user_service,
    },
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

const PASSWORD: &str = "pantry-staple-1";

fn registration(email: &str, username: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        username: username.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        password: PASSWORD.to_string(),
    }
}

#[tokio::test]
async fn username_equal_to_existing_email_is_rejected() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;

    let email = format!("{}@example.com", common::unique("cook"));
    register_user(&state, registration(&email, &common::unique("cook"))).await?;

    let err = register_user(&state, registration(&format!("other-{email}"), &email))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("Username")));

    // emails are stored lowercased, usernames are compared against them case-insensitively
    let err = register_user(
        &state,
        registration(&format!("upper-{email}"), &email.to_uppercase()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // and an email may not equal an existing username
    let username = format!("{}@example.org", common::unique("chef"));
    register_user(&state, registration(&format!("{}@example.com", common::unique("chef")), &username))
        .await?;
    let err = register_user(&state, registration(&username.to_uppercase(), &common::unique("chef")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("Email")));
    Ok(())
}

#[tokio::test]
async fn update_me_cannot_take_another_users_email_as_username() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;

    let email = format!("{}@example.com", common::unique("owner"));
    register_user(&state, registration(&email, &common::unique("owner"))).await?;
    let other = common::create_cook(&state).await?;

    let err = user_service::update_me(
        &state,
        &other,
        UpdateMeRequest {
            username: Some(email.clone()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn login_prefers_email_over_colliding_username() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;

    let email = format!("{}@example.com", common::unique("first"));
    let owner = register_user(&state, registration(&email, &common::unique("first")))
        .await?
        .data
        .expect("user");

    // a row predating the namespace check, whose username is the owner's email
    UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", common::unique("second"))),
        username: Set(email.clone()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        password_hash: Set(hash_password("another-secret-2")?),
        role: Set(ROLE_USER.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    for _ in 0..3 {
        let resp = login_user(
            &state,
            LoginRequest {
                login: email.to_uppercase(),
                password: PASSWORD.into(),
            },
        )
        .await?;
        let token = resp.data.expect("token").auth_token;
        let AuthUser { user_id, .. } = decode_token(&token, &state.config.jwt_secret)?;
        assert_eq!(user_id, owner.id);
    }

    let err = login_user(
        &state,
        LoginRequest {
            login: email,
            password: "wrong-password-3".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

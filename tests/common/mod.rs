#![allow(dead_code)]

use foodgram::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    entity::users::ActiveModel as UserActive,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

/// Returns `None` when no database is configured, so DB-backed tests can skip.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            None
        }
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let media_root = std::env::temp_dir().join(format!("foodgram-test-{}", Uuid::new_v4()));
    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        media_root: media_root.to_string_lossy().to_string(),
        page_size: 10,
    };
    let state = AppState::new(pool, config);
    run_migrations(&state.orm).await?;
    Ok(state)
}

/// Suffix keeping names unique across runs against a shared database.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let username = unique("user");
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{username}@example.com")),
        username: Set(username),
        first_name: Set("Test".into()),
        last_name: Set("User".into()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    create_user(state, ROLE_ADMIN).await
}

pub async fn create_cook(state: &AppState) -> anyhow::Result<AuthUser> {
    create_user(state, ROLE_USER).await
}

/// Smallest payload the image decoder accepts.
pub fn png_base64() -> String {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    let png: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse},
    dto::users::RegisterRequest,
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::ROLE_USER,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const TOKEN_TTL_HOURS: i64 = 24;
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must contain at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("Password cannot be entirely numeric".into()));
    }
    Ok(())
}

pub fn issue_token(user_id: Uuid, role: &str, secret: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn validate_registration(payload: &RegisterRequest) -> AppResult<()> {
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("Enter a valid email address".into()));
    }
    let username = payload.username.trim();
    if username.is_empty()
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
    {
        return Err(AppError::Validation(
            "Username may contain only letters, digits and @/./+/-/_".into(),
        ));
    }
    validate_password(&payload.password)
}

async fn identity_taken(state: &AppState, condition: Condition, except: Option<Uuid>) -> AppResult<bool> {
    let mut finder = Users::find().filter(condition);
    if let Some(id) = except {
        finder = finder.filter(UserCol::Id.ne(id));
    }
    Ok(finder.count(&state.orm).await? > 0)
}

/// Emails and usernames share the login namespace, so a new email may not
/// equal any username and a new username may not equal any email
/// (case-insensitively against emails). `except` skips the caller's own row.
pub async fn ensure_identity_free(
    state: &AppState,
    email: Option<&str>,
    username: Option<&str>,
    except: Option<Uuid>,
) -> AppResult<()> {
    if let Some(email) = email {
        let condition = Condition::any()
            .add(UserCol::Email.eq(email))
            .add(Expr::expr(Func::lower(Expr::col(UserCol::Username))).eq(email));
        if identity_taken(state, condition, except).await? {
            return Err(AppError::Validation("Email is already taken".into()));
        }
    }
    if let Some(username) = username {
        let condition = Condition::any()
            .add(UserCol::Username.eq(username))
            .add(UserCol::Email.eq(username.to_lowercase()));
        if identity_taken(state, condition, except).await? {
            return Err(AppError::Validation("Username is already taken".into()));
        }
    }
    Ok(())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    validate_registration(&payload)?;
    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim().to_string();

    ensure_identity_free(state, Some(&email), Some(&username), None).await?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        username: Set(username),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(ROLE_USER.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::on_unique_violation(err, "Email or username is already taken"))?;

    on_user_registered(state, &user).await;

    Ok(ApiResponse::success(
        "User created",
        User::from_entity(user, false),
        Some(Meta::empty()),
    ))
}

/// Post-registration hook, called directly by `register_user`.
async fn on_user_registered(state: &AppState, user: &UserModel) {
    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    audit::record(
        &state.pool,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;
}

/// Resolves the identity by email first and by username otherwise, then
/// checks the password.
pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { login, password } = payload;
    let login = login.trim();

    let by_email = Users::find()
        .filter(UserCol::Email.eq(login.to_lowercase()))
        .one(&state.orm)
        .await?;
    let user = match by_email {
        Some(user) => user,
        None => Users::find()
            .filter(UserCol::Username.eq(login))
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid credentials".into()))?,
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Validation("Invalid credentials".into()));
    }

    let token = issue_token(user.id, &user.role, &state.config.jwt_secret)?;

    audit::record(
        &state.pool,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse { auth_token: token },
        Some(Meta::empty()),
    ))
}

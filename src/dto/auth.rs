use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Credentials for token login. `login` accepts either the username or the email.
#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub auth_token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

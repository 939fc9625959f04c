use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::UserProfile;

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegisterRequest {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    #[serde(alias = "telefono")]
    pub phone: Option<String>,
    #[serde(alias = "contraseña")]
    pub password: Option<String>,
    #[serde(alias = "confirmarContraseña")]
    pub password_confirm: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    /// Canonical phone the code was sent to; pass it back to `/verificar-codigo`.
    pub phone: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct VerifyCodeRequest {
    #[serde(alias = "telefono")]
    pub phone: Option<String>,
    #[serde(alias = "codigo")]
    pub code: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct LoginRequest {
    #[serde(alias = "telefono")]
    pub phone: Option<String>,
    #[serde(alias = "contraseña")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub phone: String,
    pub role: String,
    pub exp: usize,
}

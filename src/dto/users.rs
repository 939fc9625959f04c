use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::User;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "telefono")]
    pub phone: String,
    #[serde(alias = "contraseña")]
    pub password: String,
    /// `client` or `admin`.
    #[serde(alias = "tipo_usuario")]
    pub role: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    #[serde(alias = "telefono")]
    pub phone: Option<String>,
    /// Blank keeps the current password.
    #[serde(alias = "contraseña")]
    pub password: Option<String>,
    #[serde(alias = "tipo_usuario")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}

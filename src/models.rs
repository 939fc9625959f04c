use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "cliente" => Ok(UserRole::Client),
            "admin" | "administrador" => Ok(UserRole::Admin),
            other => Err(AppError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// Public profile returned by login, registration and token verification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub role: String,
}

/// Admin view of a user; never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Base64 image bytes.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Dish {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Price in minor currency units.
    pub price: i64,
    /// Base64 image bytes.
    pub image: Option<String>,
    pub category: CategoryRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Transferencia,
    Local,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Transferencia => "transferencia",
            PaymentMethod::Local => "local",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transferencia" => Ok(PaymentMethod::Transferencia),
            "local" => Ok(PaymentMethod::Local),
            other => Err(AppError::Validation(format!(
                "Unsupported payment method '{other}'"
            ))),
        }
    }
}

/// Order lifecycle. `pagado` and `completado` are historical spellings of
/// `en_proceso` and `realizado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pendiente,
    EnProceso,
    Realizado,
    Cancelado,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pendiente,
        OrderStatus::EnProceso,
        OrderStatus::Realizado,
        OrderStatus::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "pendiente",
            OrderStatus::EnProceso => "en_proceso",
            OrderStatus::Realizado => "realizado",
            OrderStatus::Cancelado => "cancelado",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pendiente" => Ok(OrderStatus::Pendiente),
            "en_proceso" | "pagado" => Ok(OrderStatus::EnProceso),
            "realizado" | "completado" => Ok(OrderStatus::Realizado),
            "cancelado" => Ok(OrderStatus::Cancelado),
            other => Err(AppError::Validation(format!(
                "Invalid order status '{other}', expected one of: {}",
                OrderStatus::ALL.map(|s| s.as_str()).join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user: Option<UserSummary>,
    pub client_ref: Option<String>,
    pub payment_method: String,
    pub total: i64,
    pub status: String,
    /// `data:<mime>;base64,...` when a receipt was uploaded.
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct OrderLine {
    #[serde(skip)]
    pub order_id: Uuid,
    pub dish_id: Uuid,
    pub dish_name: String,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dish_id: Uuid,
    pub stars: i16,
    pub comment: Option<String>,
    pub rated_at: DateTime<Utc>,
    pub user_name: String,
    pub dish_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopRatedDish {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub average_rating: f64,
    pub rating_count: i64,
    /// `data:image/jpeg;base64,...`
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_status_spellings_map_to_canonical_set() {
        assert_eq!("pagado".parse::<OrderStatus>().unwrap(), OrderStatus::EnProceso);
        assert_eq!("completado".parse::<OrderStatus>().unwrap(), OrderStatus::Realizado);
        assert_eq!(" Cancelado ".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelado);
        assert!(matches!(
            "enviado".parse::<OrderStatus>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn payment_methods_are_closed() {
        assert_eq!(
            "Transferencia".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Transferencia
        );
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn roles_accept_spanish_names() {
        assert_eq!("cliente".parse::<UserRole>().unwrap(), UserRole::Client);
        assert_eq!("admin".parse::<UserRole>().unwrap().as_str(), "admin");
        assert!("root".parse::<UserRole>().is_err());
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderLine, UserSummary};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartLine {
    #[serde(alias = "id", alias = "platillo_id")]
    pub dish_id: Uuid,
    /// Defaults to 1.
    #[serde(alias = "cantidad")]
    pub quantity: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitOrderRequest {
    #[serde(alias = "carrito")]
    pub cart: Option<Vec<CartLine>>,
    /// Minor currency units; must match the cart.
    pub total: Option<i64>,
    #[serde(alias = "metodo_pago")]
    pub payment_method: Option<String>,
    #[serde(alias = "comprobanteBase64")]
    pub receipt_base64: Option<String>,
    #[serde(alias = "comprobanteMime")]
    pub receipt_mime: Option<String>,
    /// Anonymous shopper reference; only when no bearer token is sent.
    #[serde(alias = "cliente_ref", alias = "clientRef")]
    pub client_ref: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitOrderResponse {
    pub order_id: Uuid,
    pub user: Option<UserSummary>,
    pub client_ref: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<OrderWithLines>)]
    pub items: Vec<OrderWithLines>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[serde(alias = "estado")]
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderStatusResponse {
    pub id: Uuid,
    pub status: String,
}

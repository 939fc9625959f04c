use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Dish, TopRatedDish};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDishRequest {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(alias = "precio")]
    pub price: i64,
    #[serde(alias = "categoria_id")]
    pub category_id: Uuid,
    /// Base64 or data URL.
    #[serde(alias = "imagen")]
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDishRequest {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    #[serde(alias = "descripcion")]
    pub description: Option<String>,
    #[serde(alias = "precio")]
    pub price: Option<i64>,
    #[serde(alias = "categoria_id")]
    pub category_id: Option<Uuid>,
    #[serde(alias = "imagen")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct DishList {
    #[schema(value_type = Vec<Dish>)]
    pub items: Vec<Dish>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TopRatedList {
    #[schema(value_type = Vec<TopRatedDish>)]
    pub items: Vec<TopRatedDish>,
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Rating;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitRatingRequest {
    /// 1 to 5; fractions are rounded half-up.
    #[serde(alias = "calificacion")]
    pub stars: Option<f64>,
    #[serde(alias = "comentario")]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingList {
    pub ratings: Vec<Rating>,
    /// Mean with one decimal, "0.0" when there are no ratings.
    pub average: String,
    pub count: i64,
}

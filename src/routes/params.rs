use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    /// Canonical status or one of its legacy spellings.
    #[serde(alias = "estado")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TopRatedQuery {
    pub limit: Option<i64>,
}

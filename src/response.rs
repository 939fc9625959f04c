use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }

    /// Unpaginated listing of `total` items.
    pub fn total(total: usize) -> Self {
        Self {
            page: None,
            per_page: None,
            total: Some(total as i64),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Acknowledgement for writes that return no resource (deletes).
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: Some(serde_json::json!({})),
            meta: Some(Meta::empty()),
        }
    }
}

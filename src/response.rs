use actix_web::HttpResponse;
use serde::Serialize;

/// `{"success": true, "message"?: ..., "data"?: ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::data(data))
}

pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::with_message(message, data))
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::with_message(message, data))
}

pub fn message(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::<()> {
        success: true,
        message: Some(message.to_string()),
        data: None,
    })
}

/// Paginated list payload, carried in `data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// Normalizes `page`/`perPage` query values: page >= 1, 1 <= perPage <= 100.
pub fn page_bounds(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(default_per_page).clamp(1, 100);
    (page, per_page)
}

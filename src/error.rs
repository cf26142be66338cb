use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::model::payroll::PeriodError;
use crate::service::salary::SalaryError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "baseSalary")]
    pub field: String,
    #[schema(example = "baseSalary cannot be negative")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<SalaryError> for FieldError {
    fn from(e: SalaryError) -> Self {
        FieldError::new(e.field(), e.to_string())
    }
}

impl From<PeriodError> for FieldError {
    fn from(e: PeriodError) -> Self {
        FieldError::new(e.field(), e.to_string())
    }
}

/// Every error a handler can return. Rendered as
/// `{"success": false, "message": ..., "errors"?: [...]}`.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "Validation failed")]
    Validation(Vec<FieldError>),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{}", _0)]
    Unauthorized(&'static str),
    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "Internal server error")]
    Internal,
}

impl ApiError {
    pub fn validation<E: Into<FieldError>>(errors: impl IntoIterator<Item = E>) -> Self {
        ApiError::Validation(errors.into_iter().map(Into::into).collect())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => json!({
                "success": false,
                "message": self.to_string(),
                "errors": errors,
            }),
            _ => json!({
                "success": false,
                "message": self.to_string(),
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) | StoreError::Reference(msg) => ApiError::Conflict(msg),
            StoreError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                ApiError::Internal
            }
        }
    }
}

impl From<SalaryError> for ApiError {
    fn from(e: SalaryError) -> Self {
        ApiError::validation([e])
    }
}

use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

use crate::auth::auth::authenticate;
use crate::config::Config;
use crate::error::ApiError;

/// Rejects requests without a valid access token and stores the caller as
/// an `AuthUser` request extension.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = match req.app_data::<Data<Config>>() {
        Some(c) => c.clone(),
        None => {
            tracing::error!("App config missing");
            let resp = ApiError::Internal.error_response();
            return Ok(req.into_response(resp));
        }
    };

    let auth_user = match authenticate(req.headers(), &config) {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(path = %req.path(), error = %e, "Rejected unauthenticated request");
            return Ok(req.into_response(e.error_response()));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

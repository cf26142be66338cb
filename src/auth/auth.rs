use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, http::header::HeaderMap, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::employee::Employee;
use crate::model::role::Role;
use crate::models::TokenType;
use crate::store::PayrollStore;

/// The caller behind a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get("Authorization")
        .ok_or(ApiError::Unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header encoding"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized("Authorization header must start with Bearer"))
}

/// Verifies an access token from the request headers.
pub fn authenticate(headers: &HeaderMap, config: &Config) -> Result<AuthUser, ApiError> {
    let token = bearer_token(headers)?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))?;

    if claims.token_type != TokenType::Access {
        return Err(ApiError::Unauthorized("Invalid or expired token"));
    }

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        role: claims.role,
    })
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let result = match req.app_data::<Data<Config>>() {
            Some(config) => authenticate(req.headers(), config),
            None => {
                tracing::error!("Config missing from app data");
                Err(ApiError::Internal)
            }
        };
        ready(result)
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin only"))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Loads an employee the caller is allowed to read. Admins see any
    /// employee and get 404 for unknown ids; everyone else sees only the
    /// employee linked to their own user and gets 403 for every other id.
    pub async fn readable_employee(
        &self,
        store: &dyn PayrollStore,
        employee_id: u64,
    ) -> Result<Employee, ApiError> {
        let employee = store.find_employee(employee_id).await?;

        match employee {
            Some(e) if self.is_admin() || e.user_id == self.user_id => Ok(e),
            None if self.is_admin() => Err(ApiError::NotFound("Employee not found".to_string())),
            _ => Err(ApiError::Forbidden("Access denied")),
        }
    }
}

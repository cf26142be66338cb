use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::employee::EmployeeView;
use crate::model::role::Role;
use crate::model::user::UserView;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
    /// Defaults to `employee`.
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Access token for the `Authorization: Bearer` header.
    pub token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    #[schema(example = 900)]
    pub expires_in: usize,
    pub user: UserView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserView,
    pub employee: Option<EmployeeView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// email
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

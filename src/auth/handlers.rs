use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::{
        auth::{AuthUser, bearer_token},
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_dummy, verify_password},
    },
    config::Config,
    error::{ApiError, FieldError},
    model::{
        employee::EmployeeView,
        role::Role,
        user::{NewUser, User, UserView},
    },
    models::{LoginReq, MeResponse, RegisterReq, TokenResponse, TokenType},
    response,
    store::PayrollStore,
    utils::email_index::EmailIndex,
};

const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 128;

fn is_plausible_email(email: &str) -> bool {
    if email.len() > 255 || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn validate_registration(req: &RegisterReq) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let name = req.name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "name is required"));
    } else if name.chars().count() > 100 {
        errors.push(FieldError::new("name", "name must be at most 100 characters"));
    }

    if !is_plausible_email(req.email.trim()) {
        errors.push(FieldError::new("email", "email must be a valid email address"));
    }

    let len = req.password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        errors.push(FieldError::new(
            "password",
            format!(
                "password must be between {} and {} characters",
                MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
            ),
        ));
    }

    errors
}

/// Issues an access/refresh pair and records the refresh token's id.
async fn issue_tokens(
    user: &User,
    store: &dyn PayrollStore,
    config: &Config,
) -> Result<TokenResponse, ApiError> {
    let token = generate_access_token(
        user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        ApiError::Internal
    })?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign refresh token");
        ApiError::Internal
    })?;

    debug!(user_id = user.id, jti = %refresh_claims.jti, "Storing refresh token");
    store
        .store_refresh_token(user.id, &refresh_claims.jti, refresh_claims.expires_at())
        .await?;

    Ok(TokenResponse {
        token,
        refresh_token,
        token_type: "Bearer",
        expires_in: config.access_token_ttl,
        user: UserView::from(user),
    })
}

/// Register a user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = UserView),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin registration is disabled"),
        (status = 409, description = "Email already registered"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip_all, fields(email = %payload.email))]
pub async fn register(
    payload: web::Json<RegisterReq>,
    store: web::Data<dyn PayrollStore>,
    email_index: web::Data<EmailIndex>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let errors = validate_registration(&payload);
    if !errors.is_empty() {
        info!("Registration rejected by validation");
        return Err(ApiError::Validation(errors));
    }

    let role = payload.role.unwrap_or_default();
    if role == Role::Admin && !config.allow_admin_signup {
        warn!("Admin self-registration attempted while disabled");
        return Err(ApiError::Forbidden("Admin registration is disabled"));
    }

    let email = payload.email.trim().to_lowercase();
    if !email_index.is_available(&email, store.get_ref()).await? {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::Internal
    })?;

    let user = store
        .create_user(NewUser {
            name: payload.name.trim().to_string(),
            email,
            password: hashed,
            role,
        })
        .await?;

    email_index.insert(&user.email).await;
    info!(user_id = user.id, role = %user.role, "User registered");

    Ok(response::created("User registered successfully", UserView::from(&user)))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip_all, fields(email = %payload.email))]
pub async fn login(
    payload: web::Json<LoginReq>,
    store: web::Data<dyn PayrollStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let mut errors = Vec::new();
    if payload.email.trim().is_empty() {
        errors.push(FieldError::new("email", "email is required"));
    }
    if payload.password.is_empty() {
        errors.push(FieldError::new("password", "password is required"));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = match store.find_user_by_email(payload.email.trim()).await? {
        Some(user) => user,
        None => {
            verify_dummy(&payload.password);
            info!("Invalid credentials: user not found");
            return Err(ApiError::Unauthorized("Invalid credentials"));
        }
    };

    if let Err(e) = verify_password(&payload.password, &user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let tokens = issue_tokens(&user, store.get_ref(), &config).await?;

    if let Err(e) = store.touch_last_login(user.id).await {
        // not fatal for the login itself
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = user.id, "Login successful");
    Ok(response::ok_with_message("Login successful", tokens))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenResponse),
        (status = 401, description = "Refresh token invalid, expired or already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<dyn PayrollStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(req.headers())?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized("Refresh token required"));
    }

    // revoke first: a token can only ever be exchanged once
    let user_id = store
        .revoke_refresh_token(&claims.jti)
        .await?
        .ok_or(ApiError::Unauthorized("Refresh token revoked or expired"))?;

    // reload so role changes apply to the new tokens
    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or(ApiError::Unauthorized("User no longer exists"))?;

    let tokens = issue_tokens(&user, store.get_ref(), &config).await?;
    debug!(user_id, "Refresh token rotated");

    Ok(response::ok(tokens))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logged out (also returned for unknown tokens)")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<dyn PayrollStore>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Ok(token) = bearer_token(req.headers()) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    // idempotent
    if let Err(e) = store.revoke_refresh_token(&claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

/// Current user and, when linked, their employee profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
) -> Result<HttpResponse, ApiError> {
    let user = store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or(ApiError::Unauthorized("User no longer exists"))?;

    let employee = store
        .find_employee_by_user(user.id)
        .await?
        .map(EmployeeView::from);

    Ok(response::ok(MeResponse {
        user: UserView::from(&user),
        employee,
    }))
}

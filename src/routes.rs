use crate::{
    api::{dashboard, employee, payroll},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::ApiError,
    response,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, middleware::from_fn, web};
use std::sync::Arc;

/// Routes malformed JSON bodies, query strings and path segments into the
/// standard error envelope.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(64 * 1024)
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    );
}

async fn health() -> HttpResponse {
    response::message("ok")
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .milliseconds_per_request(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            // only fails for a zero period or burst, both excluded above
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    extractor_configs(cfg);

    cfg.route("/health", web::get().to(health));

    // Public auth routes; /auth/me is the only one behind the token check.
    cfg.service(
        web::scope(&format!("{}/auth", config.api_prefix))
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::get().to(handlers::me)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/employee")
                    // /employee
                    .service(web::resource("").route(web::get().to(employee::list_employees)))
                    // /employee/add
                    .service(web::resource("/add").route(web::post().to(employee::add_employee)))
                    // /employee/me
                    .service(web::resource("/me").route(web::get().to(employee::my_employee)))
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(web::resource("").route(web::get().to(payroll::list_payrolls)))
                    // /payroll/run
                    .service(web::resource("/run").route(web::post().to(payroll::run)))
                    // /payroll/process
                    .service(web::resource("/process").route(web::post().to(payroll::process)))
                    // /payroll/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(payroll::employee_payrolls)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .service(web::resource("/metrics").route(web::get().to(dashboard::metrics))),
            ),
    );
}

// LOGIN
//  ├─ token (access, 15 min)
//  └─ refreshToken (7 days)

// API REQUEST
//  └─ Authorization: Bearer <token>

// ACCESS EXPIRED
//  └─ POST /auth/refresh with Authorization: Bearer <refreshToken>
//       └─ old refresh token revoked, new pair returned

use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use payroll::{
    AppState, Config,
    db::init_db,
    docs::ApiDoc,
    logging::init_logging,
    store::{MySqlStore, PayrollStore},
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    let _guard = init_logging(&config);

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.database_max_connections).await?;
    let store: Arc<dyn PayrollStore> = Arc::new(MySqlStore::new(pool.clone()));

    let server_addr = config.server_addr.clone();
    let state = AppState::new(store, config);

    let filter_index = state.email_index.clone();
    let filter_pool = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = filter_index.warmup_filter(&filter_pool, 100).await {
            error!(error = ?e, "Failed to warm up email filter");
        }
    });

    let cache_index = state.email_index.clone();
    actix_web::rt::spawn(async move {
        // last 30 days of active users, in batches of 250
        if let Err(e) = cache_index.warmup_cache(&pool, 30, 250).await {
            error!(error = ?e, "Failed to warm up email cache");
        }
    });

    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so the UI's JS/CSS assets resolve
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(|cfg| state.configure(cfg))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await
    .context("Server error")
}

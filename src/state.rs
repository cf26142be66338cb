use std::sync::Arc;

use actix_web::web::{self, Data};

use crate::config::Config;
use crate::routes;
use crate::store::PayrollStore;
use crate::utils::email_index::EmailIndex;

/// Shared handles every worker registers as app data.
#[derive(Clone)]
pub struct AppState {
    pub store: Data<dyn PayrollStore>,
    pub email_index: Data<EmailIndex>,
    pub config: Data<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn PayrollStore>, config: Config) -> Self {
        Self {
            store: Data::from(store),
            email_index: Data::new(EmailIndex::new()),
            config: Data::new(config),
        }
    }

    /// Registers app data and the full route table.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.store.clone())
            .app_data(self.email_index.clone())
            .app_data(self.config.clone());
        routes::configure(cfg, self.config.get_ref().clone());
    }
}

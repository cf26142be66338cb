pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod logging;
pub mod model;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

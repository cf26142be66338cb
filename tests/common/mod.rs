#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::test::TestRequest;
use payroll::auth::jwt::generate_access_token;
use payroll::model::employee::{Employee, NewEmployee};
use payroll::model::role::Role;
use payroll::model::user::{NewUser, User};
use payroll::store::{InMemoryStore, PayrollStore};
use payroll::{AppState, Config};

pub const SECRET: &str = "integration-test-secret";

/// Builds the real route table over `$state` and returns the test service.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(actix_web::App::new().configure(|cfg| $state.configure(cfg)))
            .await
    };
}

/// Sends a request and returns `(status, body)`. An empty body reads as
/// `Null`, a non-JSON body (the governor's 429) as a JSON string.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body = actix_web::test::read_body(resp).await;
        let json: serde_json::Value = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        };
        (status, json)
    }};
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        database_max_connections: 1,
        jwt_secret: SECRET.to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 1000,
        rate_register_per_min: 1000,
        rate_refresh_per_min: 1000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".to_string(),
        allow_admin_signup: false,
        log_dir: "logs".to_string(),
        log_level: tracing::Level::INFO,
    }
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(store.clone(), config);
        Self { store, state }
    }

    /// A user whose password hash is a placeholder: good for token-based
    /// tests, not for login.
    pub async fn user(&self, email: &str, role: Role) -> User {
        self.store
            .create_user(NewUser {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password: "placeholder".to_string(),
                role,
            })
            .await
            .expect("seed user")
    }

    pub async fn employee(&self, user: &User, base: f64, allowance: f64, deduction: f64) -> Employee {
        self.store
            .create_employee(NewEmployee {
                user_id: user.id,
                base_salary: base,
                allowance,
                deduction,
            })
            .await
            .expect("seed employee")
    }

    pub async fn admin_token(&self) -> String {
        let admin = self.user("admin@company.io", Role::Admin).await;
        token_for(&admin)
    }
}

pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.email, user.role, SECRET, 900).expect("sign token")
}

fn peer() -> SocketAddr {
    "203.0.113.7:40000".parse().expect("socket addr")
}

// The governor keys on the peer IP, so every request needs one.
pub fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri).peer_addr(peer())
}

pub fn post(uri: &str) -> TestRequest {
    TestRequest::post().uri(uri).peer_addr(peer())
}

pub fn put(uri: &str) -> TestRequest {
    TestRequest::put().uri(uri).peer_addr(peer())
}

pub fn delete(uri: &str) -> TestRequest {
    TestRequest::delete().uri(uri).peer_addr(peer())
}

pub fn bearer(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", token)))
}

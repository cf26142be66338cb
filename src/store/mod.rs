//! Persistence seam for users, employees, payroll snapshots and refresh
//! tokens. Handlers and services only see [`PayrollStore`]; `MySqlStore`
//! backs the server and `InMemoryStore` backs the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::Display;

use crate::model::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::model::payroll::{NewPayroll, PayPeriod, Payroll, PeriodTotals};
use crate::model::user::{NewUser, User};

pub mod memory;
pub mod mysql;

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Display)]
pub enum StoreError {
    /// A uniqueness rule was violated.
    #[display(fmt = "{}", _0)]
    Conflict(String),
    /// A referenced row is missing, or a row is still referenced.
    #[display(fmt = "{}", _0)]
    Reference(String),
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub const DUPLICATE_EMAIL: &str = "Email already registered";
pub const DUPLICATE_EMPLOYEE: &str = "User already has an employee profile";
pub const DUPLICATE_PAYROLL: &str = "Payroll already processed for this period";
pub const MISSING_USER: &str = "Referenced user does not exist";
pub const MISSING_EMPLOYEE: &str = "Referenced employee does not exist";
pub const EMPLOYEE_HAS_PAYROLL: &str = "Employee has payroll history and cannot be deleted";

#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
    /// Case-insensitive substring of the user's name or email.
    pub search: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PayrollQuery {
    pub month: Option<u8>,
    pub year: Option<u16>,
    pub employee_id: Option<u64>,
    pub page: u32,
    pub per_page: u32,
}

impl EmployeeQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

impl PayrollQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    // users
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: u64) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;
    async fn touch_last_login(&self, user_id: u64) -> StoreResult<()>;

    // refresh tokens
    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;
    /// Revokes an active, unexpired token and returns its owner. `None` when
    /// the token is unknown, already revoked or expired.
    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<Option<u64>>;

    // employees
    async fn create_employee(&self, employee: NewEmployee) -> StoreResult<Employee>;
    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>>;
    async fn find_employee_by_user(&self, user_id: u64) -> StoreResult<Option<Employee>>;
    async fn list_employees(&self, query: &EmployeeQuery) -> StoreResult<(Vec<Employee>, u64)>;
    /// Every employee, ordered by id.
    async fn all_employees(&self) -> StoreResult<Vec<Employee>>;
    async fn update_employee(
        &self,
        id: u64,
        changes: &EmployeeChanges,
    ) -> StoreResult<Option<Employee>>;
    /// Returns false when no such employee exists.
    async fn delete_employee(&self, id: u64) -> StoreResult<bool>;
    async fn count_employees(&self) -> StoreResult<u64>;

    // payroll
    async fn find_payroll(
        &self,
        employee_id: u64,
        period: PayPeriod,
    ) -> StoreResult<Option<Payroll>>;
    async fn insert_payroll(&self, payroll: NewPayroll) -> StoreResult<Payroll>;
    async fn list_payrolls(&self, query: &PayrollQuery) -> StoreResult<(Vec<Payroll>, u64)>;
    async fn period_totals(&self, period: PayPeriod) -> StoreResult<PeriodTotals>;
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::{
    DUPLICATE_EMAIL, DUPLICATE_EMPLOYEE, DUPLICATE_PAYROLL, EMPLOYEE_HAS_PAYROLL, EmployeeQuery,
    MISSING_EMPLOYEE, MISSING_USER, PayrollQuery, PayrollStore, StoreError, StoreResult,
};
use crate::model::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::model::payroll::{NewPayroll, PayPeriod, Payroll, PeriodTotals};
use crate::model::role::Role;
use crate::model::user::{NewUser, User};

const EMPLOYEE_SELECT: &str = r#"
    SELECT e.id, e.user_id, u.name, u.email, e.base_salary, e.allowance, e.deduction,
           e.created_at, e.updated_at
    FROM employees e
    JOIN users u ON u.id = e.user_id
"#;

const USER_COLUMNS: &str = "id, name, email, password, role, created_at, last_login_at";

const PAYROLL_COLUMNS: &str = r#"
    id, employee_id, month, year, base_salary, allowance, deduction,
    gross_salary, net_salary, processed_at
"#;

#[derive(FromRow)]
struct UserSql {
    id: u64,
    name: String,
    email: String,
    password: String,
    role: String,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserSql> for User {
    type Error = StoreError;

    fn try_from(row: UserSql) -> Result<Self, Self::Error> {
        let role = Role::from_db(&row.role).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown role {:?} for user {}", row.role, row.id).into(),
            ))
        })?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password: row.password,
            role,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        })
    }
}

#[derive(FromRow)]
struct EmployeeSql {
    id: u64,
    user_id: u64,
    name: String,
    email: String,
    base_salary: f64,
    allowance: f64,
    deduction: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EmployeeSql> for Employee {
    fn from(row: EmployeeSql) -> Self {
        Employee {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            base_salary: row.base_salary,
            allowance: row.allowance,
            deduction: row.deduction,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PayrollSql {
    id: u64,
    employee_id: u64,
    month: u8,
    year: u16,
    base_salary: f64,
    allowance: f64,
    deduction: f64,
    gross_salary: f64,
    net_salary: f64,
    processed_at: DateTime<Utc>,
}

impl From<PayrollSql> for Payroll {
    fn from(row: PayrollSql) -> Self {
        Payroll {
            id: row.id,
            employee_id: row.employee_id,
            month: row.month,
            year: row.year,
            base_salary: row.base_salary,
            allowance: row.allowance,
            deduction: row.deduction,
            gross_salary: row.gross_salary,
            net_salary: row.net_salary,
            processed_at: row.processed_at,
        }
    }
}

#[derive(FromRow)]
struct TotalsSql {
    payroll_count: i64,
    total_gross: f64,
    total_deductions: f64,
    total_net: f64,
}

/// Maps unique-key and foreign-key violations to domain errors; everything
/// else stays a database error.
fn classify(e: sqlx::Error, on_unique: &str, on_foreign_key: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(on_unique.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::Reference(on_foreign_key.to_string());
        }
    }
    StoreError::Database(e)
}

fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped.to_lowercase())
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_employee(&self, column: &str, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("{} WHERE e.{} = ?", EMPLOYEE_SELECT, column);
        let row = sqlx::query_as::<_, EmployeeSql>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::from))
    }

    async fn fetch_payroll_by_id(&self, id: u64) -> StoreResult<Option<Payroll>> {
        let sql = format!("SELECT {} FROM payroll WHERE id = ?", PAYROLL_COLUMNS);
        let row = sqlx::query_as::<_, PayrollSql>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Payroll::from))
    }
}

#[async_trait]
impl PayrollStore for MySqlStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let result = sqlx::query(
            r#"INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)"#,
        )
        .bind(&user.name)
        .bind(user.email.to_lowercase())
        .bind(&user.password)
        .bind(user.role.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, DUPLICATE_EMAIL, MISSING_USER))?;

        self.find_user_by_id(result.last_insert_id())
            .await?
            .ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn find_user_by_id(&self, id: u64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        sqlx::query_as::<_, UserSql>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        sqlx::query_as::<_, UserSql>(&sql)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
        )
        .bind(email.to_lowercase())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    async fn touch_last_login(&self, user_id: u64) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "Refresh token already stored", MISSING_USER))?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<Option<u64>> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE jti = ? AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let user_id =
            sqlx::query_scalar::<_, u64>("SELECT user_id FROM refresh_tokens WHERE jti = ?")
                .bind(jti)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user_id)
    }

    async fn create_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees (user_id, base_salary, allowance, deduction)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(employee.user_id)
        .bind(employee.base_salary)
        .bind(employee.allowance)
        .bind(employee.deduction)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, DUPLICATE_EMPLOYEE, MISSING_USER))?;

        self.fetch_employee("id", result.last_insert_id())
            .await?
            .ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        self.fetch_employee("id", id).await
    }

    async fn find_employee_by_user(&self, user_id: u64) -> StoreResult<Option<Employee>> {
        self.fetch_employee("user_id", user_id).await
    }

    async fn list_employees(&self, query: &EmployeeQuery) -> StoreResult<(Vec<Employee>, u64)> {
        let pattern = query.search.as_deref().map(like_pattern);
        let where_clause = if pattern.is_some() {
            "WHERE (LOWER(u.name) LIKE ? OR u.email LIKE ?)"
        } else {
            ""
        };

        let count_sql = format!(
            "SELECT COUNT(*) FROM employees e JOIN users u ON u.id = e.user_id {}",
            where_clause
        );
        debug!(sql = %count_sql, "Counting employees");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p).bind(p);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "{} {} ORDER BY e.id DESC LIMIT ? OFFSET ?",
            EMPLOYEE_SELECT, where_clause
        );
        debug!(sql = %data_sql, page = query.page, per_page = query.per_page, "Fetching employees");

        let mut data_query = sqlx::query_as::<_, EmployeeSql>(&data_sql);
        if let Some(p) = &pattern {
            data_query = data_query.bind(p).bind(p);
        }
        let rows = data_query
            .bind(u64::from(query.per_page))
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(Employee::from).collect(),
            total.max(0) as u64,
        ))
    }

    async fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("{} ORDER BY e.id ASC", EMPLOYEE_SELECT);
        let rows = sqlx::query_as::<_, EmployeeSql>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn update_employee(
        &self,
        id: u64,
        changes: &EmployeeChanges,
    ) -> StoreResult<Option<Employee>> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET base_salary = COALESCE(?, base_salary),
                allowance = COALESCE(?, allowance),
                deduction = COALESCE(?, deduction),
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(changes.base_salary)
        .bind(changes.allowance)
        .bind(changes.deduction)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_employee("id", id).await
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, DUPLICATE_EMPLOYEE, EMPLOYEE_HAS_PAYROLL))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_employees(&self) -> StoreResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn find_payroll(
        &self,
        employee_id: u64,
        period: PayPeriod,
    ) -> StoreResult<Option<Payroll>> {
        let sql = format!(
            "SELECT {} FROM payroll WHERE employee_id = ? AND month = ? AND year = ?",
            PAYROLL_COLUMNS
        );
        let row = sqlx::query_as::<_, PayrollSql>(&sql)
            .bind(employee_id)
            .bind(period.month())
            .bind(period.year())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Payroll::from))
    }

    async fn insert_payroll(&self, payroll: NewPayroll) -> StoreResult<Payroll> {
        let salary = payroll.salary;
        let result = sqlx::query(
            r#"
            INSERT INTO payroll
            (employee_id, month, year, base_salary, allowance, deduction, gross_salary, net_salary)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payroll.employee_id)
        .bind(payroll.period.month())
        .bind(payroll.period.year())
        .bind(salary.base_salary)
        .bind(salary.allowance)
        .bind(salary.deduction)
        .bind(salary.gross_salary)
        .bind(salary.net_salary)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, DUPLICATE_PAYROLL, MISSING_EMPLOYEE))?;

        self.fetch_payroll_by_id(result.last_insert_id())
            .await?
            .ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn list_payrolls(&self, query: &PayrollQuery) -> StoreResult<(Vec<Payroll>, u64)> {
        let mut conditions = Vec::new();
        if query.month.is_some() {
            conditions.push("month = ?");
        }
        if query.year.is_some() {
            conditions.push("year = ?");
        }
        if query.employee_id.is_some() {
            conditions.push("employee_id = ?");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM payroll {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(m) = query.month {
            count_query = count_query.bind(m);
        }
        if let Some(y) = query.year {
            count_query = count_query.bind(y);
        }
        if let Some(id) = query.employee_id {
            count_query = count_query.bind(id);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {} FROM payroll {} ORDER BY year DESC, month DESC, employee_id DESC LIMIT ? OFFSET ?",
            PAYROLL_COLUMNS, where_clause
        );
        debug!(sql = %data_sql, "Fetching payrolls");

        let mut data_query = sqlx::query_as::<_, PayrollSql>(&data_sql);
        if let Some(m) = query.month {
            data_query = data_query.bind(m);
        }
        if let Some(y) = query.year {
            data_query = data_query.bind(y);
        }
        if let Some(id) = query.employee_id {
            data_query = data_query.bind(id);
        }
        let rows = data_query
            .bind(u64::from(query.per_page))
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(Payroll::from).collect(),
            total.max(0) as u64,
        ))
    }

    async fn period_totals(&self, period: PayPeriod) -> StoreResult<PeriodTotals> {
        let row = sqlx::query_as::<_, TotalsSql>(
            r#"
            SELECT COUNT(*) AS payroll_count,
                   CAST(COALESCE(SUM(gross_salary), 0) AS DOUBLE) AS total_gross,
                   CAST(COALESCE(SUM(deduction), 0) AS DOUBLE) AS total_deductions,
                   CAST(COALESCE(SUM(net_salary), 0) AS DOUBLE) AS total_net
            FROM payroll
            WHERE month = ? AND year = ?
            "#,
        )
        .bind(period.month())
        .bind(period.year())
        .fetch_one(&self.pool)
        .await?;

        Ok(PeriodTotals {
            payroll_count: row.payroll_count.max(0) as u64,
            total_gross: row.total_gross,
            total_deductions: row.total_deductions,
            total_net: row.total_net,
        })
    }
}

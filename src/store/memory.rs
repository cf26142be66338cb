use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    DUPLICATE_EMAIL, DUPLICATE_EMPLOYEE, DUPLICATE_PAYROLL, EMPLOYEE_HAS_PAYROLL, EmployeeQuery,
    MISSING_EMPLOYEE, MISSING_USER, PayrollQuery, PayrollStore, StoreError, StoreResult,
};
use crate::model::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::model::payroll::{NewPayroll, PayPeriod, Payroll, PeriodTotals};
use crate::model::user::{NewUser, User};

struct EmployeeRow {
    id: u64,
    user_id: u64,
    base_salary: f64,
    allowance: f64,
    deduction: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct RefreshRow {
    user_id: u64,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Default)]
struct State {
    next_id: u64,
    users: Vec<User>,
    employees: Vec<EmployeeRow>,
    payrolls: Vec<Payroll>,
    refresh_tokens: HashMap<String, RefreshRow>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Joins an employee row with its user, like the SQL store's `JOIN`.
    fn populate(&self, row: &EmployeeRow) -> Option<Employee> {
        let user = self.user(row.user_id)?;
        Some(Employee {
            id: row.id,
            user_id: row.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            base_salary: row.base_salary,
            allowance: row.allowance,
            deduction: row.deduction,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn employee(&self, id: u64) -> Option<Employee> {
        self.employees
            .iter()
            .find(|e| e.id == id)
            .and_then(|row| self.populate(row))
    }
}

/// Same rules as the MySQL schema (unique keys, foreign keys), kept in
/// process memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PayrollStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.lock();
        let email = user.email.to_lowercase();
        if state.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        let user = User {
            id: state.next_id(),
            name: user.name,
            email,
            password: user.password,
            role: user.role,
            created_at: Utc::now(),
            last_login_at: None,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.lock().user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let email = email.to_lowercase();
        Ok(self.lock().users.iter().any(|u| u.email == email))
    }

    async fn touch_last_login(&self, user_id: u64) -> StoreResult<()> {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == user_id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut state = self.lock();
        if state.user(user_id).is_none() {
            return Err(StoreError::Reference(MISSING_USER.to_string()));
        }
        if state.refresh_tokens.contains_key(jti) {
            return Err(StoreError::Conflict("Refresh token already stored".to_string()));
        }
        state.refresh_tokens.insert(
            jti.to_string(),
            RefreshRow {
                user_id,
                expires_at,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<Option<u64>> {
        let mut state = self.lock();
        let now = Utc::now();
        match state.refresh_tokens.get_mut(jti) {
            Some(row) if !row.revoked && row.expires_at > now => {
                row.revoked = true;
                Ok(Some(row.user_id))
            }
            _ => Ok(None),
        }
    }

    async fn create_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let mut state = self.lock();
        if state.user(employee.user_id).is_none() {
            return Err(StoreError::Reference(MISSING_USER.to_string()));
        }
        if state.employees.iter().any(|e| e.user_id == employee.user_id) {
            return Err(StoreError::Conflict(DUPLICATE_EMPLOYEE.to_string()));
        }
        let now = Utc::now();
        let id = state.next_id();
        state.employees.push(EmployeeRow {
            id,
            user_id: employee.user_id,
            base_salary: employee.base_salary,
            allowance: employee.allowance,
            deduction: employee.deduction,
            created_at: now,
            updated_at: now,
        });
        state
            .employee(id)
            .ok_or_else(|| StoreError::Reference(MISSING_USER.to_string()))
    }

    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.lock().employee(id))
    }

    async fn find_employee_by_user(&self, user_id: u64) -> StoreResult<Option<Employee>> {
        let state = self.lock();
        Ok(state
            .employees
            .iter()
            .find(|e| e.user_id == user_id)
            .and_then(|row| state.populate(row)))
    }

    async fn list_employees(&self, query: &EmployeeQuery) -> StoreResult<(Vec<Employee>, u64)> {
        let state = self.lock();
        let needle = query.search.as_deref().map(str::to_lowercase);

        // newest first, like the SQL store
        let matching: Vec<Employee> = state
            .employees
            .iter()
            .rev()
            .filter_map(|row| state.populate(row))
            .filter(|e| match &needle {
                Some(n) => e.name.to_lowercase().contains(n) || e.email.contains(n),
                None => true,
            })
            .collect();

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();
        Ok((items, total))
    }

    async fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        let state = self.lock();
        Ok(state
            .employees
            .iter()
            .filter_map(|row| state.populate(row))
            .collect())
    }

    async fn update_employee(
        &self,
        id: u64,
        changes: &EmployeeChanges,
    ) -> StoreResult<Option<Employee>> {
        let mut state = self.lock();
        let Some(row) = state.employees.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.base_salary {
            row.base_salary = v;
        }
        if let Some(v) = changes.allowance {
            row.allowance = v;
        }
        if let Some(v) = changes.deduction {
            row.deduction = v;
        }
        row.updated_at = Utc::now();
        Ok(state.employee(id))
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<bool> {
        let mut state = self.lock();
        if !state.employees.iter().any(|e| e.id == id) {
            return Ok(false);
        }
        if state.payrolls.iter().any(|p| p.employee_id == id) {
            return Err(StoreError::Reference(EMPLOYEE_HAS_PAYROLL.to_string()));
        }
        state.employees.retain(|e| e.id != id);
        Ok(true)
    }

    async fn count_employees(&self) -> StoreResult<u64> {
        Ok(self.lock().employees.len() as u64)
    }

    async fn find_payroll(
        &self,
        employee_id: u64,
        period: PayPeriod,
    ) -> StoreResult<Option<Payroll>> {
        Ok(self
            .lock()
            .payrolls
            .iter()
            .find(|p| {
                p.employee_id == employee_id
                    && p.month == period.month()
                    && p.year == period.year()
            })
            .cloned())
    }

    async fn insert_payroll(&self, payroll: NewPayroll) -> StoreResult<Payroll> {
        let mut state = self.lock();
        if !state.employees.iter().any(|e| e.id == payroll.employee_id) {
            return Err(StoreError::Reference(MISSING_EMPLOYEE.to_string()));
        }
        let duplicate = state.payrolls.iter().any(|p| {
            p.employee_id == payroll.employee_id
                && p.month == payroll.period.month()
                && p.year == payroll.period.year()
        });
        if duplicate {
            return Err(StoreError::Conflict(DUPLICATE_PAYROLL.to_string()));
        }
        let salary = payroll.salary;
        let row = Payroll {
            id: state.next_id(),
            employee_id: payroll.employee_id,
            month: payroll.period.month(),
            year: payroll.period.year(),
            base_salary: salary.base_salary,
            allowance: salary.allowance,
            deduction: salary.deduction,
            gross_salary: salary.gross_salary,
            net_salary: salary.net_salary,
            processed_at: Utc::now(),
        };
        state.payrolls.push(row.clone());
        Ok(row)
    }

    async fn list_payrolls(&self, query: &PayrollQuery) -> StoreResult<(Vec<Payroll>, u64)> {
        let state = self.lock();
        let mut matching: Vec<Payroll> = state
            .payrolls
            .iter()
            .filter(|p| query.month.is_none_or(|m| p.month == m))
            .filter(|p| query.year.is_none_or(|y| p.year == y))
            .filter(|p| query.employee_id.is_none_or(|id| p.employee_id == id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            (b.year, b.month, b.employee_id).cmp(&(a.year, a.month, a.employee_id))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();
        Ok((items, total))
    }

    async fn period_totals(&self, period: PayPeriod) -> StoreResult<PeriodTotals> {
        let state = self.lock();
        Ok(state
            .payrolls
            .iter()
            .filter(|p| p.month == period.month() && p.year == period.year())
            .fold(PeriodTotals::default(), |mut t, p| {
                t.payroll_count += 1;
                t.total_gross += p.gross_salary;
                t.total_deductions += p.deduction;
                t.total_net += p.net_salary;
                t
            }))
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::service::salary::{SalaryBreakdown, SalaryInput};

/// An employee row joined with the user it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub base_salary: f64,
    pub allowance: f64,
    pub deduction: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub user_id: u64,
    pub base_salary: f64,
    pub allowance: f64,
    pub deduction: f64,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges {
    pub base_salary: Option<f64>,
    pub allowance: Option<f64>,
    pub deduction: Option<f64>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.base_salary.is_none() && self.allowance.is_none() && self.deduction.is_none()
    }

    pub fn apply(&self, employee: &Employee) -> SalaryInput {
        SalaryInput::new(
            self.base_salary.unwrap_or(employee.base_salary),
            self.allowance.unwrap_or(employee.allowance),
            self.deduction.unwrap_or(employee.deduction),
        )
    }
}

impl Employee {
    pub fn salary_input(&self) -> SalaryInput {
        SalaryInput::new(self.base_salary, self.allowance, self.deduction)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "userId": 7,
    "name": "Jane Doe",
    "email": "jane@company.com",
    "baseSalary": 50000.0,
    "allowance": 5000.0,
    "deduction": 2000.0,
    "grossSalary": 55000.0,
    "netSalary": 53000.0,
    "createdAt": "2026-01-01T09:00:00Z",
    "updatedAt": "2026-01-01T09:00:00Z"
}))]
pub struct EmployeeView {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub base_salary: f64,
    pub allowance: f64,
    pub deduction: f64,
    /// Derived, never stored.
    pub gross_salary: f64,
    /// Derived, never stored.
    pub net_salary: f64,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl From<Employee> for EmployeeView {
    fn from(e: Employee) -> Self {
        let SalaryBreakdown {
            gross_salary,
            net_salary,
            ..
        } = e.salary_input().breakdown();

        Self {
            id: e.id,
            user_id: e.user_id,
            name: e.name,
            email: e.email,
            base_salary: e.base_salary,
            allowance: e.allowance,
            deduction: e.deduction,
            gross_salary,
            net_salary,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

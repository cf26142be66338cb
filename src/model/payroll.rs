use chrono::{DateTime, Datelike, Utc};
use derive_more::Display;
use serde::Serialize;
use utoipa::ToSchema;

use crate::service::salary::SalaryBreakdown;

pub const MIN_YEAR: u16 = 2000;
pub const MAX_YEAR: u16 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PeriodError {
    #[display(fmt = "month must be between 1 and 12")]
    Month,
    #[display(fmt = "year must be between 2000 and 2100")]
    Year,
}

impl PeriodError {
    pub fn field(&self) -> &'static str {
        match self {
            PeriodError::Month => "month",
            PeriodError::Year => "year",
        }
    }
}

impl std::error::Error for PeriodError {}

/// A payroll period: one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(fmt = "{:02}/{}", month, year)]
pub struct PayPeriod {
    month: u8,
    year: u16,
}

impl PayPeriod {
    pub fn new(month: u8, year: u16) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::Month);
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(PeriodError::Year);
        }
        Ok(Self { month, year })
    }

    /// Validates a month/year pair coming from a request.
    pub fn from_request(month: u8, year: u16) -> Result<Self, Vec<PeriodError>> {
        let mut errors = Vec::new();
        if !(1..=12).contains(&month) {
            errors.push(PeriodError::Month);
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            errors.push(PeriodError::Year);
        }
        if errors.is_empty() {
            Ok(Self { month, year })
        } else {
            Err(errors)
        }
    }

    pub fn current() -> Self {
        let now = Utc::now();
        Self {
            month: now.month() as u8,
            year: now.year().clamp(MIN_YEAR as i32, MAX_YEAR as i32) as u16,
        }
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> u16 {
        self.year
    }
}

/// A processed payroll snapshot. Salary figures are copied from the
/// employee at processing time.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 12,
    "employeeId": 1,
    "month": 3,
    "year": 2026,
    "baseSalary": 50000.0,
    "allowance": 5000.0,
    "deduction": 2000.0,
    "grossSalary": 55000.0,
    "netSalary": 53000.0,
    "processedAt": "2026-03-31T18:00:00Z"
}))]
pub struct Payroll {
    pub id: u64,
    pub employee_id: u64,
    pub month: u8,
    pub year: u16,
    pub base_salary: f64,
    pub allowance: f64,
    pub deduction: f64,
    pub gross_salary: f64,
    pub net_salary: f64,
    #[schema(value_type = String, format = DateTime)]
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayroll {
    pub employee_id: u64,
    pub period: PayPeriod,
    pub salary: SalaryBreakdown,
}

/// Aggregates over all payroll rows of one period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodTotals {
    pub payroll_count: u64,
    pub total_gross: f64,
    pub total_deductions: f64,
    pub total_net: f64,
}

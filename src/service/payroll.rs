use derive_more::Display;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::model::payroll::{NewPayroll, PayPeriod, Payroll};
use crate::service::salary::{SalaryError, calculate_salary};
use crate::store::{PayrollStore, StoreError};

#[derive(Debug, Display)]
pub enum PayrollError {
    #[display(fmt = "Employee not found")]
    EmployeeNotFound,
    #[display(fmt = "Payroll already processed for this period")]
    AlreadyProcessed,
    #[display(fmt = "Invalid salary figures: {}", _0)]
    InvalidSalary(SalaryError),
    #[display(fmt = "{}", _0)]
    Store(StoreError),
}

impl std::error::Error for PayrollError {}

impl From<StoreError> for PayrollError {
    fn from(e: StoreError) -> Self {
        PayrollError::Store(e)
    }
}

impl From<PayrollError> for ApiError {
    fn from(e: PayrollError) -> Self {
        match e {
            PayrollError::EmployeeNotFound => ApiError::NotFound(e.to_string()),
            PayrollError::AlreadyProcessed => ApiError::Conflict(e.to_string()),
            PayrollError::InvalidSalary(salary) => salary.into(),
            PayrollError::Store(store) => store.into(),
        }
    }
}

/// Outcome of one employee inside a batch run.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRunResult {
    pub employee_id: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payroll: Option<Payroll>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRunSummary {
    #[schema(example = 3)]
    pub month: u8,
    #[schema(example = 2026)]
    pub year: u16,
    pub processed_count: usize,
    pub failed_count: usize,
    pub results: Vec<PayrollRunResult>,
}

/// Computes and stores one employee's payroll snapshot for `period`.
#[instrument(skip(store, period), fields(period = %period))]
pub async fn process_employee_payroll(
    store: &dyn PayrollStore,
    employee_id: u64,
    period: PayPeriod,
) -> Result<Payroll, PayrollError> {
    let employee = store
        .find_employee(employee_id)
        .await?
        .ok_or(PayrollError::EmployeeNotFound)?;

    if store.find_payroll(employee_id, period).await?.is_some() {
        return Err(PayrollError::AlreadyProcessed);
    }

    let salary = calculate_salary(employee.salary_input()).map_err(PayrollError::InvalidSalary)?;

    // The pre-check above can race with a concurrent run; the store's unique
    // key reports the loser as a conflict.
    let payroll = store
        .insert_payroll(NewPayroll {
            employee_id,
            period,
            salary,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => PayrollError::AlreadyProcessed,
            StoreError::Reference(_) => PayrollError::EmployeeNotFound,
            other => PayrollError::Store(other),
        })?;

    info!(payroll_id = payroll.id, net_salary = payroll.net_salary, "Payroll processed");
    Ok(payroll)
}

/// Runs payroll for every employee. One employee failing never stops the
/// batch; each outcome is reported in `results`, in employee id order.
#[instrument(skip(store, period), fields(period = %period))]
pub async fn run_payroll(
    store: &dyn PayrollStore,
    period: PayPeriod,
) -> Result<PayrollRunSummary, StoreError> {
    let employees = store.all_employees().await?;
    info!(employees = employees.len(), "Payroll run started");

    let mut results = Vec::with_capacity(employees.len());
    for employee in &employees {
        let result = match process_employee_payroll(store, employee.id, period).await {
            Ok(payroll) => PayrollRunResult {
                employee_id: employee.id,
                success: true,
                payroll: Some(payroll),
                error: None,
            },
            Err(e) => {
                warn!(employee_id = employee.id, error = %e, "Payroll failed for employee");
                let error = match e {
                    // don't leak driver details into the response
                    PayrollError::Store(StoreError::Database(_)) => "Internal server error".to_string(),
                    other => other.to_string(),
                };
                PayrollRunResult {
                    employee_id: employee.id,
                    success: false,
                    payroll: None,
                    error: Some(error),
                }
            }
        };
        results.push(result);
    }

    let processed_count = results.iter().filter(|r| r.success).count();
    let failed_count = results.len() - processed_count;
    info!(processed_count, failed_count, "Payroll run finished");

    Ok(PayrollRunSummary {
        month: period.month(),
        year: period.year(),
        processed_count,
        failed_count,
        results,
    })
}

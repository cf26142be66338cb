use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::model::payroll::PayPeriod;
use crate::store::{PayrollStore, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    #[schema(example = 3)]
    pub month: u8,
    #[schema(example = 2026)]
    pub year: u16,
    pub total_employees: u64,
    /// Payroll rows stored for the period.
    pub processed_payrolls: u64,
    /// Employees without a payroll row for the period.
    pub pending_payrolls: u64,
    pub total_gross: f64,
    pub total_deductions: f64,
    /// Sum of `netSalary` over the period's payroll rows.
    pub total_net_payroll: f64,
    pub average_net_salary: f64,
}

pub async fn collect_metrics(
    store: &dyn PayrollStore,
    period: PayPeriod,
) -> StoreResult<DashboardMetrics> {
    let total_employees = store.count_employees().await?;
    let totals = store.period_totals(period).await?;
    debug!(period = %period, total_employees, payrolls = totals.payroll_count, "Dashboard metrics collected");

    let average_net_salary = if totals.payroll_count == 0 {
        0.0
    } else {
        totals.total_net / totals.payroll_count as f64
    };

    Ok(DashboardMetrics {
        month: period.month(),
        year: period.year(),
        total_employees,
        processed_payrolls: totals.payroll_count,
        pending_payrolls: total_employees.saturating_sub(totals.payroll_count),
        total_gross: totals.total_gross,
        total_deductions: totals.total_deductions,
        total_net_payroll: totals.total_net,
        average_net_salary,
    })
}

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::payroll::{PayPeriod, Payroll, PeriodError},
    response::{self, Page, page_bounds},
    service::payroll::{process_employee_payroll, run_payroll},
    store::{PayrollQuery, PayrollStore},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RunPayroll {
    #[schema(example = 3)]
    pub month: u8,
    #[schema(example = 2026)]
    pub year: u16,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPayroll {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = 3)]
    pub month: u8,
    #[schema(example = 2026)]
    pub year: u16,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PayrollListQuery {
    /// Filter by month (1-12)
    pub month: Option<u8>,
    /// Filter by year
    pub year: Option<u16>,
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Items per page (1-100)
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPayrollResponse {
    pub items: Vec<Payroll>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

fn period_from(month: u8, year: u16) -> Result<PayPeriod, ApiError> {
    PayPeriod::from_request(month, year).map_err(ApiError::validation)
}

/// Checks optional month/year filters without requiring both.
fn check_filters(month: Option<u8>, year: Option<u16>) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if let Some(m) = month {
        if PayPeriod::new(m, 2000).is_err() {
            errors.push(PeriodError::Month);
        }
    }
    if let Some(y) = year {
        if PayPeriod::new(1, y).is_err() {
            errors.push(PeriodError::Year);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

/// Run payroll for every employee
#[utoipa::path(
    post,
    path = "/api/payroll/run",
    request_body = RunPayroll,
    responses(
        (status = 200, description = "Batch finished; per-employee outcomes in results", body = crate::service::payroll::PayrollRunSummary),
        (status = 400, description = "Invalid month or year"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
#[instrument(skip_all, fields(month = payload.month, year = payload.year))]
pub async fn run(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    payload: web::Json<RunPayroll>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let period = period_from(payload.month, payload.year)?;

    let summary = run_payroll(store.get_ref(), period).await?;

    let message = format!(
        "Payroll run for {} finished: {} processed, {} failed",
        period, summary.processed_count, summary.failed_count
    );
    info!("{}", message);
    Ok(response::ok_with_message(&message, summary))
}

/// Process payroll for one employee
#[utoipa::path(
    post,
    path = "/api/payroll/process",
    request_body = ProcessPayroll,
    responses(
        (status = 201, description = "Payroll processed", body = Payroll),
        (status = 400, description = "Invalid period or salary figures"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Payroll already processed for this period")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn process(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    payload: web::Json<ProcessPayroll>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let period = period_from(payload.month, payload.year)?;

    let payroll = process_employee_payroll(store.get_ref(), payload.employee_id, period).await?;

    Ok(response::created("Payroll processed successfully", payroll))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollListQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse),
        (status = 400, description = "Invalid month or year"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    query: web::Query<PayrollListQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    check_filters(query.month, query.year)?;

    let (page, per_page) = page_bounds(query.page, query.per_page, 10);
    let (items, total) = store
        .list_payrolls(&PayrollQuery {
            month: query.month,
            year: query.year,
            employee_id: None,
            page,
            per_page,
        })
        .await?;

    Ok(response::ok(Page {
        items,
        page,
        per_page,
        total,
    }))
}

/// Payroll history of one employee
#[utoipa::path(
    get,
    path = "/api/payroll/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        PayrollListQuery
    ),
    responses(
        (status = 200, body = PaginatedPayrollResponse),
        (status = 403, description = "Not your payroll"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn employee_payrolls(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
    query: web::Query<PayrollListQuery>,
) -> Result<HttpResponse, ApiError> {
    let employee = auth
        .readable_employee(store.get_ref(), path.into_inner())
        .await?;
    check_filters(query.month, query.year)?;

    let (page, per_page) = page_bounds(query.page, query.per_page, 12);
    let (items, total) = store
        .list_payrolls(&PayrollQuery {
            month: query.month,
            year: query.year,
            employee_id: Some(employee.id),
            page,
            per_page,
        })
        .await?;

    Ok(response::ok(Page {
        items,
        page,
        per_page,
        total,
    }))
}

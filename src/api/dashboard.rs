use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::payroll::PayPeriod,
    response,
    service::dashboard::collect_metrics,
    store::PayrollStore,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MetricsQuery {
    /// Defaults to the current month (UTC)
    pub month: Option<u8>,
    /// Defaults to the current year (UTC)
    pub year: Option<u16>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    params(MetricsQuery),
    responses(
        (status = 200, description = "Employee and payroll aggregates for the period", body = crate::service::dashboard::DashboardMetrics),
        (status = 400, description = "Invalid month or year"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn metrics(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    query: web::Query<MetricsQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let current = PayPeriod::current();
    let period = PayPeriod::from_request(
        query.month.unwrap_or(current.month()),
        query.year.unwrap_or(current.year()),
    )
    .map_err(ApiError::validation)?;

    let metrics = collect_metrics(store.get_ref(), period).await?;
    Ok(response::ok(metrics))
}

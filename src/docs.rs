use crate::api::employee::{CreateEmployee, EmployeeListResponse, UpdateEmployee};
use crate::api::payroll::{PaginatedPayrollResponse, ProcessPayroll, RunPayroll};
use crate::error::FieldError;
use crate::model::employee::EmployeeView;
use crate::model::payroll::Payroll;
use crate::model::role::Role;
use crate::model::user::UserView;
use crate::models::{LoginReq, MeResponse, RegisterReq, TokenResponse};
use crate::service::dashboard::DashboardMetrics;
use crate::service::payroll::{PayrollRunResult, PayrollRunSummary};
use crate::service::salary::SalaryBreakdown;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll API",
        version = "1.0.0",
        description = r#"
## Payroll & Employee Management

- **Auth**: register, login, refresh-token rotation, logout
- **Employees**: admin-managed salary profiles (base, allowance, deduction);
  gross and net are derived on read
- **Payroll**: per-employee or batch processing for a month/year; each run stores
  an immutable snapshot, one per employee and period
- **Dashboard**: headcount and payroll totals for a period

Every response uses the envelope `{"success", "message"?, "data"?, "errors"?}`.
Protected endpoints expect `Authorization: Bearer <token>`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::employee::add_employee,
        crate::api::employee::list_employees,
        crate::api::employee::my_employee,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::payroll::run,
        crate::api::payroll::process,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::employee_payrolls,

        crate::api::dashboard::metrics
    ),
    components(
        schemas(
            RegisterReq,
            LoginReq,
            TokenResponse,
            MeResponse,
            UserView,
            Role,
            CreateEmployee,
            UpdateEmployee,
            EmployeeView,
            EmployeeListResponse,
            RunPayroll,
            ProcessPayroll,
            Payroll,
            PayrollRunResult,
            PayrollRunSummary,
            PaginatedPayrollResponse,
            SalaryBreakdown,
            DashboardMetrics,
            FieldError
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and tokens"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Payroll", description = "Payroll processing and history"),
        (name = "Dashboard", description = "Aggregated metrics"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/me",
            "/api/employee/add",
            "/api/employee/{employee_id}",
            "/api/payroll/run",
            "/api/payroll/{employee_id}",
            "/api/dashboard/metrics",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}

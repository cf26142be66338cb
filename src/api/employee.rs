use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::employee::{EmployeeChanges, EmployeeView, NewEmployee},
    response::{self, Page, page_bounds},
    service::salary::SalaryInput,
    store::{EmployeeQuery, PayrollStore},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[schema(example = 5000.0)]
    #[serde(default)]
    pub allowance: f64,
    #[schema(example = 2000.0)]
    #[serde(default)]
    pub deduction: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    #[schema(example = 52000.0)]
    pub base_salary: Option<f64>,
    #[schema(example = 6000.0)]
    pub allowance: Option<f64>,
    #[schema(example = 2500.0)]
    pub deduction: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EmployeeListQuery {
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Items per page (1-100)
    pub per_page: Option<u32>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListResponse {
    pub items: Vec<EmployeeView>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: u64,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee/add",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = EmployeeView),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User already has an employee profile")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = payload.user_id))]
pub async fn add_employee(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    SalaryInput::new(payload.base_salary, payload.allowance, payload.deduction)
        .validate()
        .map_err(ApiError::validation)?;

    if store.find_user_by_id(payload.user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let employee = store
        .create_employee(NewEmployee {
            user_id: payload.user_id,
            base_salary: payload.base_salary,
            allowance: payload.allowance,
            deduction: payload.deduction,
        })
        .await?;

    info!(employee_id = employee.id, "Employee created");
    Ok(response::created(
        "Employee created successfully",
        EmployeeView::from(employee),
    ))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeListQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "Admin only")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    query: web::Query<EmployeeListQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let (page, per_page) = page_bounds(query.page, query.per_page, 20);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let (employees, total) = store
        .list_employees(&EmployeeQuery {
            search,
            page,
            per_page,
        })
        .await?;

    Ok(response::ok(Page {
        items: employees
            .into_iter()
            .map(EmployeeView::from)
            .collect::<Vec<_>>(),
        page,
        per_page,
        total,
    }))
}

/// The caller's own employee profile
#[utoipa::path(
    get,
    path = "/api/employee/me",
    responses(
        (status = 200, description = "Employee profile", body = EmployeeView),
        (status = 404, description = "No employee profile for this user")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn my_employee(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
) -> Result<HttpResponse, ApiError> {
    let employee = store
        .find_employee_by_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No employee profile for this user".to_string()))?;

    Ok(response::ok(EmployeeView::from(employee)))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeView),
        (status = 403, description = "Not your employee record"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee = auth
        .readable_employee(store.get_ref(), path.into_inner())
        .await?;

    Ok(response::ok(EmployeeView::from(employee)))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeView),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(employee_id = *path))]
pub async fn update_employee(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    let changes = EmployeeChanges {
        base_salary: body.base_salary,
        allowance: body.allowance,
        deduction: body.deduction,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No fields provided for update".to_string()));
    }

    let current = store
        .find_employee(employee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    changes
        .apply(&current)
        .validate()
        .map_err(ApiError::validation)?;

    let updated = store
        .update_employee(employee_id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    info!("Employee updated");
    Ok(response::ok_with_message(
        "Employee updated successfully",
        EmployeeView::from(updated),
    ))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee has payroll history")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    store: web::Data<dyn PayrollStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    if !store.delete_employee(employee_id).await? {
        return Err(ApiError::NotFound("Employee not found".to_string()));
    }

    info!(employee_id, "Employee deleted");
    Ok(response::message("Successfully deleted"))
}

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use common::{TestApp, bearer, delete, get, post, put, token_for};
use payroll::model::role::Role;
use serde_json::json;

#[actix_web::test]
async fn admin_adds_an_employee_with_derived_salary() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let app = init_app!(ctx.state);

    let (status, body) = send!(
        app,
        bearer(post("/api/employee/add"), &admin).set_json(json!({
            "userId": jane.id,
            "baseSalary": 50000.0,
            "allowance": 5000.0,
            "deduction": 2000.0
        }))
    );

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Employee created successfully");
    assert_eq!(body["data"]["userId"], jane.id);
    assert_eq!(body["data"]["email"], "jane@x.io");
    assert_eq!(body["data"]["grossSalary"], 55000.0);
    assert_eq!(body["data"]["netSalary"], 53000.0);
}

#[actix_web::test]
async fn add_employee_rejects_bad_input() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    ctx.employee(&jane, 1000.0, 0.0, 0.0).await;
    let app = init_app!(ctx.state);

    let (status, body) = send!(
        app,
        bearer(post("/api/employee/add"), &admin)
            .set_json(json!({ "userId": jane.id, "baseSalary": -1.0 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "baseSalary");

    let (status, _) = send!(
        app,
        bearer(post("/api/employee/add"), &admin)
            .set_json(json!({ "userId": jane.id, "baseSalary": "lots" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send!(
        app,
        bearer(post("/api/employee/add"), &admin)
            .set_json(json!({ "userId": 9999, "baseSalary": 10.0 }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, _) = send!(
        app,
        bearer(post("/api/employee/add"), &admin)
            .set_json(json!({ "userId": jane.id, "baseSalary": 10.0 }))
    );
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn employee_role_is_kept_off_admin_routes() {
    let ctx = TestApp::new();
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let employee = ctx.employee(&jane, 1000.0, 0.0, 0.0).await;
    let token = token_for(&jane);
    let app = init_app!(ctx.state);

    let (status, body) = send!(app, bearer(get("/api/employee"), &token));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin only");

    let (status, _) = send!(
        app,
        bearer(post("/api/employee/add"), &token)
            .set_json(json!({ "userId": jane.id, "baseSalary": 10.0 }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/employee/{}", employee.id);
    let (status, _) = send!(
        app,
        bearer(put(&uri), &token).set_json(json!({ "baseSalary": 1.0e9 }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send!(app, bearer(delete(&uri), &token));
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn employees_read_only_their_own_record() {
    let ctx = TestApp::new();
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let bob = ctx.user("bob@x.io", Role::Employee).await;
    let jane_employee = ctx.employee(&jane, 1000.0, 100.0, 50.0).await;
    let bob_employee = ctx.employee(&bob, 2000.0, 0.0, 0.0).await;
    let token = token_for(&jane);
    let app = init_app!(ctx.state);

    let (status, body) = send!(
        app,
        bearer(get(&format!("/api/employee/{}", jane_employee.id)), &token)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["netSalary"], 1050.0);

    let (status, body) = send!(
        app,
        bearer(get(&format!("/api/employee/{}", bob_employee.id)), &token)
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");

    // unknown ids look the same as other people's
    let (status, _) = send!(app, bearer(get("/api/employee/9999"), &token));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send!(app, bearer(get("/api/employee/me"), &token));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], jane_employee.id);
}

#[actix_web::test]
async fn admin_sees_not_found_for_unknown_ids() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let app = init_app!(ctx.state);

    let (status, _) = send!(app, bearer(get("/api/employee/9999"), &admin));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send!(app, bearer(delete("/api/employee/9999"), &admin));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send!(
        app,
        bearer(put("/api/employee/9999"), &admin).set_json(json!({ "allowance": 1.0 }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send!(app, bearer(get("/api/employee/me"), &admin));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No employee profile for this user");
}

#[actix_web::test]
async fn list_paginates_and_searches() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    for email in ["ann@x.io", "bob@x.io", "anna@y.io"] {
        let user = ctx.user(email, Role::Employee).await;
        ctx.employee(&user, 1000.0, 0.0, 0.0).await;
    }
    let app = init_app!(ctx.state);

    let (status, body) = send!(app, bearer(get("/api/employee?page=1&perPage=2"), &admin));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["perPage"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let (_, body) = send!(app, bearer(get("/api/employee?search=ANN"), &admin));
    assert_eq!(body["data"]["total"], 2);

    let (status, _) = send!(app, bearer(get("/api/employee?page=abc"), &admin));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn partial_update_recomputes_net_salary() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let employee = ctx.employee(&jane, 50000.0, 5000.0, 2000.0).await;
    let uri = format!("/api/employee/{}", employee.id);
    let app = init_app!(ctx.state);

    let (status, body) = send!(
        app,
        bearer(put(&uri), &admin).set_json(json!({ "deduction": 7000.0 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["baseSalary"], 50000.0);
    assert_eq!(body["data"]["deduction"], 7000.0);
    assert_eq!(body["data"]["netSalary"], 48000.0);

    let (status, body) = send!(app, bearer(put(&uri), &admin).set_json(json!({})));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields provided for update");

    let (status, body) = send!(
        app,
        bearer(put(&uri), &admin).set_json(json!({ "allowance": -5.0 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "allowance");
}

#[actix_web::test]
async fn delete_keeps_payroll_history_intact() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let bob = ctx.user("bob@x.io", Role::Employee).await;
    let paid = ctx.employee(&jane, 1000.0, 0.0, 0.0).await;
    let unpaid = ctx.employee(&bob, 1000.0, 0.0, 0.0).await;
    let app = init_app!(ctx.state);

    let (status, _) = send!(
        app,
        bearer(post("/api/payroll/process"), &admin)
            .set_json(json!({ "employeeId": paid.id, "month": 3, "year": 2026 }))
    );
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send!(
        app,
        bearer(delete(&format!("/api/employee/{}", paid.id)), &admin)
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send!(
        app,
        bearer(delete(&format!("/api/employee/{}", unpaid.id)), &admin)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully deleted");

    let (status, _) = send!(
        app,
        bearer(get(&format!("/api/employee/{}", unpaid.id)), &admin)
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn figures_whose_total_overflows_are_rejected() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let bob = ctx.user("bob@x.io", Role::Employee).await;
    let employee = ctx.employee(&bob, 1e308, 0.0, 0.0).await;
    let app = init_app!(ctx.state);

    let (status, body) = send!(
        app,
        bearer(post("/api/employee/add"), &admin).set_json(json!({
            "userId": jane.id,
            "baseSalary": 1e308,
            "allowance": 1e308
        }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "grossSalary");

    let (status, body) = send!(
        app,
        bearer(put(&format!("/api/employee/{}", employee.id)), &admin)
            .set_json(json!({ "allowance": 1e308 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "grossSalary");

    let (_, body) = send!(
        app,
        bearer(get(&format!("/api/employee/{}", employee.id)), &admin)
    );
    assert_eq!(body["data"]["allowance"], 0.0);
}

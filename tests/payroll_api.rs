#[macro_use]
mod common;

use actix_web::http::StatusCode;
use common::{TestApp, bearer, get, post, put, token_for};
use payroll::model::role::Role;
use payroll::store::{PayrollQuery, PayrollStore};
use serde_json::json;

#[actix_web::test]
async fn run_reports_every_employee_and_is_not_repeated() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    for (email, base) in [("a@x.io", 1000.0), ("b@x.io", 2000.0), ("c@x.io", 3000.0)] {
        let user = ctx.user(email, Role::Employee).await;
        ctx.employee(&user, base, 100.0, 50.0).await;
    }
    let app = init_app!(ctx.state);

    let (status, body) = send!(
        app,
        bearer(post("/api/payroll/run"), &admin).set_json(json!({ "month": 3, "year": 2026 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["month"], 3);
    assert_eq!(body["data"]["year"], 2026);
    assert_eq!(body["data"]["processedCount"], 3);
    assert_eq!(body["data"]["failedCount"], 0);
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r["success"] == true));
    assert_eq!(results[0]["payroll"]["netSalary"], 1050.0);

    let before = ctx
        .store
        .list_payrolls(&PayrollQuery { page: 1, per_page: 100, ..Default::default() })
        .await
        .unwrap();

    let (status, body) = send!(
        app,
        bearer(post("/api/payroll/run"), &admin).set_json(json!({ "month": 3, "year": 2026 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["processedCount"], 0);
    assert_eq!(body["data"]["failedCount"], 3);
    assert_eq!(
        body["data"]["results"][0]["error"],
        "Payroll already processed for this period"
    );

    let after = ctx
        .store
        .list_payrolls(&PayrollQuery { page: 1, per_page: 100, ..Default::default() })
        .await
        .unwrap();
    assert_eq!(before.1, 3);
    assert_eq!(before, after);
}

#[actix_web::test]
async fn run_with_no_employees_still_succeeds() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let app = init_app!(ctx.state);

    let (status, body) = send!(
        app,
        bearer(post("/api/payroll/run"), &admin).set_json(json!({ "month": 1, "year": 2027 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["processedCount"], 0);
    assert_eq!(body["data"]["failedCount"], 0);
    assert!(body["data"]["results"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn run_validates_the_period() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let app = init_app!(ctx.state);

    let (status, body) = send!(
        app,
        bearer(post("/api/payroll/run"), &admin).set_json(json!({ "month": 13, "year": 1999 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["month", "year"]);

    let (status, _) = send!(
        app,
        bearer(post("/api/payroll/run"), &admin).set_json(json!({ "month": "March", "year": 2026 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn run_is_admin_only() {
    let ctx = TestApp::new();
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let app = init_app!(ctx.state);

    let (status, _) = send!(
        app,
        bearer(post("/api/payroll/run"), &token_for(&jane))
            .set_json(json!({ "month": 3, "year": 2026 }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn process_single_employee() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let employee = ctx.employee(&jane, 50000.0, 5000.0, 2000.0).await;
    let app = init_app!(ctx.state);

    let request = json!({ "employeeId": employee.id, "month": 6, "year": 2026 });
    let (status, body) = send!(
        app,
        bearer(post("/api/payroll/process"), &admin).set_json(&request)
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["employeeId"], employee.id);
    assert_eq!(body["data"]["grossSalary"], 55000.0);
    assert_eq!(body["data"]["netSalary"], 53000.0);

    let (status, body) = send!(
        app,
        bearer(post("/api/payroll/process"), &admin).set_json(&request)
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Payroll already processed for this period");

    let (status, body) = send!(
        app,
        bearer(post("/api/payroll/process"), &admin)
            .set_json(json!({ "employeeId": 9999, "month": 6, "year": 2026 }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Employee not found");
}

#[actix_web::test]
async fn snapshots_survive_later_salary_edits() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let employee = ctx.employee(&jane, 1000.0, 0.0, 0.0).await;
    let app = init_app!(ctx.state);

    send!(
        app,
        bearer(post("/api/payroll/process"), &admin)
            .set_json(json!({ "employeeId": employee.id, "month": 1, "year": 2026 }))
    );
    let (status, _) = send!(
        app,
        bearer(put(&format!("/api/employee/{}", employee.id)), &admin)
            .set_json(json!({ "baseSalary": 9000.0 }))
    );
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send!(
        app,
        bearer(get(&format!("/api/payroll/{}", employee.id)), &admin)
    );
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["baseSalary"], 1000.0);
}

#[actix_web::test]
async fn employees_see_only_their_own_payroll_history() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    let bob = ctx.user("bob@x.io", Role::Employee).await;
    let jane_employee = ctx.employee(&jane, 1000.0, 0.0, 0.0).await;
    let bob_employee = ctx.employee(&bob, 2000.0, 0.0, 0.0).await;
    let token = token_for(&jane);
    let app = init_app!(ctx.state);

    for month in [1, 2] {
        send!(
            app,
            bearer(post("/api/payroll/run"), &admin)
                .set_json(json!({ "month": month, "year": 2026 }))
        );
    }

    let (status, body) = send!(
        app,
        bearer(get(&format!("/api/payroll/{}", jane_employee.id)), &token)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    let items = body["data"]["items"].as_array().unwrap();
    assert!(items.iter().all(|p| p["employeeId"] == jane_employee.id));
    // newest period first
    assert_eq!(items[0]["month"], 2);

    let (status, body) = send!(
        app,
        bearer(get(&format!("/api/payroll/{}?month=1", jane_employee.id)), &token)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = send!(
        app,
        bearer(get(&format!("/api/payroll/{}", bob_employee.id)), &token)
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = send!(app, bearer(get("/api/payroll/9999"), &token));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send!(app, bearer(get("/api/payroll/9999"), &admin));
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send!(app, bearer(get("/api/payroll"), &token));
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_lists_payrolls_by_period() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    for email in ["a@x.io", "b@x.io"] {
        let user = ctx.user(email, Role::Employee).await;
        ctx.employee(&user, 1000.0, 0.0, 0.0).await;
    }
    let app = init_app!(ctx.state);

    for (month, year) in [(12, 2025), (1, 2026)] {
        send!(
            app,
            bearer(post("/api/payroll/run"), &admin)
                .set_json(json!({ "month": month, "year": year }))
        );
    }

    let (status, body) = send!(app, bearer(get("/api/payroll"), &admin));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(body["data"]["perPage"], 10);

    let (_, body) = send!(app, bearer(get("/api/payroll?month=12&year=2025"), &admin));
    assert_eq!(body["data"]["total"], 2);

    let (status, _) = send!(app, bearer(get("/api/payroll?month=0"), &admin));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn stored_figures_that_overflow_are_not_processed() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token().await;
    let jane = ctx.user("jane@x.io", Role::Employee).await;
    // seeded straight into the store, bypassing request validation
    let employee = ctx.employee(&jane, 1e308, 1e308, 0.0).await;
    let app = init_app!(ctx.state);

    let (status, body) = send!(
        app,
        bearer(post("/api/payroll/process"), &admin)
            .set_json(json!({ "employeeId": employee.id, "month": 5, "year": 2026 }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "grossSalary");

    let (status, body) = send!(
        app,
        bearer(post("/api/payroll/run"), &admin).set_json(json!({ "month": 5, "year": 2026 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["failedCount"], 1);
    assert_eq!(
        body["data"]["results"][0]["error"],
        "Invalid salary figures: grossSalary is too large to compute"
    );

    let (rows, count) = ctx
        .store
        .list_payrolls(&PayrollQuery { page: 1, per_page: 10, ..Default::default() })
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(count, 0);
}

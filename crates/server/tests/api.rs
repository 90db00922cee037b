use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;

async fn setup_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    server::router(engine)
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

fn session_from(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn sign_up(app: &Router, email: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/users/sign-up",
        None,
        Some(json!({
            "email": email,
            "name": "Alice",
            "password": "correct horse"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    session_from(&response)
}

#[tokio::test]
async fn sign_up_sets_session_cookie() {
    let app = setup_app().await;
    let response = send(
        &app,
        "POST",
        "/api/users/sign-up",
        None,
        Some(json!({
            "account_name": "Home",
            "email": "Alice@Example.com",
            "name": "Alice",
            "password": "correct horse"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("budgetly_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));

    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let me = send(&app, "GET", "/api/users/me", Some(&cookie), None).await;
    assert_eq!(me.status(), StatusCode::OK);
    let json = body_json(me).await;
    assert_eq!(json["email"], "alice@example.com");
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = setup_app().await;
    let response = send(&app, "GET", "/api/budgets", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "GET",
        "/api/budgets",
        Some("budgetly_session=not-a-session"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_in_and_sign_out() {
    let app = setup_app().await;
    sign_up(&app, "alice@example.com").await;

    let wrong = send(
        &app,
        "POST",
        "/api/users/sign-in",
        None,
        Some(json!({"email": "alice@example.com", "password": "wrong password"})),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/api/users/sign-in",
        None,
        Some(json!({"email": "alice@example.com", "password": "correct horse"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_from(&response);

    let out = send(&app, "POST", "/api/users/sign-out", Some(&cookie), None).await;
    assert_eq!(out.status(), StatusCode::NO_CONTENT);

    let me = send(&app, "GET", "/api/users/me", Some(&cookie), None).await;
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let app = setup_app().await;
    let response = send(
        &app,
        "POST",
        "/api/users/sign-up",
        None,
        Some(json!({"email": "nope", "name": "Alice", "password": "short"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "validation failed");
    let fields: Vec<_> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, ["email", "password"]);

    let request = Request::builder()
        .method("POST")
        .uri("/api/users/sign-up")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = setup_app().await;
    sign_up(&app, "alice@example.com").await;
    let response = send(
        &app,
        "POST",
        "/api/users/sign-up",
        None,
        Some(json!({
            "email": "ALICE@example.com",
            "name": "Other",
            "password": "correct horse"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn budget_setup_and_summary() {
    let app = setup_app().await;
    let cookie = sign_up(&app, "alice@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/budgets",
        Some(&cookie),
        Some(json!({
            "name": "March",
            "period": "MONTHLY",
            "strategy": "ZERO_SUM",
            "start_at": "2025-03-01T00:00:00+00:00",
            "end_at": "2025-03-31T23:59:59+00:00",
            "incomes": [{"source": "Salary", "amount_minor": 10000, "frequency": "WEEKLY"}],
            "categories": [
                {"name": "Groceries", "allocated_minor": 30000},
                {"name": "Rent", "allocated_minor": 20000}
            ]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let detail = body_json(response).await;
    let budget_id = detail["budget"]["id"].as_str().unwrap().to_string();
    let groceries = detail["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Groceries")
        .unwrap()["category_id"]
        .as_str()
        .unwrap()
        .to_string();

    for (amount, kind) in [(5000, "REGULAR"), (2000, "RETURN")] {
        let response = send(
            &app,
            "POST",
            "/api/transactions",
            Some(&cookie),
            Some(json!({
                "amount_minor": amount,
                "transaction_type": kind,
                "occurred_at": "2025-03-10T12:00:00+01:00",
                "category_id": groceries
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(
        &app,
        "GET",
        &format!("/api/budgets/{budget_id}/summary"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["normalized_income_minor"], 50000);
    assert_eq!(summary["total_allocated_minor"], 50000);
    assert_eq!(summary["balanced"], true);
    let category = summary["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["category_id"] == groceries.as_str())
        .unwrap();
    assert_eq!(category["spent_minor"], 3000);

    let response = send(
        &app,
        "PUT",
        &format!("/api/budgets/{budget_id}/categories/{groceries}"),
        Some(&cookie),
        Some(json!({"allocated_minor": 35000})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(
        send(
            &app,
            "GET",
            &format!("/api/budgets/{budget_id}/summary"),
            Some(&cookie),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(summary["balanced"], false);
}

#[tokio::test]
async fn budget_line_needs_exactly_one_reference() {
    let app = setup_app().await;
    let cookie = sign_up(&app, "alice@example.com").await;
    let response = send(
        &app,
        "POST",
        "/api/budgets",
        Some(&cookie),
        Some(json!({
            "name": "March",
            "period": "MONTHLY",
            "strategy": "PERCENTAGE",
            "start_at": "2025-03-01T00:00:00Z",
            "categories": [{"allocated_minor": 100}]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/budgets",
        Some(&cookie),
        Some(json!({
            "name": "Backwards",
            "period": "MONTHLY",
            "strategy": "PERCENTAGE",
            "start_at": "2025-03-10T00:00:00Z",
            "end_at": "2025-03-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn other_accounts_see_nothing() {
    let app = setup_app().await;
    let alice = sign_up(&app, "alice@example.com").await;
    let bob = sign_up(&app, "bob@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/cards",
        Some(&alice),
        Some(json!({"name": "Debit", "card_type": "DEBIT", "last_four": "4242"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let card_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = send(&app, "GET", &format!("/api/cards/{card_id}"), Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&bob),
        Some(json!({
            "amount_minor": 100,
            "transaction_type": "REGULAR",
            "occurred_at": "2025-03-10T12:00:00Z",
            "card_id": card_id
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn transactions_page_copy_and_delete() {
    let app = setup_app().await;
    let cookie = sign_up(&app, "alice@example.com").await;

    let mut ids = Vec::new();
    for day in 1..=3 {
        let response = send(
            &app,
            "POST",
            "/api/transactions",
            Some(&cookie),
            Some(json!({
                "amount_minor": day * 100,
                "transaction_type": "REGULAR",
                "description": "coffee",
                "occurred_at": format!("2025-03-0{day}T08:00:00Z")
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        ids.push(body_json(response).await["id"].as_str().unwrap().to_string());
    }

    let response = send(&app, "GET", "/api/transactions?limit=2", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(page["transactions"][0]["amount_minor"], 300);
    let cursor = page["next_cursor"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "GET",
        &format!("/api/transactions?limit=2&cursor={cursor}"),
        Some(&cookie),
        None,
    )
    .await;
    let page = body_json(response).await;
    assert_eq!(page["transactions"].as_array().unwrap().len(), 1);
    assert!(page["next_cursor"].is_null());

    let response = send(&app, "GET", "/api/transactions?limit=0", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "PATCH",
        &format!("/api/transactions/{}", ids[0]),
        Some(&cookie),
        Some(json!({"description": null})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["description"].is_null());

    let response = send(
        &app,
        "POST",
        &format!("/api/transactions/{}/copy", ids[0]),
        Some(&cookie),
        Some(json!({"occurred_at": "2025-04-01T08:00:00Z"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let copy = body_json(response).await;
    assert_ne!(copy["id"], ids[0].as_str());
    assert_eq!(copy["amount_minor"], 100);

    let response = send(
        &app,
        "POST",
        &format!("/api/transactions/{}/copy", ids[1]),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/transactions/{}", ids[2]),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(
        &app,
        "GET",
        &format!("/api/transactions/{}", ids[2]),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn card_payment_round_trip() {
    let app = setup_app().await;
    let cookie = sign_up(&app, "alice@example.com").await;

    let mut cards = Vec::new();
    for (name, kind) in [("Checking", "DEBIT"), ("Visa", "CREDIT")] {
        let response = send(
            &app,
            "POST",
            "/api/cards",
            Some(&cookie),
            Some(json!({"name": name, "card_type": kind})),
        )
        .await;
        cards.push(body_json(response).await["id"].as_str().unwrap().to_string());
    }

    let response = send(
        &app,
        "POST",
        "/api/transactions/card-payment",
        Some(&cookie),
        Some(json!({
            "from_card_id": cards[0],
            "to_card_id": cards[1],
            "amount_minor": 8000,
            "occurred_at": "2025-03-15T10:00:00Z"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment = body_json(response).await;
    assert_eq!(payment["from"]["amount_minor"], -8000);
    assert_eq!(payment["to"]["amount_minor"], 8000);
    let payment_id = payment["card_payment_id"].as_str().unwrap().to_string();
    let leg_id = payment["from"]["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "DELETE",
        &format!("/api/transactions/{leg_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/transactions/card-payment/{payment_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let list = body_json(send(&app, "GET", "/api/transactions", Some(&cookie), None).await).await;
    assert!(list["transactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn card_payment_must_pay_off_a_credit_card() {
    let app = setup_app().await;
    let cookie = sign_up(&app, "alice@example.com").await;

    let mut cards = Vec::new();
    for (name, kind) in [("Checking", "DEBIT"), ("Visa", "CREDIT"), ("Amex", "CREDIT")] {
        let response = send(
            &app,
            "POST",
            "/api/cards",
            Some(&cookie),
            Some(json!({"name": name, "card_type": kind})),
        )
        .await;
        cards.push(body_json(response).await["id"].as_str().unwrap().to_string());
    }

    for (from, to) in [(&cards[1], &cards[2]), (&cards[1], &cards[0])] {
        let response = send(
            &app,
            "POST",
            "/api/transactions/card-payment",
            Some(&cookie),
            Some(json!({
                "from_card_id": from,
                "to_card_id": to,
                "amount_minor": 8000,
                "occurred_at": "2025-03-15T10:00:00Z"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_json(response).await["error"].is_string());
    }

    let list = body_json(send(&app, "GET", "/api/transactions", Some(&cookie), None).await).await;
    assert!(list["transactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_path_id_is_a_json_bad_request() {
    let app = setup_app().await;
    let cookie = sign_up(&app, "alice@example.com").await;

    for uri in [
        "/api/budgets/not-a-uuid",
        "/api/cards/not-a-uuid",
        "/api/transactions/not-a-uuid",
        "/api/savings/not-a-uuid",
    ] {
        let response = send(&app, "GET", uri, Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(response).await;
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn oversized_income_is_rejected_before_summarizing() {
    let app = setup_app().await;
    let cookie = sign_up(&app, "alice@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/budgets",
        Some(&cookie),
        Some(json!({
            "name": "Forever",
            "period": "YEARLY",
            "strategy": "ZERO_SUM",
            "start_at": "2025-01-01T00:00:00+00:00",
            "end_at": "2025-12-31T23:59:59+00:00",
            "incomes": [{
                "source": "Jackpot",
                "amount_minor": 9_000_000_000_000_000_000_i64,
                "frequency": "WEEKLY"
            }],
            "categories": []
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());

    let list = body_json(send(&app, "GET", "/api/budgets", Some(&cookie), None).await).await;
    assert!(list["budgets"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn pocket_progress_through_allocations() {
    let app = setup_app().await;
    let cookie = sign_up(&app, "alice@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/savings",
        Some(&cookie),
        Some(json!({"name": "Rainy day"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let savings_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "POST",
        &format!("/api/savings/{savings_id}/pockets"),
        Some(&cookie),
        Some(json!({"name": "Holiday", "goal_minor": 14000})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let pocket = body_json(response).await;
    let pocket_id = pocket["id"].as_str().unwrap().to_string();
    assert_eq!(pocket["goal_progress_percent"], 0.0);

    for amount in [10000, -3000] {
        let response = send(
            &app,
            "POST",
            &format!("/api/pockets/{pocket_id}/allocations"),
            Some(&cookie),
            Some(json!({"amount_minor": amount})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(
        &app,
        "GET",
        &format!("/api/pockets/{pocket_id}"),
        Some(&cookie),
        None,
    )
    .await;
    let pocket = body_json(response).await;
    assert_eq!(pocket["total_minor"], 7000);
    assert_eq!(pocket["goal_progress_percent"], 50.0);

    let allocations = body_json(
        send(
            &app,
            "GET",
            &format!("/api/pockets/{pocket_id}/allocations"),
            Some(&cookie),
            None,
        )
        .await,
    )
    .await;
    let withdrawal = allocations["allocations"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["withdrawal"] == true)
        .unwrap();
    assert_eq!(withdrawal["amount_minor"], 3000);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/savings/{savings_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(
        &app,
        "GET",
        &format!("/api/pockets/{pocket_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

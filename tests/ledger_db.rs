//! End-to-end scenarios against a real Postgres.
//!
//! Ignored by default. Run with a disposable database:
//! `DATABASE_URL=postgres://... cargo test --test ledger_db -- --ignored`

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use insightify::{
    app::build_app,
    config::{AppConfig, JwtConfig},
    db,
    state::AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn setup() -> anyhow::Result<(Router, AppState)> {
    let database_url = std::env::var("DATABASE_URL")?;
    let config = AppConfig {
        database_url,
        jwt: JwtConfig {
            secret: "integration-secret".into(),
            issuer: "insightify".into(),
            audience: "insightify-users".into(),
            ttl_seconds: 3600,
        },
        frontend_url: "http://localhost:3000".into(),
        host: "127.0.0.1".into(),
        port: 0,
        db_max_connections: 5,
        db_acquire_timeout_secs: 5,
        request_timeout_secs: 30,
    };
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;
    let state = AppState::from_parts(pool, Arc::new(config));
    Ok((build_app(state.clone())?, state))
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4())
}

/// Signs up a fresh user, returning (user id, token).
async fn new_user(router: &Router) -> (String, String) {
    let (status, body) = call(
        router,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"name": "Ana", "email": unique_email(), "password": "pw-123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["user"]["id"].as_str().unwrap().to_owned(),
        body["token"].as_str().unwrap().to_owned(),
    )
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn signup_token_identifies_the_new_user() -> anyhow::Result<()> {
    let (router, state) = setup().await?;
    let email = unique_email();
    let (status, body) = call(
        &router,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({"email": email, "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"]["name"].is_null());

    let claims = state.jwt.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub.to_string(), body["user"]["id"].as_str().unwrap());

    let (status, me) = call(&router, Method::GET, "/auth/me", body["token"].as_str(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], email.as_str());
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_signup_conflicts_and_login_failures_match() -> anyhow::Result<()> {
    let (router, _) = setup().await?;
    let email = unique_email();
    let signup = |pw: &'static str| json!({"email": email, "password": pw});

    let (status, _) = call(&router, Method::POST, "/auth/signup", None, Some(signup("one"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = call(&router, Method::POST, "/auth/signup", None, Some(signup("two"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"error": "Email already registered"}));

    let (status, ok) = call(&router, Method::POST, "/auth/login", None, Some(signup("one"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ok["token"].is_string());

    let wrong_pw = call(&router, Method::POST, "/auth/login", None, Some(signup("nope"))).await;
    let no_user = call(
        &router,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": unique_email(), "password": "one"})),
    )
    .await;
    assert_eq!(wrong_pw.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, no_user);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn records_are_invisible_to_other_users() -> anyhow::Result<()> {
    let (router, _) = setup().await?;
    let (_, alice) = new_user(&router).await;
    let (_, bob) = new_user(&router).await;

    for (uri, date_field) in [("/expenses", "incurredAt"), ("/incomes", "receivedAt")] {
        let (status, rec) = call(
            &router,
            Method::POST,
            uri,
            Some(&alice),
            Some(json!({"title": "Private", "amount": 10, date_field: "2024-02-03"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = rec["id"].as_str().unwrap().to_owned();

        let (_, list) = call(&router, Method::GET, uri, Some(&bob), None).await;
        assert_eq!(list["pagination"]["total"], 0);
        assert!(list["data"].as_array().unwrap().is_empty());

        let foreign = call(
            &router,
            Method::PUT,
            &format!("{uri}/{id}"),
            Some(&bob),
            Some(json!({"title": "Mine now"})),
        )
        .await;
        let missing = call(
            &router,
            Method::PUT,
            &format!("{uri}/{}", Uuid::new_v4()),
            Some(&bob),
            Some(json!({"title": "Mine now"})),
        )
        .await;
        assert_eq!(foreign.0, StatusCode::NOT_FOUND);
        assert_eq!(foreign, missing);

        let (status, _) = call(&router, Method::DELETE, &format!("{uri}/{id}"), Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            call(&router, Method::DELETE, &format!("{uri}/{id}"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().ends_with("deleted"));
    }
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn update_is_partial() -> anyhow::Result<()> {
    let (router, _) = setup().await?;
    let (_, token) = new_user(&router).await;
    let (_, rec) = call(
        &router,
        Method::POST,
        "/expenses",
        Some(&token),
        Some(json!({"title": "Lunch", "amount": "12.50", "category": "Food", "incurredAt": "2024-05-01"})),
    )
    .await;
    let uri = format!("/expenses/{}", rec["id"].as_str().unwrap());

    let (status, upd) = call(&router, Method::PUT, &uri, Some(&token), Some(json!({"amount": 15}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upd["amount"], json!(15.0));
    assert_eq!(upd["title"], "Lunch");
    assert_eq!(upd["category"], "Food");
    assert_eq!(upd["incurredAt"], rec["incurredAt"]);

    let (_, upd) = call(&router, Method::PUT, &uri, Some(&token), Some(json!({"category": null}))).await;
    assert!(upd["category"].is_null());
    assert_eq!(upd["amount"], json!(15.0));
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pages_cover_the_filtered_set_exactly_once() -> anyhow::Result<()> {
    let (router, _) = setup().await?;
    let (_, token) = new_user(&router).await;
    for i in 0..23 {
        let category = if i % 2 == 0 { "Food" } else { "Travel" };
        let (status, _) = call(
            &router,
            Method::POST,
            "/expenses",
            Some(&token),
            // shared amounts force the id tie-breaker to matter
            Some(json!({"title": format!("e{i}"), "amount": i % 4, "category": category, "incurredAt": "2024-03-10"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let mut seen = Vec::new();
    let mut page = 1;
    loop {
        let (status, body) = call(
            &router,
            Method::GET,
            &format!("/expenses?category=Food&sortBy=amount&sortOrder=asc&limit=5&page={page}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 12);
        assert_eq!(body["pagination"]["totalPages"], 3);
        let data = body["data"].as_array().unwrap();
        if data.is_empty() {
            break;
        }
        seen.extend(data.iter().map(|r| {
            (
                r["amount"].as_f64().unwrap(),
                r["id"].as_str().unwrap().to_owned(),
            )
        }));
        page += 1;
    }
    assert_eq!(seen.len(), 12);
    let mut ids: Vec<_> = seen.iter().map(|(_, id)| id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 12);
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));

    let (_, body) = call(
        &router,
        Method::GET,
        "/expenses?minAmount=2&maxAmount=3&startDate=2024-03-10&endDate=2024-03-10",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 11);
    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn coffee_shows_up_in_listing_and_analytics() -> anyhow::Result<()> {
    let (router, _) = setup().await?;
    let (_, token) = new_user(&router).await;

    let (_, empty) = call(&router, Method::GET, "/analytics/summary", Some(&token), None).await;
    assert_eq!(empty["charts"]["monthly"].as_array().unwrap().len(), 6);
    assert_eq!(empty["summary"]["balance"], json!(0.0));

    let (status, _) = call(
        &router,
        Method::POST,
        "/expenses",
        Some(&token),
        Some(json!({"title": "Coffee", "amount": 120, "category": "Food"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = call(&router, Method::GET, "/expenses", Some(&token), None).await;
    assert_eq!(list["pagination"], json!({"total": 1, "page": 1, "limit": 10, "totalPages": 1}));
    assert_eq!(list["data"][0]["title"], "Coffee");

    let (status, summary) = call(&router, Method::GET, "/analytics/summary", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["summary"]["totalExpense"], json!(120.0));
    assert_eq!(summary["summary"]["monthlyExpense"], json!(120.0));
    assert_eq!(
        summary["charts"]["categories"],
        json!([{"name": "Food", "value": 120.0}])
    );
    assert_eq!(summary["charts"]["monthly"][5]["expense"], json!(120.0));
    Ok(())
}

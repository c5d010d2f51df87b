//! Integration tests for the sync and accounting endpoints
//!
//! Each upstream (WordPress, MyPhoner, Luca) is replaced by a small axum
//! app bound to a local ephemeral port.

mod helpers;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use crewdesk_common::{time, NewWorker, WorkerPatch, WorkerStatus};
use crewdesk_server::build_router;
use crewdesk_server::config::{AccountingSettings, CallStatsSettings, DirectorySettings, ServiceConfig};
use crewdesk_server::store::WorkerStore;
use helpers::{extract_json, setup_state, spawn_upstream, test_config, test_request};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt; // for `oneshot`

const MYPHONER_KEY: &str = "mp-key";
const LUCA_KEY: &str = "luca-key";

fn has_auth(headers: &HeaderMap, expected_prefix: &str) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.starts_with(expected_prefix))
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "code": "rest_not_logged_in", "message": "Invalid credentials" })),
    )
}

// =============================================================================
// Fake WordPress
// =============================================================================

/// `by_role` answers the role-filtered query; `all` answers the unfiltered one
fn wordpress_router(by_role: Value, all: Value) -> Router {
    Router::new()
        .route(
            "/wp-json/wp/v2/users/me",
            get(|headers: HeaderMap| async move {
                if !has_auth(&headers, "Basic ") {
                    return unauthorized();
                }
                (StatusCode::OK, Json(json!({ "id": 1, "name": "bot" })))
            }),
        )
        .route(
            "/wp-json/wp/v2/users",
            get(
                move |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| {
                    let by_role = by_role.clone();
                    let all = all.clone();
                    async move {
                        if !has_auth(&headers, "Basic ") {
                            return unauthorized();
                        }
                        if q.get("context").map(String::as_str) != Some("edit") {
                            return (StatusCode::BAD_REQUEST, Json(json!({ "message": "context" })));
                        }
                        let body = if q.contains_key("roles") { by_role } else { all };
                        (StatusCode::OK, Json(body))
                    }
                },
            ),
        )
}

fn wordpress_config(base: &str) -> ServiceConfig {
    ServiceConfig {
        directory: DirectorySettings {
            url: base.to_string(),
            username: Some("bot@example.com".to_string()),
            app_password: Some("abcd efgh".to_string()),
            ..Default::default()
        },
        ..test_config()
    }
}

fn wp_user(id: u64, name: &str, email: &str, roles: &[&str]) -> Value {
    json!({ "id": id, "username": format!("u{}", id), "name": name, "email": email, "roles": roles })
}

#[tokio::test]
async fn test_directory_sync_adds_then_updates() {
    let users = json!([wp_user(1, "A", "a@x.com", &["employee"])]);
    let base = spawn_upstream(wordpress_router(users, json!([]))).await;
    let app = build_router(setup_state(WorkerStore::in_memory(), wordpress_config(&base)));

    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/wordpress/sync"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["added"], 1);
    assert_eq!(body["updated"], 0);
    assert_eq!(body["total"], 1);
    assert_eq!(
        body["message"],
        "Synced 1 employees from WordPress. Added 1 new, updated 0."
    );

    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/wordpress/sync"))
        .await
        .unwrap();
    let body = extract_json(response).await;
    assert_eq!(body["added"], 0);
    assert_eq!(body["updated"], 1);

    let response = app.oneshot(test_request("GET", "/api/workers")).await.unwrap();
    let workers = extract_json(response).await["workers"].clone();
    assert_eq!(workers.as_array().unwrap().len(), 1);
    assert_eq!(workers[0]["status"], "onboarding");
    assert_eq!(workers[0]["foreignId"], "1");
}

#[tokio::test]
async fn test_directory_sync_falls_back_to_client_side_role_filter() {
    let all = json!([
        wp_user(1, "A", "a@x.com", &["Ansatt"]),
        wp_user(2, "B", "b@x.com", &["subscriber"]),
        wp_user(3, "", "c@x.com", &["employee"]),
        json!({ "id": 4, "name": "NoMail", "roles": ["employee"] })
    ]);
    let base = spawn_upstream(wordpress_router(json!([]), all)).await;
    let app = build_router(setup_state(WorkerStore::in_memory(), wordpress_config(&base)));

    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/wordpress/sync"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["added"], 2);

    let response = app.oneshot(test_request("GET", "/api/workers")).await.unwrap();
    let workers = extract_json(response).await["workers"].clone();
    let mut names: Vec<&str> = workers
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["A", "u3"]);
}

#[tokio::test]
async fn test_directory_sync_with_no_matches_is_bad_request() {
    let base = spawn_upstream(wordpress_router(json!([]), json!([]))).await;
    let app = build_router(setup_state(WorkerStore::in_memory(), wordpress_config(&base)));

    let response = app
        .oneshot(test_request("POST", "/api/wordpress/sync"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("No employees found"));
}

#[tokio::test]
async fn test_directory_sync_without_credentials_is_bad_request() {
    let app = build_router(setup_state(WorkerStore::in_memory(), test_config()));

    let response = app
        .oneshot(test_request("POST", "/api/wordpress/sync"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("WordPress credentials not configured"));
}

#[tokio::test]
async fn test_directory_sync_connection_failure_is_bad_request() {
    let upstream = Router::new().route(
        "/wp-json/wp/v2/users/me",
        get(|| async { unauthorized() }),
    );
    let base = spawn_upstream(upstream).await;
    let app = build_router(setup_state(WorkerStore::in_memory(), wordpress_config(&base)));

    let response = app
        .oneshot(test_request("POST", "/api/wordpress/sync"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = extract_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Could not connect to WordPress"));
    assert!(error.contains("Invalid credentials"));
}

#[tokio::test]
async fn test_directory_sync_prunes_only_directory_workers() {
    let users = json!([wp_user(1, "A", "a@x.com", &["employee"])]);
    let base = spawn_upstream(wordpress_router(users, json!([]))).await;

    let store = WorkerStore::in_memory();
    store
        .add(NewWorker {
            name: "Manual".to_string(),
            email: "manual@x.com".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .upsert_by_email(&crewdesk_common::DirectoryMember {
            name: "Gone".to_string(),
            email: "gone@x.com".to_string(),
            foreign_id: "9".to_string(),
        })
        .await
        .unwrap();

    let app = build_router(setup_state(store, wordpress_config(&base)));
    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/wordpress/sync"))
        .await
        .unwrap();
    let body = extract_json(response).await;
    assert_eq!(body["removed"], 1);

    let response = app.oneshot(test_request("GET", "/api/workers")).await.unwrap();
    let workers = extract_json(response).await["workers"].clone();
    let mut emails: Vec<&str> = workers
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["email"].as_str().unwrap())
        .collect();
    emails.sort();
    assert_eq!(emails, vec!["a@x.com", "manual@x.com"]);
}

/// Role query served in `per_page` slices with `X-WP-TotalPages`
fn paged_wordpress_router(users: Vec<Value>) -> Router {
    Router::new()
        .route(
            "/wp-json/wp/v2/users/me",
            get(|| async { Json(json!({ "id": 1, "name": "bot" })) }),
        )
        .route(
            "/wp-json/wp/v2/users",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let users = users.clone();
                async move {
                    let per_page: usize = q.get("per_page").and_then(|v| v.parse().ok()).unwrap_or(10);
                    let page: usize = q.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
                    let total_pages = ((users.len() + per_page - 1) / per_page).max(1);
                    let slice: Vec<Value> = users
                        .iter()
                        .skip((page - 1) * per_page)
                        .take(per_page)
                        .cloned()
                        .collect();
                    (
                        [("x-wp-totalpages", total_pages.to_string())],
                        Json(json!(slice)),
                    )
                }
            }),
        )
}

#[tokio::test]
async fn test_directory_sync_reads_every_page() {
    let users: Vec<Value> = (1..=101)
        .map(|i| wp_user(i, &format!("User {}", i), &format!("u{}@x.com", i), &["employee"]))
        .collect();
    let base = spawn_upstream(paged_wordpress_router(users)).await;

    let store = WorkerStore::in_memory();
    store
        .upsert_by_email(&crewdesk_common::DirectoryMember {
            name: "User 101".to_string(),
            email: "u101@x.com".to_string(),
            foreign_id: "101".to_string(),
        })
        .await
        .unwrap();

    let app = build_router(setup_state(store, wordpress_config(&base)));
    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/wordpress/sync"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["total"], 101);
    assert_eq!(body["added"], 100);
    assert_eq!(body["updated"], 1);
    assert_eq!(body["removed"], 0);

    let response = app.oneshot(test_request("GET", "/api/workers")).await.unwrap();
    let workers = extract_json(response).await["workers"].clone();
    assert_eq!(workers.as_array().unwrap().len(), 101);
    assert!(workers
        .as_array()
        .unwrap()
        .iter()
        .any(|w| w["email"] == "u101@x.com"));
}

#[tokio::test]
async fn test_directory_test_connection_lists_employees() {
    let users = json!([
        wp_user(1, "A", "a@x.com", &["employee"]),
        wp_user(2, "B", "b@x.com", &["employee"])
    ]);
    let base = spawn_upstream(wordpress_router(users, json!([]))).await;
    let app = build_router(setup_state(WorkerStore::in_memory(), wordpress_config(&base)));

    let response = app
        .oneshot(test_request("GET", "/api/wordpress/test-connection"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["connected"], true);
    assert_eq!(body["employeeCount"], 2);
    assert_eq!(body["employees"][0]["roles"][0], "employee");
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn test_directory_test_connection_reports_missing_credentials() {
    let app = build_router(setup_state(WorkerStore::in_memory(), test_config()));
    let response = app
        .oneshot(test_request("GET", "/api/wordpress/test-connection"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["connected"], false);
    assert!(body["error"].is_string());
}

// =============================================================================
// Fake MyPhoner
// =============================================================================

type SeenQueries = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Agent `emma@x.com` (id 1) has 10 calls of 540s, 2 of them meetings
fn myphoner_router(seen: SeenQueries) -> Router {
    Router::new()
        .route(
            "/agents",
            get(|headers: HeaderMap| async move {
                if !has_auth(&headers, &format!("Bearer {}", MYPHONER_KEY)) {
                    return (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "message": "Invalid API key" })),
                    );
                }
                (
                    StatusCode::OK,
                    Json(json!([
                        { "id": 1, "name": "Emma", "email": "Emma@X.com" },
                        { "id": 2, "name": "Kari", "email": "kari@x.com" }
                    ])),
                )
            }),
        )
        .route(
            "/calls",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let seen = seen.clone();
                async move {
                    let agent = q.get("agent_id").cloned().unwrap_or_default();
                    seen.lock().unwrap().push(q);
                    let calls: Vec<Value> = if agent == "1" {
                        (0..10)
                            .map(|i| {
                                let outcome = match i {
                                    0 => "Meeting",
                                    1 => "møte",
                                    _ => "no answer",
                                };
                                json!({ "id": i, "agent_id": 1, "lead_id": 100 + i, "outcome": outcome, "duration": 540 })
                            })
                            .collect()
                    } else {
                        Vec::new()
                    };
                    Json(json!(calls))
                }
            }),
        )
}

fn myphoner_config(base: &str, api_key: &str) -> ServiceConfig {
    ServiceConfig {
        call_stats: CallStatsSettings {
            base_url: base.to_string(),
            api_key: Some(api_key.to_string()),
        },
        ..test_config()
    }
}

async fn store_with(emails: &[(&str, WorkerStatus)]) -> (WorkerStore, Vec<String>) {
    let store = WorkerStore::in_memory();
    let mut ids = Vec::new();
    for (email, status) in emails {
        let worker = store
            .add(NewWorker {
                name: email.split('@').next().unwrap_or_default().to_string(),
                email: email.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .update(
                &worker.id,
                WorkerPatch {
                    status: Some(*status),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        ids.push(worker.id);
    }
    (store, ids)
}

#[tokio::test]
async fn test_worker_sync_overwrites_stats() {
    let seen: SeenQueries = Arc::default();
    let base = spawn_upstream(myphoner_router(seen.clone())).await;
    let (store, ids) = store_with(&[("emma@x.com", WorkerStatus::Active)]).await;
    let app = build_router(setup_state(store, myphoner_config(&base, MYPHONER_KEY)));

    let response = app
        .oneshot(test_request(
            "POST",
            &format!("/api/workers/{}/sync?interval=week", ids[0]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["stats"]["totalCalls"], 10);
    assert_eq!(body["stats"]["meetingsBooked"], 2);
    assert_eq!(body["stats"]["hoursCalled"], 1.5);
    assert_eq!(body["stats"]["conversionRate"], 20.0);
    assert!(body["stats"]["lastSyncedAt"].is_string());
    assert_eq!(body["worker"]["stats"], body["stats"]);

    let queries = seen.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    let today = time::today();
    assert_eq!(queries[0]["agent_id"], "1");
    assert_eq!(queries[0]["to_date"], today.format("%Y-%m-%d").to_string());
    assert_eq!(
        queries[0]["from_date"],
        (today - chrono::Duration::days(7)).format("%Y-%m-%d").to_string()
    );
}

#[tokio::test]
async fn test_worker_sync_unknown_agent_is_soft_success() {
    let base = spawn_upstream(myphoner_router(Arc::default())).await;
    let (store, ids) = store_with(&[("nobody@x.com", WorkerStatus::Active)]).await;
    let app = build_router(setup_state(store, myphoner_config(&base, MYPHONER_KEY)));

    let response = app
        .oneshot(test_request("POST", &format!("/api/workers/{}/sync", ids[0])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Worker not found in MyPhoner or no data available"
    );
    assert_eq!(body["worker"]["stats"]["totalCalls"], 0);
    assert!(body.get("stats").is_none());
}

#[tokio::test]
async fn test_worker_sync_rejects_bad_requests() {
    let base = spawn_upstream(myphoner_router(Arc::default())).await;
    let (store, ids) = store_with(&[("emma@x.com", WorkerStatus::Active)]).await;
    let app = build_router(setup_state(store, myphoner_config(&base, MYPHONER_KEY)));

    let response = app
        .clone()
        .oneshot(test_request(
            "POST",
            &format!("/api/workers/{}/sync?interval=fortnight", ids[0]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(test_request("POST", "/api/workers/missing/sync"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_worker_sync_without_api_key_is_bad_request() {
    let (store, ids) = store_with(&[("emma@x.com", WorkerStatus::Active)]).await;
    let app = build_router(setup_state(store, test_config()));

    let response = app
        .oneshot(test_request("POST", &format!("/api/workers/{}/sync", ids[0])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await["error"],
        "MyPhoner API key not configured"
    );
}

#[tokio::test]
async fn test_worker_sync_upstream_failure_is_server_error() {
    let upstream = Router::new()
        .route("/agents", get(|| async { Json(json!([{ "id": 1, "email": "emma@x.com" }])) }))
        .route(
            "/calls",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
    let base = spawn_upstream(upstream).await;
    let (store, ids) = store_with(&[("emma@x.com", WorkerStatus::Active)]).await;
    let app = build_router(setup_state(store, myphoner_config(&base, MYPHONER_KEY)));

    let response = app
        .oneshot(test_request("POST", &format!("/api/workers/{}/sync", ids[0])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = extract_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("HTTP 502"));
}

#[tokio::test]
async fn test_bulk_sync_reports_per_worker_outcomes() {
    let base = spawn_upstream(myphoner_router(Arc::default())).await;
    let (store, _) = store_with(&[
        ("emma@x.com", WorkerStatus::Active),
        ("idle@x.com", WorkerStatus::Inactive),
        ("nobody@x.com", WorkerStatus::Onboarding),
    ])
    .await;
    let app = build_router(setup_state(store, myphoner_config(&base, MYPHONER_KEY)));

    let response = app
        .oneshot(test_request("POST", "/api/myphoner/sync?interval=month"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Synced 1 of 3 workers");

    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["synced"], true);
    assert!(results[0].get("error").is_none());
    assert_eq!(results[1]["error"], "Inactive worker");
    assert_eq!(results[2]["error"], "Agent not found in MyPhoner");
}

#[tokio::test]
async fn test_call_stats_connection_test() {
    let base = spawn_upstream(myphoner_router(Arc::default())).await;

    let app = build_router(setup_state(
        WorkerStore::in_memory(),
        myphoner_config(&base, MYPHONER_KEY),
    ));
    let body = extract_json(app.oneshot(test_request("GET", "/api/myphoner/test")).await.unwrap()).await;
    assert_eq!(body["connected"], true);
    assert!(body["lastSync"].is_string());

    let app = build_router(setup_state(
        WorkerStore::in_memory(),
        myphoner_config(&base, "wrong"),
    ));
    let body = extract_json(app.oneshot(test_request("GET", "/api/myphoner/test")).await.unwrap()).await;
    assert_eq!(body["connected"], false);
    assert!(body["lastSync"].is_null());
    assert!(body["error"].as_str().unwrap().contains("Invalid API key"));
}

// =============================================================================
// Fake Luca
// =============================================================================

fn luca_router() -> Router {
    Router::new().route(
        "/graphql",
        post(|headers: HeaderMap, Json(request): Json<Value>| async move {
            if !has_auth(&headers, &format!("Bearer {}", LUCA_KEY)) {
                return Json(json!({ "data": null, "errors": [{ "message": "Unauthorized" }] }));
            }
            let query = request["query"].as_str().unwrap_or_default();
            if query.contains("GetCustomers") {
                Json(json!({ "data": {
                    "customers": { "nodes": [
                        { "id": "c1", "name": "Small AS" },
                        { "id": "c2", "name": "Big AS", "organizationNumber": "999" }
                    ]},
                    "saleInvoices": { "nodes": [
                        { "customer": { "id": "c2" }, "totalIncVat": 1000, "paidAmount": 1000, "status": "paid" },
                        { "customer": { "id": "c1" }, "totalIncVat": 200, "paidAmount": 100, "status": "sent" }
                    ]}
                }}))
            } else {
                Json(json!({ "data": { "saleInvoices": { "nodes": [
                    { "id": "i1", "invoiceNumber": "1001", "customer": { "id": "c2", "name": "Big AS" },
                      "totalIncVat": 1000, "paidAmount": 1000, "status": "paid",
                      "dueDate": "2026-01-20", "paidAt": "2026-01-18", "createdAt": "2026-01-05T10:00:00Z" },
                    { "id": "i2", "invoiceNumber": "1002", "customer": null,
                      "totalIncVat": 200, "paidAmount": 100, "status": "sent",
                      "dueDate": "2026-02-20", "createdAt": "2026-02-01T10:00:00Z" }
                ]}}}))
            }
        }),
    )
}

fn luca_config(base: &str, api_key: &str) -> ServiceConfig {
    ServiceConfig {
        accounting: AccountingSettings {
            api_url: format!("{}/graphql", base),
            api_key: Some(api_key.to_string()),
        },
        ..test_config()
    }
}

#[tokio::test]
async fn test_invoices_with_summary_and_date_filter() {
    let base = spawn_upstream(luca_router()).await;
    let app = build_router(setup_state(WorkerStore::in_memory(), luca_config(&base, LUCA_KEY)));

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/luca/invoices"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["invoices"].as_array().unwrap().len(), 2);
    assert_eq!(body["invoices"][1]["customerName"], "Unknown");
    assert_eq!(body["summary"]["totalRevenue"], 1100.0);
    assert_eq!(body["summary"]["paidInvoices"], 1);
    assert_eq!(body["summary"]["unpaidInvoices"], 1);
    assert_eq!(body["summary"]["pendingAmount"], 100.0);
    assert!(body["errors"]["invoices"].is_null());

    let response = app
        .oneshot(test_request("GET", "/api/luca/invoices?from=2026-01-01&to=2026-01-31"))
        .await
        .unwrap();
    let body = extract_json(response).await;
    let invoices = body["invoices"].as_array().unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0]["invoiceNumber"], "1001");
    assert_eq!(invoices[0]["paidDate"], "2026-01-18");
}

#[tokio::test]
async fn test_invoices_report_partial_errors() {
    let base = spawn_upstream(luca_router()).await;
    let app = build_router(setup_state(WorkerStore::in_memory(), luca_config(&base, "wrong")));

    let response = app
        .oneshot(test_request("GET", "/api/luca/invoices"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["invoices"].as_array().unwrap().is_empty());
    assert!(body["summary"].is_null());
    assert_eq!(body["errors"]["invoices"], "Unauthorized");
    assert_eq!(body["errors"]["summary"], "Unauthorized");
}

#[tokio::test]
async fn test_invoices_invalid_date_is_bad_request() {
    let app = build_router(setup_state(WorkerStore::in_memory(), test_config()));
    let response = app
        .oneshot(test_request("GET", "/api/luca/invoices?from=yesterday"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customers_sorted_by_revenue() {
    let base = spawn_upstream(luca_router()).await;
    let app = build_router(setup_state(WorkerStore::in_memory(), luca_config(&base, LUCA_KEY)));

    let response = app
        .oneshot(test_request("GET", "/api/luca/customers"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["customers"][0]["name"], "Big AS");
    assert_eq!(body["customers"][0]["totalRevenue"], 1000.0);
    assert_eq!(body["customers"][0]["organizationNumber"], "999");
    assert_eq!(body["customers"][1]["invoiceCount"], 1);
}

#[tokio::test]
async fn test_customers_graphql_error_is_bad_request() {
    let base = spawn_upstream(luca_router()).await;
    let app = build_router(setup_state(WorkerStore::in_memory(), luca_config(&base, "wrong")));

    let response = app
        .oneshot(test_request("GET", "/api/luca/customers"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn test_accounting_connection_test() {
    let base = spawn_upstream(luca_router()).await;

    let app = build_router(setup_state(WorkerStore::in_memory(), luca_config(&base, LUCA_KEY)));
    let body = extract_json(app.oneshot(test_request("GET", "/api/luca/test")).await.unwrap()).await;
    assert_eq!(body["connected"], true);
    assert!(body["error"].is_null());

    let app = build_router(setup_state(WorkerStore::in_memory(), test_config()));
    let body = extract_json(app.oneshot(test_request("GET", "/api/luca/test")).await.unwrap()).await;
    assert_eq!(body["connected"], false);
    assert_eq!(body["error"], "Luca API key not configured");
}

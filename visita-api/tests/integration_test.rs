use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use async_trait::async_trait;
use visita_api::{app, AppState};
use visita_booking::{AdmissionService, MemoryAdmissionStore};
use visita_core::identity::{CustomerDirectory, CustomerRecord};
use visita_core::invoice::MockInvoiceAdapter;
use visita_core::ticket::MockTicketAdapter;
use visita_domain::{PackageSubscription, ServiceEntitlement, Slot, SubscriptionStatus};
use visita_store::BusinessRules;

#[derive(Default)]
struct FixtureDirectory {
    records: Mutex<HashMap<Uuid, CustomerRecord>>,
}

impl FixtureDirectory {
    fn insert(&self, record: CustomerRecord) {
        self.records.lock().unwrap().insert(record.id, record);
    }
}

#[async_trait]
impl CustomerDirectory for FixtureDirectory {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<CustomerRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_normalized_phone(
        &self,
        tenant_id: Uuid,
        normalized_phone: &str,
    ) -> Result<Vec<CustomerRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                r.tenant_id == tenant_id
                    && r.phone
                        .as_deref()
                        .and_then(visita_core::identity::normalize_phone)
                        .as_deref()
                        == Some(normalized_phone)
            })
            .cloned()
            .collect())
    }
}

struct TestApp {
    app: Router,
    store: Arc<MemoryAdmissionStore>,
    directory: Arc<FixtureDirectory>,
    invoices: Arc<MockInvoiceAdapter>,
    tenant_id: Uuid,
    service_id: Uuid,
    slot_id: Uuid,
}

async fn build_app(capacity: i32) -> TestApp {
    let store = Arc::new(MemoryAdmissionStore::new());
    let invoices = Arc::new(MockInvoiceAdapter::new());
    let tickets = Arc::new(MockTicketAdapter::new());
    let directory = Arc::new(FixtureDirectory::default());

    let tenant_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();
    let now = Utc::now();
    let slot = Slot {
        id: Uuid::new_v4(),
        tenant_id,
        service_id,
        resource_id: None,
        date: NaiveDate::from_ymd_opt(2026, 5, 14).unwrap(),
        start_time: "09:00:00".parse().unwrap(),
        end_time: "10:00:00".parse().unwrap(),
        original_capacity: capacity,
        available_capacity: capacity,
        booked_count: 0,
        is_available: true,
        created_at: now,
        updated_at: now,
    };
    let slot_id = slot.id;
    store.add_slot(slot).await;

    let admissions = AdmissionService::new(store.clone(), invoices.clone(), tickets.clone());
    let (sse_tx, _) = tokio::sync::broadcast::channel(16);
    let (notice_tx, _notice_rx) = tokio::sync::mpsc::channel(16);

    let state = AppState {
        admissions,
        directory: directory.clone(),
        sse_tx,
        notice_tx,
        business_rules: BusinessRules::default(),
    };

    TestApp {
        app: app(state),
        store,
        directory,
        invoices,
        tenant_id,
        service_id,
        slot_id,
    }
}

fn admit_body(t: &TestApp, customer_id: Option<Uuid>, phone: Option<&str>, count: i32) -> Value {
    json!({
        "tenant_id": t.tenant_id,
        "service_id": t.service_id,
        "slot_id": t.slot_id,
        "customer_id": customer_id,
        "visitor_count": count,
        "price_per_unit_cents": 1500,
        "guest_name": "Walk-in",
        "guest_phone": phone,
    })
}

async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_admit_and_fetch_booking() {
    let t = build_app(5).await;

    let (status, body) = post_json(&t.app, "/v1/bookings", &admit_body(&t, None, None, 2)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot_available_after"], 3);
    assert_eq!(body["booking"]["paid_quantity"], 2);
    assert_eq!(body["booking"]["total_price_cents"], 3000);

    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();
    let (status, fetched) = get_json(&t.app, &format!("/v1/bookings/{booking_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], body["booking"]["id"]);
    assert_eq!(fetched["status"], "CONFIRMED");

    // Paid booking produced an invoice
    assert_eq!(t.invoices.invocation_count(), 1);
}

#[tokio::test]
async fn test_capacity_conflict_reports_remaining() {
    let t = build_app(3).await;

    let (status, _) = post_json(&t.app, "/v1/bookings", &admit_body(&t, None, None, 2)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(&t.app, "/v1/bookings", &admit_body(&t, None, None, 2)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("1 remaining"), "got: {message}");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_cancel_frees_capacity_for_readmission() {
    let t = build_app(1).await;

    let (status, body) = post_json(&t.app, "/v1/bookings", &admit_body(&t, None, None, 1)).await;
    assert_eq!(status, StatusCode::OK);
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();

    let (status, _) = post_json(&t.app, "/v1/bookings", &admit_body(&t, None, None, 1)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = post_json(
        &t.app,
        &format!("/v1/bookings/{booking_id}/cancel"),
        &Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["released_quantity"], 1);
    assert_eq!(body["slot_available_after"], 1);

    let (status, _) = post_json(&t.app, "/v1/bookings", &admit_body(&t, None, None, 1)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_package_coverage_flows_through_api() {
    let t = build_app(10).await;

    let customer_id = Uuid::new_v4();
    t.directory.insert(CustomerRecord {
        id: customer_id,
        tenant_id: t.tenant_id,
        name: "Sana M.".to_string(),
        phone: None,
    });
    let subscription_id = Uuid::new_v4();
    let now = Utc::now();
    t.store
        .add_subscription(PackageSubscription {
            id: subscription_id,
            tenant_id: t.tenant_id,
            customer_id,
            status: SubscriptionStatus::Active,
            entitlements: vec![ServiceEntitlement::new(subscription_id, t.service_id, 4)],
            created_at: now,
            updated_at: now,
        })
        .await;

    let (status, body) = post_json(
        &t.app,
        "/v1/bookings",
        &admit_body(&t, Some(customer_id), None, 3),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["package_covered_quantity"], 3);
    assert_eq!(body["booking"]["paid_quantity"], 0);
    assert_eq!(body["booking"]["total_price_cents"], 0);
    assert_eq!(body["booking"]["payment_status"], "NOT_REQUIRED");

    // Fully covered booking never reached the accounting adapter
    assert_eq!(t.invoices.invocation_count(), 0);
}

#[tokio::test]
async fn test_phone_match_suggests_but_books_as_guest() {
    let t = build_app(5).await;

    let customer_id = Uuid::new_v4();
    t.directory.insert(CustomerRecord {
        id: customer_id,
        tenant_id: t.tenant_id,
        name: "Hamza T.".to_string(),
        phone: Some("+92 321 5556677".to_string()),
    });
    let subscription_id = Uuid::new_v4();
    let now = Utc::now();
    t.store
        .add_subscription(PackageSubscription {
            id: subscription_id,
            tenant_id: t.tenant_id,
            customer_id,
            status: SubscriptionStatus::Active,
            entitlements: vec![ServiceEntitlement::new(subscription_id, t.service_id, 10)],
            created_at: now,
            updated_at: now,
        })
        .await;

    let (status, body) = post_json(
        &t.app,
        "/v1/bookings",
        &admit_body(&t, None, Some("0321-5556677"), 2),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Suggestion offered with a redacted phone, but no coverage granted
    let suggestions = body["customer_suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["customer_id"], json!(customer_id));
    assert!(suggestions[0]["redacted_phone"]
        .as_str()
        .unwrap()
        .ends_with("6677"));
    assert_eq!(body["booking"]["customer_id"], Value::Null);
    assert_eq!(body["booking"]["package_covered_quantity"], 0);
    assert_eq!(body["booking"]["paid_quantity"], 2);
}

#[tokio::test]
async fn test_bulk_admission_mixes_outcomes() {
    let t = build_app(3).await;

    let body = json!({
        "bookings": [
            admit_body(&t, None, None, 2),
            admit_body(&t, None, None, 2),
        ]
    });
    let (status, items) = post_json(&t.app, "/v1/bookings/bulk", &body).await;
    assert_eq!(status, StatusCode::OK);
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0]["booking"].is_object());
    assert!(items[1]["booking"].is_null());
    assert!(items[1]["error"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("capacity"));
}

#[tokio::test]
async fn test_unknown_status_rejected() {
    let t = build_app(2).await;

    let (status, body) = post_json(&t.app, "/v1/bookings", &admit_body(&t, None, None, 1)).await;
    assert_eq!(status, StatusCode::OK);
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &t.app,
        &format!("/v1/bookings/{booking_id}/status"),
        &json!({"status": "NO_SHOW"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("NO_SHOW"));
}

#[tokio::test]
async fn test_slot_availability_endpoint() {
    let t = build_app(4).await;
    post_json(&t.app, "/v1/bookings", &admit_body(&t, None, None, 3)).await;

    let (status, body) = get_json(&t.app, &format!("/v1/slots/{}/availability", t.slot_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_capacity"], 1);
    assert_eq!(body["booked_count"], 3);
    assert_eq!(body["original_capacity"], 4);

    let (status, _) = get_json(&t.app, &format!("/v1/slots/{}/availability", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

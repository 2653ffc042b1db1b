use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::ReservationStatus;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

fn reservation_json(id: &str) -> Value {
    json!({
        "id": id,
        "customer_name": "Ana",
        "customer_email": "a@b.com",
        "reservation_date": "2099-01-01",
        "reservation_time": "19:00",
        "party_size": 4,
        "status": "pending",
        "created_at": "2099-01-01T00:00:00Z"
    })
}

fn sample_draft() -> ReservationDraft {
    ReservationDraft {
        customer_name: "Ana".into(),
        customer_email: "a@b.com".into(),
        reservation_date: NaiveDate::from_ymd_opt(2099, 1, 1),
        reservation_time: chrono::NaiveTime::from_hms_opt(19, 0, 0),
        party_size: 4,
        ..ReservationDraft::default()
    }
}

async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/api")
}

async fn handle_create(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .received
        .lock()
        .await
        .push(("POST".to_string(), body));
    (
        StatusCode::CREATED,
        Json(json!({ "data": reservation_json("r1") })),
    )
}

async fn handle_update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .received
        .lock()
        .await
        .push((format!("PUT {id}"), body));
    let mut updated = reservation_json(&id);
    updated["status"] = json!("cancelled");
    Json(json!({ "data": updated }))
}

async fn handle_delete(State(state): State<ServerState>, Path(id): Path<String>) -> StatusCode {
    state
        .received
        .lock()
        .await
        .push((format!("DELETE {id}"), Value::Null));
    StatusCode::NO_CONTENT
}

#[tokio::test]
async fn list_all_unwraps_data_envelope() {
    let app = Router::new().route(
        "/api/reservas",
        get(|| async {
            Json(json!({ "data": [reservation_json("r1"), reservation_json("r2")] }))
        }),
    );
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");

    let reservations = gateway.list_all().await.expect("list");

    let ids: Vec<&str> = reservations.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);
}

#[tokio::test]
async fn list_all_keeps_records_with_unfamiliar_fields() {
    let app = Router::new().route(
        "/api/reservas",
        get(|| async {
            let mut odd = reservation_json("r2");
            odd["table_number"] = json!(12);
            odd["status"] = json!("no_show");
            Json(json!({ "data": [reservation_json("r1"), odd] }))
        }),
    );
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");

    let reservations = gateway.list_all().await.expect("list");

    assert_eq!(reservations.len(), 2);
    assert_eq!(
        reservations[1].status,
        ReservationStatus::Other("no_show".into())
    );
    assert_eq!(
        reservations[1].table_preference.as_ref().map(|t| t.as_str()),
        Some("12")
    );
}

#[tokio::test]
async fn list_all_failure_without_reason_is_transport_error() {
    let app = Router::new().route(
        "/api/reservas",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");

    let err = gateway.list_all().await.expect_err("list should fail");

    assert_eq!(
        err,
        GatewayError::Transport("failed to fetch reservations".into())
    );
}

#[tokio::test]
async fn list_by_date_uses_date_path() {
    let app = Router::new().route(
        "/api/reservas/date/:date",
        get(|Path(date): Path<String>| async move {
            let mut reservation = reservation_json("r9");
            reservation["reservation_date"] = json!(date);
            Json(json!({ "data": [reservation] }))
        }),
    );
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");
    let day = NaiveDate::from_ymd_opt(2099, 3, 7).expect("date");

    let reservations = gateway.list_by_date(day).await.expect("list by date");

    assert_eq!(reservations.len(), 1);
    assert_eq!(reservations[0].reservation_date, day);
}

#[tokio::test]
async fn create_posts_draft_and_returns_server_record() {
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/reservas", post(handle_create))
        .with_state(state.clone());
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");

    let created = gateway.create(&sample_draft()).await.expect("create");

    assert_eq!(created.id.as_str(), "r1");
    assert_eq!(created.status, ReservationStatus::Pending);
    let received = state.received.lock().await;
    assert_eq!(received.len(), 1);
    let (_, body) = &received[0];
    assert_eq!(body["customer_name"], json!("Ana"));
    assert_eq!(body["reservation_date"], json!("2099-01-01"));
    assert_eq!(body["reservation_time"], json!("19:00"));
    assert_eq!(body["party_size"], json!(4));
    assert!(body.get("customer_phone").is_none());
}

#[tokio::test]
async fn create_surfaces_service_reason() {
    let app = Router::new().route(
        "/api/reservas",
        post(|| async {
            (
                StatusCode::CONFLICT,
                Json(json!({ "error": "no tables available at 19:00" })),
            )
        }),
    );
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");

    let err = gateway
        .create(&sample_draft())
        .await
        .expect_err("create should fail");

    assert!(err.is_service());
    assert_eq!(err.message(), "no tables available at 19:00");
}

#[tokio::test]
async fn create_with_unusable_error_body_falls_back_to_generic_reason() {
    let app = Router::new().route(
        "/api/reservas",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
    );
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");

    let err = gateway
        .create(&sample_draft())
        .await
        .expect_err("create should fail");

    assert_eq!(
        err,
        GatewayError::Transport("failed to create reservation".into())
    );
}

#[tokio::test]
async fn malformed_success_body_is_transport_error() {
    let app = Router::new().route(
        "/api/reservas",
        get(|| async { Json(json!({ "items": [] })) }),
    );
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");

    let err = gateway.list_all().await.expect_err("list should fail");

    assert!(!err.is_service());
}

#[tokio::test]
async fn update_sends_only_changed_fields() {
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/reservas/:id", put(handle_update))
        .with_state(state.clone());
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");
    let changes = ReservationUpdate {
        status: Some(ReservationStatus::Cancelled),
        ..ReservationUpdate::default()
    };

    let updated = gateway
        .update(&ReservationId::from("r7"), &changes)
        .await
        .expect("update");

    assert_eq!(updated.status, ReservationStatus::Cancelled);
    let received = state.received.lock().await;
    assert_eq!(
        received.as_slice(),
        &[("PUT r7".to_string(), json!({ "status": "cancelled" }))]
    );
}

#[tokio::test]
async fn remove_accepts_empty_confirmation() {
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/reservas/:id", axum::routing::delete(handle_delete))
        .with_state(state.clone());
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");

    let confirmation = gateway
        .remove(&ReservationId::from("r3"))
        .await
        .expect("remove");

    assert_eq!(confirmation, DeleteConfirmation::default());
    assert_eq!(state.received.lock().await[0].0, "DELETE r3");
}

#[tokio::test]
async fn remove_reports_missing_reservation() {
    let app = Router::new().route(
        "/api/reservas/:id",
        axum::routing::delete(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "reservation not found" })),
            )
        }),
    );
    let gateway = HttpReservationGateway::new(&spawn_server(app).await).expect("gateway");

    let err = gateway
        .remove(&ReservationId::from("missing"))
        .await
        .expect_err("remove should fail");

    assert_eq!(err, GatewayError::Service("reservation not found".into()));
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let gateway = HttpReservationGateway::new(&format!("http://{addr}/api")).expect("gateway");

    let err = gateway.list_all().await.expect_err("list should fail");

    assert_eq!(
        err,
        GatewayError::Transport("failed to fetch reservations".into())
    );
}

#[test]
fn endpoints_ignore_trailing_slash_and_escape_ids() {
    let gateway = HttpReservationGateway::new("http://localhost:3000/api/").expect("gateway");

    assert_eq!(gateway.base_url().as_str(), "http://localhost:3000/api/");

    assert_eq!(
        gateway.endpoint(&[RESERVATIONS_PATH]).as_str(),
        "http://localhost:3000/api/reservas"
    );
    assert_eq!(
        gateway.endpoint(&[RESERVATIONS_PATH, "a/b"]).as_str(),
        "http://localhost:3000/api/reservas/a%2Fb"
    );
}

#[test]
fn rejects_non_http_base_urls() {
    assert!(HttpReservationGateway::new("ftp://example.com/api").is_err());
    assert!(HttpReservationGateway::new("not a url").is_err());
}

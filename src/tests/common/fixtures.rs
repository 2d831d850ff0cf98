use axum::{
    extract::{Json, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::FormConfig;
use crate::models::common::{SessionContext, Source};
use crate::models::payload::ReservationPayload;
use crate::models::reservation::{MenuSelection, ReservationDraft, VisitType};

/// First selectable day used by controller tests
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 10).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn test_config() -> FormConfig {
    FormConfig {
        webhook_url: "http://127.0.0.1:9/webhook/reservation".to_string(),
        ..FormConfig::default()
    }
}

pub fn test_session() -> SessionContext {
    SessionContext::new("U-test-user", Source::Chat)
}

/// A draft that passes every step
pub fn complete_draft() -> ReservationDraft {
    ReservationDraft {
        visit_type: Some(VisitType::Revisit),
        menu: Some(MenuSelection {
            menu_id: "shoulder".to_string(),
            menu_name: "肩こり".to_string(),
            duration_minutes: 30,
        }),
        selected_date: Some(test_today()),
        selected_time: Some(time(9, 0)),
        customer_name: "  山田太郎 ".to_string(),
        phone: "090-1234-5678".to_string(),
        symptom_note: "右肩が上がらない".to_string(),
        memo: String::new(),
        ..ReservationDraft::default()
    }
}

// ----- throwaway HTTP endpoint -----

#[derive(Clone)]
struct ServerState {
    status: StatusCode,
    slots: Vec<String>,
    received: Arc<Mutex<Vec<ReservationPayload>>>,
    content_types: Arc<Mutex<Vec<String>>>,
    availability_queries: Arc<Mutex<Vec<String>>>,
}

/// Local stand-in for the reservation webhook and the availability API.
pub struct TestServer {
    pub base_url: String,
    received: Arc<Mutex<Vec<ReservationPayload>>>,
    content_types: Arc<Mutex<Vec<String>>>,
    availability_queries: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub fn webhook_url(&self) -> String {
        format!("{}/webhook/reservation", self.base_url)
    }

    pub fn availability_url(&self) -> String {
        format!("{}/availability", self.base_url)
    }

    pub fn received(&self) -> Vec<ReservationPayload> {
        self.received.lock().unwrap().clone()
    }

    pub fn content_types(&self) -> Vec<String> {
        self.content_types.lock().unwrap().clone()
    }

    pub fn availability_queries(&self) -> Vec<String> {
        self.availability_queries.lock().unwrap().clone()
    }
}

async fn record_reservation(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<ReservationPayload>,
) -> StatusCode {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.content_types.lock().unwrap().push(content_type);
    state.received.lock().unwrap().push(payload);
    state.status
}

async fn list_slots(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let date = params.get("date").cloned().unwrap_or_default();
    state.availability_queries.lock().unwrap().push(date);
    Json(json!({ "slots": state.slots }))
}

/// Start a server that answers webhook posts with `status` and reports `slots` as free.
pub async fn spawn_test_server(status: StatusCode, slots: &[&str]) -> TestServer {
    let state = ServerState {
        status,
        slots: slots.iter().map(|s| s.to_string()).collect(),
        received: Arc::new(Mutex::new(Vec::new())),
        content_types: Arc::new(Mutex::new(Vec::new())),
        availability_queries: Arc::new(Mutex::new(Vec::new())),
    };

    let server = TestServer {
        base_url: String::new(),
        received: Arc::clone(&state.received),
        content_types: Arc::clone(&state.content_types),
        availability_queries: Arc::clone(&state.availability_queries),
    };

    let app = Router::new()
        .route("/webhook/reservation", post(record_reservation))
        .route("/availability", get(list_slots))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        ..server
    }
}

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::router::scheduling_routes;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

const DATE: &str = "2025-09-01";

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

fn with_json_body(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, "Bearer test-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn availability_rejects_malformed_provider_id() {
    let app = scheduling_routes(TestConfig::default().to_arc());

    let response = app
        .oneshot(get(&format!(
            "/availability?provider_id=garbage&weekday=monday&date={}",
            DATE
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn availability_returns_slot_list_with_total() {
    let server = MockServer::start().await;
    let provider_id = Uuid::new_v4().to_string();
    let slot_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/slot_templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::slot_template(
                &slot_id,
                &provider_id,
                "monday",
                "9:00 AM",
                "09:00",
                1,
                true,
            )
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/blackouts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = scheduling_routes(TestConfig::for_server(&server.uri()).to_arc());
    let response = app
        .oneshot(get(&format!(
            "/availability?provider_id={}&weekday=monday&date={}",
            provider_id, DATE
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["slots"][0]["display_time"], "9:00 AM");
    assert_eq!(body["slots"][0]["is_booked"], false);
}

#[tokio::test]
async fn double_booking_returns_conflict_with_occupying_appointment() {
    let server = MockServer::start().await;
    let provider_id = Uuid::new_v4().to_string();
    let hospital_id = Uuid::new_v4().to_string();
    let slot_id = Uuid::new_v4().to_string();
    let existing_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::provider(&provider_id, Some(&hospital_id))
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/hospitals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::hospital(&hospital_id, "Happy Paws Clinic")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/slot_templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::slot_template(
                &slot_id,
                &provider_id,
                "monday",
                "9:00 AM",
                "09:00",
                1,
                true,
            )
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/next_daily_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(2)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment(
                &existing_id,
                &hospital_id,
                &provider_id,
                DATE,
                &slot_id,
                "HPC001-2025-09-01",
                "booked",
            )
        ])))
        .mount(&server)
        .await;

    let app = scheduling_routes(TestConfig::for_server(&server.uri()).to_arc());
    let response = app
        .oneshot(with_json_body(
            "POST",
            "/",
            json!({
                "provider_id": provider_id,
                "date": DATE,
                "slot_id": slot_id,
                "companion_id": Uuid::new_v4().to_string(),
                "owner_id": Uuid::new_v4().to_string(),
                "purpose": "Annual checkup"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["conflicting_appointment"]["id"], existing_id.as_str());
    assert_eq!(
        body["conflicting_appointment"]["token_number"],
        "HPC001-2025-09-01"
    );
}

#[tokio::test]
async fn booking_returns_token_number_in_response() {
    let server = MockServer::start().await;
    let provider_id = Uuid::new_v4().to_string();
    let hospital_id = Uuid::new_v4().to_string();
    let slot_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::provider(&provider_id, Some(&hospital_id))
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/hospitals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::hospital(&hospital_id, "Happy Paws Clinic")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/slot_templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::slot_template(
                &slot_id,
                &provider_id,
                "monday",
                "9:00 AM",
                "09:00",
                1,
                true,
            )
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/next_daily_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment(
                &Uuid::new_v4().to_string(),
                &hospital_id,
                &provider_id,
                DATE,
                &slot_id,
                "HPC001-2025-09-01",
                "booked",
            )
        ])))
        .mount(&server)
        .await;

    let app = scheduling_routes(TestConfig::for_server(&server.uri()).to_arc());
    let response = app
        .oneshot(with_json_body(
            "POST",
            "/",
            json!({
                "provider_id": provider_id,
                "date": DATE,
                "slot_id": slot_id,
                "companion_id": Uuid::new_v4().to_string(),
                "owner_id": Uuid::new_v4().to_string()
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["token_number"], "HPC001-2025-09-01");
    assert_eq!(body["appointment"]["status"], "booked");
}

#[tokio::test]
async fn status_update_rejects_unknown_status_value() {
    let app = scheduling_routes(TestConfig::default().to_arc());
    let appointment_id = Uuid::new_v4().to_string();

    let response = app
        .oneshot(with_json_body(
            "PATCH",
            &format!("/{}/status", appointment_id),
            json!({ "status": "teleported" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_bearer_token_is_a_client_error() {
    let app = scheduling_routes(TestConfig::default().to_arc());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(&format!(
                    "/availability?provider_id={}&weekday=monday&date={}",
                    Uuid::new_v4(),
                    DATE
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn get_appointment_maps_missing_record_to_404() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = scheduling_routes(TestConfig::for_server(&server.uri()).to_arc());
    let response = app
        .oneshot(get(&format!("/{}", appointment_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::router::booking_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(config: &TestConfig) -> Router {
    booking_routes(Arc::new(config.to_app_config()))
}

fn customer() -> TestUser {
    TestUser::customer("maria@example.com")
}

async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token));

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

fn booking_body(slot_id: Uuid) -> Value {
    json!({
        "name": "Maria Silva",
        "email": "maria@example.com",
        "phone": "(11) 99999-0000",
        "service_name": "Tarot",
        "appointment_date": "2024-06-01",
        "slot_id": slot_id,
        "message": "Primeira consulta"
    })
}

fn mount_slot_lookup(slot_id: Uuid, date: &str, is_booked: bool) -> Mock {
    Mock::given(method("GET"))
        .and(path("/rest/v1/admin_availability"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &slot_id.to_string(), date, "10:00:00", "11:00:00", is_booked),
        ])))
}

#[tokio::test]
async fn open_slots_are_listed_for_the_picker() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = customer();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/admin_availability"))
        .and(query_param("available_date", "eq.2024-06-01"))
        .and(query_param("is_booked", "eq.false"))
        .and(query_param("order", "start_time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &Uuid::new_v4().to_string(), "2024-06-01", "09:00:00", "10:00:00", false),
            MockSupabaseResponses::slot_response(
                &Uuid::new_v4().to_string(), "2024-06-01", "10:00:00", "11:00:00", false),
        ])))
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        create_test_app(&config),
        "GET",
        "/slots?date=2024-06-01",
        &token,
        None,
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["slots"][0]["is_booked"], false);
}

#[tokio::test]
async fn booking_claims_the_slot_and_creates_the_appointment() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = customer();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let slot_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    mount_slot_lookup(slot_id, "2024-06-01", false)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/admin_availability"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .and(query_param("is_booked", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &slot_id.to_string(), "2024-06-01", "10:00:00", "11:00:00", true),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id.to_string(),
                &user.id,
                &slot_id.to_string(),
                "2024-06-01",
                "10:00:00",
                "Tarot",
            ),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/admin_notifications"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        create_test_app(&config),
        "POST",
        "/",
        &token,
        Some(booking_body(slot_id)),
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["admin_notified"], true);
    assert_eq!(body["appointment"]["status"], "confirmado");
    assert_eq!(body["notification"]["title"], "Consulta Agendada!");
    assert!(body["notification"]["message"]
        .as_str()
        .unwrap()
        .contains("01/06/2024"));
}

#[tokio::test]
async fn already_booked_slot_is_a_conflict() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = customer();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let slot_id = Uuid::new_v4();

    mount_slot_lookup(slot_id, "2024-06-01", true)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/admin_availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        create_test_app(&config),
        "POST",
        "/",
        &token,
        Some(booking_body(slot_id)),
    ).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("não está mais disponível"));
}

#[tokio::test]
async fn losing_the_booking_race_is_a_conflict_without_an_appointment() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = customer();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let slot_id = Uuid::new_v4();

    // Open at pre-check time, but a racing booking wins the conditional
    // update and the claim matches zero rows.
    mount_slot_lookup(slot_id, "2024-06-01", false)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/admin_availability"))
        .and(query_param("is_booked", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, _) = send_json(
        create_test_app(&config),
        "POST",
        "/",
        &token,
        Some(booking_body(slot_id)),
    ).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn failed_appointment_insert_releases_the_slot() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = customer();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let slot_id = Uuid::new_v4();

    mount_slot_lookup(slot_id, "2024-06-01", false)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/admin_availability"))
        .and(query_param("is_booked", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &slot_id.to_string(), "2024-06-01", "10:00:00", "11:00:00", true),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "insert failed"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Rollback: the claim is undone with an unconditional update.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/admin_availability"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, _) = send_json(
        create_test_app(&config),
        "POST",
        "/",
        &token,
        Some(booking_body(slot_id)),
    ).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn date_mismatch_between_slot_and_request_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = customer();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let slot_id = Uuid::new_v4();

    // Slot belongs to another day than the one in the request.
    mount_slot_lookup(slot_id, "2024-06-02", false)
        .mount(&mock_server)
        .await;

    let (status, _) = send_json(
        create_test_app(&config),
        "POST",
        "/",
        &token,
        Some(booking_body(slot_id)),
    ).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_contact_details_never_reach_the_store() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = customer();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/admin_availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut body = booking_body(Uuid::new_v4());
    body["email"] = json!("not-an-email");

    let (status, _) = send_json(
        create_test_app(&config),
        "POST",
        "/",
        &token,
        Some(body),
    ).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_failure_when_admin_notification_fails_is_still_a_success() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = customer();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let slot_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    mount_slot_lookup(slot_id, "2024-06-01", false)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/admin_availability"))
        .and(query_param("is_booked", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(
                &slot_id.to_string(), "2024-06-01", "10:00:00", "11:00:00", true),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id.to_string(),
                &user.id,
                &slot_id.to_string(),
                "2024-06-01",
                "10:00:00",
                "Tarot",
            ),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/admin_notifications"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        create_test_app(&config),
        "POST",
        "/",
        &token,
        Some(booking_body(slot_id)),
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["admin_notified"], false);
}

#[tokio::test]
async fn incomplete_request_body_is_a_validation_error() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = customer();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    let mut body = booking_body(Uuid::new_v4());
    body.as_object_mut().unwrap().remove("slot_id");

    let (status, response) = send_json(
        create_test_app(&config),
        "POST",
        "/",
        &token,
        Some(body),
    ).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].is_string());
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let app = create_test_app(&config);

    let request = Request::builder()
        .method("GET")
        .uri("/slots?date=2024-06-01")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

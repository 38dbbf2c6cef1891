//! Request builders and fixtures shared by the HTTP test suites.
#![allow(dead_code)]

use actix_web::test::TestRequest;
use serde_json::{Value, json};

/// Builds the full application over the given `Arc<dyn Store>`.
macro_rules! init_app {
    ($store:expr) => {{
        let store: std::sync::Arc<dyn medischedule::store::Store> = $store;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from(store))
                .app_data(medischedule::routes::json_config())
                .configure(medischedule::routes::configure),
        )
        .await
    }};
}

/// Sends a request and returns the status with the JSON body.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (status, body)
    }};
}

pub fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri)
}

pub fn delete(uri: &str) -> TestRequest {
    TestRequest::delete().uri(uri)
}

pub fn post(uri: &str, body: Value) -> TestRequest {
    TestRequest::post().uri(uri).set_json(body)
}

pub fn put(uri: &str, body: Value) -> TestRequest {
    TestRequest::put().uri(uri).set_json(body)
}

pub fn patch(uri: &str, body: Value) -> TestRequest {
    TestRequest::patch().uri(uri).set_json(body)
}

pub fn cardiology() -> Value {
    json!({ "specialization": "Cardiología" })
}

pub fn patient_1990() -> Value {
    json!({ "birth_date": "1990-01-01" })
}

pub fn checkup(doctor_id: i64, patient_id: i64) -> Value {
    json!({
        "doctor_id": doctor_id,
        "patient_id": patient_id,
        "date_time": "2024-12-01 10:00:00",
        "reason": "Consulta general",
    })
}

/// True for the `YYYY-MM-DD HH:MM:SS` shape every timestamp is rendered in.
pub fn is_timestamp(value: &Value) -> bool {
    let format = "%Y-%m-%d %H:%M:%S";
    value
        .as_str()
        .is_some_and(|raw| chrono::NaiveDateTime::parse_from_str(raw, format).is_ok())
}

//! The same HTTP behaviour checked against PostgreSQL. Each test runs on one
//! connection inside a never-committed transaction, with the migrations
//! applied to a fresh schema, so nothing is left behind.
//!
//! Skipped unless `DATABASE_URL` points at a PostgreSQL server.

#[macro_use]
mod common;

use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::http::StatusCode;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use serde_json::json;

use common::{cardiology, checkup, delete, get, patient_1990, post};
use medischedule::store::{PgStore, Store};

const MIGRATIONS: [&str; 4] = [
    include_str!("../migrations/2024-11-15-000001_create_users/up.sql"),
    include_str!("../migrations/2024-11-15-000002_create_doctors/up.sql"),
    include_str!("../migrations/2024-11-15-000003_create_patients/up.sql"),
    include_str!("../migrations/2024-11-15-000004_create_appointments/up.sql"),
];

static SCHEMAS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
struct ScratchSchema;

impl CustomizeConnection<PgConnection, r2d2::Error> for ScratchSchema {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), r2d2::Error> {
        let schema = format!(
            "medischedule_test_{}_{}",
            process::id(),
            SCHEMAS.fetch_add(1, Ordering::SeqCst)
        );
        conn.begin_test_transaction().map_err(r2d2::Error::QueryError)?;
        conn.batch_execute(&format!("CREATE SCHEMA {schema}; SET LOCAL search_path TO {schema};"))
            .map_err(r2d2::Error::QueryError)?;
        for migration in MIGRATIONS {
            conn.batch_execute(migration).map_err(r2d2::Error::QueryError)?;
        }
        Ok(())
    }
}

/// A store over a single rolled-back connection, or `None` without a database.
fn pg_store() -> Option<Arc<dyn Store>> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;
    if !url.starts_with("postgres") {
        eprintln!("DATABASE_URL is not PostgreSQL; skipping");
        return None;
    }
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(ScratchSchema))
        .build(ConnectionManager::<PgConnection>::new(url))
        .expect("connect to DATABASE_URL");
    Some(Arc::new(PgStore::new(pool)))
}

macro_rules! pg_app {
    () => {
        match pg_store() {
            Some(store) => init_app!(store),
            None => return,
        }
    };
}

#[actix_web::test]
async fn get_embeds_doctor_and_patient() {
    let app = pg_app!();
    send!(app, post("/doctors", cardiology()));
    send!(app, post("/patients", patient_1990()));
    let (status, created) = send!(app, post("/appointments", checkup(1, 1)));
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/appointments/{}", created["id"]);
    let (status, fetched) = send!(app, get(&uri));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["doctor"]["specialization"], "Cardiología");
    assert_eq!(fetched["patient"]["birth_date"], "1990-01-01");
    assert_eq!(fetched["created_at"], created["created_at"]);

    let (_, only_patient) = send!(app, get(&format!("{uri}?with=patient")));
    assert!(only_patient.get("doctor").is_none());
    assert_eq!(only_patient["patient"]["id"], 1);
}

#[actix_web::test]
async fn deleting_a_doctor_cascades() {
    let app = pg_app!();
    send!(app, post("/doctors", cardiology()));
    send!(app, post("/patients", patient_1990()));
    send!(app, post("/appointments", checkup(1, 1)));
    send!(app, post("/appointments", checkup(1, 1)));

    let (status, _) = send!(app, delete("/doctors/1"));
    assert_eq!(status, StatusCode::OK);

    let (_, all) = send!(app, get("/appointments"));
    assert_eq!(all, json!([]));
    let (status, _) = send!(app, get("/patients/1"));
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn deleting_a_patient_cascades() {
    let app = pg_app!();
    send!(app, post("/doctors", cardiology()));
    send!(app, post("/patients", patient_1990()));
    send!(app, post("/appointments", checkup(1, 1)));

    let (status, _) = send!(app, delete("/patients/1"));
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send!(app, get("/appointments/1"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, patients) = send!(app, get("/doctors/1/patients"));
    assert_eq!(patients, json!([]));
}

// The unique violation aborts the surrounding test transaction, so nothing
// may query after it.
#[actix_web::test]
async fn duplicate_email_is_a_conflict() {
    let app = pg_app!();
    let body = json!({ "name": "Ana", "email": "ana@example.com" });

    let (status, _) = send!(app, post("/users", body.clone()));
    assert_eq!(status, StatusCode::CREATED);
    let (status, error) = send!(app, post("/users", body));

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["message"], "The email has already been taken.");
    assert_eq!(error["errors"]["email"][0], "The email has already been taken.");
}

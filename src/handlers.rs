use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::models::Relations;
use crate::services::{appointments, doctors, patients, users};
use crate::store::Store;

type Db = web::Data<dyn Store>;

fn deleted(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": message }))
}

/// `?with=doctor,patient` on appointment reads. Absent means both.
#[derive(Debug, Deserialize)]
pub struct WithQuery {
    with: Option<String>,
}

impl WithQuery {
    fn relations(&self) -> Result<Relations, AppError> {
        match self.with.as_deref() {
            None => Ok(Relations::all()),
            Some(raw) => raw.parse().map_err(AppError::BadRequest),
        }
    }
}

// Handler to list all users
pub async fn list_users(store: Db) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let users = web::block(move || users::list(store.as_ref())).await??;
    Ok(HttpResponse::Ok().json(users))
}

// Handler to get a user by ID
pub async fn get_user(store: Db, user_id: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = user_id.into_inner();
    let user = web::block(move || users::get(store.as_ref(), id)).await??;
    Ok(HttpResponse::Ok().json(user))
}

// Handler to create a new user
pub async fn create_user(store: Db, body: web::Json<Value>) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let body = body.into_inner();
    let user = web::block(move || users::create(store.as_ref(), &body)).await??;
    Ok(HttpResponse::Created().json(user))
}

// Handler to list all doctors
pub async fn list_doctors(store: Db) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let doctors = web::block(move || doctors::list(store.as_ref())).await??;
    Ok(HttpResponse::Ok().json(doctors))
}

// Handler to get a doctor by ID
pub async fn get_doctor(store: Db, doctor_id: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = doctor_id.into_inner();
    let doctor = web::block(move || doctors::get(store.as_ref(), id)).await??;
    Ok(HttpResponse::Ok().json(doctor))
}

// Handler to create a new doctor
pub async fn create_doctor(store: Db, body: web::Json<Value>) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let body = body.into_inner();
    let doctor = web::block(move || doctors::create(store.as_ref(), &body)).await??;
    Ok(HttpResponse::Created().json(doctor))
}

// Handler to update a doctor
pub async fn update_doctor(
    store: Db,
    doctor_id: web::Path<i64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = doctor_id.into_inner();
    let body = body.into_inner();
    let doctor = web::block(move || doctors::update(store.as_ref(), id, &body)).await??;
    Ok(HttpResponse::Ok().json(doctor))
}

// Handler to delete a doctor and, through the foreign key, their appointments
pub async fn delete_doctor(store: Db, doctor_id: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = doctor_id.into_inner();
    web::block(move || doctors::delete(store.as_ref(), id)).await??;
    Ok(deleted("Doctor deleted successfully"))
}

// Handler to list the patients a doctor has appointments with
pub async fn get_doctor_patients(
    store: Db,
    doctor_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = doctor_id.into_inner();
    let linked = web::block(move || doctors::patients(store.as_ref(), id)).await??;
    Ok(HttpResponse::Ok().json(linked))
}

// Handler to list all patients
pub async fn list_patients(store: Db) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let patients = web::block(move || patients::list(store.as_ref())).await??;
    Ok(HttpResponse::Ok().json(patients))
}

// Handler to get a patient by ID
pub async fn get_patient(store: Db, patient_id: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = patient_id.into_inner();
    let patient = web::block(move || patients::get(store.as_ref(), id)).await??;
    Ok(HttpResponse::Ok().json(patient))
}

// Handler to create a new patient
pub async fn create_patient(store: Db, body: web::Json<Value>) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let body = body.into_inner();
    let patient = web::block(move || patients::create(store.as_ref(), &body)).await??;
    Ok(HttpResponse::Created().json(patient))
}

// Handler to update a patient
pub async fn update_patient(
    store: Db,
    patient_id: web::Path<i64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = patient_id.into_inner();
    let body = body.into_inner();
    let patient = web::block(move || patients::update(store.as_ref(), id, &body)).await??;
    Ok(HttpResponse::Ok().json(patient))
}

// Handler to delete a patient and their appointments
pub async fn delete_patient(
    store: Db,
    patient_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = patient_id.into_inner();
    web::block(move || patients::delete(store.as_ref(), id)).await??;
    Ok(deleted("Patient deleted successfully"))
}

// Handler to list the doctors a patient has appointments with
pub async fn get_patient_doctors(
    store: Db,
    patient_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = patient_id.into_inner();
    let linked = web::block(move || patients::doctors(store.as_ref(), id)).await??;
    Ok(HttpResponse::Ok().json(linked))
}

// Handler to list all appointments with the requested associations
pub async fn list_appointments(
    store: Db,
    query: web::Query<WithQuery>,
) -> Result<HttpResponse, AppError> {
    let with = query.relations()?;
    let store = store.into_inner();
    let appointments = web::block(move || appointments::list(store.as_ref(), with)).await??;
    Ok(HttpResponse::Ok().json(appointments))
}

// Handler to get an appointment by ID with the requested associations
pub async fn get_appointment(
    store: Db,
    appointment_id: web::Path<i64>,
    query: web::Query<WithQuery>,
) -> Result<HttpResponse, AppError> {
    let with = query.relations()?;
    let store = store.into_inner();
    let id = appointment_id.into_inner();
    let appointment = web::block(move || appointments::get(store.as_ref(), id, with)).await??;
    Ok(HttpResponse::Ok().json(appointment))
}

// Handler to create a new appointment
pub async fn create_appointment(
    store: Db,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let body = body.into_inner();
    let appointment = web::block(move || appointments::create(store.as_ref(), &body)).await??;
    Ok(HttpResponse::Created().json(appointment))
}

// Handler to delete an appointment
pub async fn delete_appointment(
    store: Db,
    appointment_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let store = store.into_inner();
    let id = appointment_id.into_inner();
    web::block(move || appointments::delete(store.as_ref(), id)).await??;
    Ok(deleted("Appointment deleted successfully"))
}

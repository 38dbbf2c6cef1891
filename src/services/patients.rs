use serde_json::Value;

use super::now;
use crate::error::Result;
use crate::models::{Entity, LinkedDoctor, NewPatient, Patient, PatientChanges};
use crate::store::Store;
use crate::validation::{Constraint, FieldRule, FieldType, validate};

pub const CREATE_RULES: &[FieldRule] = &[
    FieldRule::optional("user_id", FieldType::Integer)
        .with(&[Constraint::Exists(Entity::User)]),
    FieldRule::required("birth_date", FieldType::Date),
    FieldRule::optional("medical_history", FieldType::String),
];

// Partial update: each field is checked only when present. `birth_date` is
// NOT NULL, so it may be omitted but never nulled.
pub const UPDATE_RULES: &[FieldRule] = &[
    FieldRule::optional("user_id", FieldType::Integer)
        .with(&[Constraint::Exists(Entity::User)]),
    FieldRule::sometimes("birth_date", FieldType::Date),
    FieldRule::optional("medical_history", FieldType::String),
];

pub fn list(store: &dyn Store) -> Result<Vec<Patient>> {
    Ok(store.list_patients()?)
}

pub fn get(store: &dyn Store, id: i64) -> Result<Patient> {
    Ok(store.find_patient(id)?)
}

pub fn create(store: &dyn Store, body: &Value) -> Result<Patient> {
    let input = validate(body, CREATE_RULES, store)?;
    let now = now();
    let patient = store.insert_patient(NewPatient {
        user_id: input.integer("user_id"),
        birth_date: input.require_date("birth_date")?,
        medical_history: input.text("medical_history"),
        created_at: now,
        updated_at: now,
    })?;
    tracing::info!(patient_id = patient.id, "patient created");
    Ok(patient)
}

pub fn update(store: &dyn Store, id: i64, body: &Value) -> Result<Patient> {
    let input = validate(body, UPDATE_RULES, store)?;
    let patient = store.update_patient(
        id,
        PatientChanges {
            user_id: input.nullable_integer("user_id"),
            birth_date: input.date("birth_date"),
            medical_history: input.nullable_text("medical_history"),
            updated_at: now(),
        },
    )?;
    tracing::info!(patient_id = patient.id, "patient updated");
    Ok(patient)
}

pub fn delete(store: &dyn Store, id: i64) -> Result<()> {
    store.delete_patient(id)?;
    tracing::info!(patient_id = id, "patient deleted with its appointments");
    Ok(())
}

/// Doctors the patient has seen, one entry per appointment.
pub fn doctors(store: &dyn Store, id: i64) -> Result<Vec<LinkedDoctor>> {
    store.find_patient(id)?;
    Ok(store.patient_doctors(id)?)
}

use serde_json::Value;

use super::now;
use crate::error::Result;
use crate::models::{Doctor, DoctorChanges, Entity, LinkedPatient, NewDoctor};
use crate::store::Store;
use crate::validation::{Constraint, FieldRule, FieldType, validate};

pub const CREATE_RULES: &[FieldRule] = &[
    FieldRule::optional("user_id", FieldType::Integer)
        .with(&[Constraint::Exists(Entity::User)]),
    FieldRule::required("specialization", FieldType::String)
        .with(&[Constraint::MaxLength(255)]),
];

pub const UPDATE_RULES: &[FieldRule] = CREATE_RULES;

pub fn list(store: &dyn Store) -> Result<Vec<Doctor>> {
    Ok(store.list_doctors()?)
}

pub fn get(store: &dyn Store, id: i64) -> Result<Doctor> {
    Ok(store.find_doctor(id)?)
}

pub fn create(store: &dyn Store, body: &Value) -> Result<Doctor> {
    let input = validate(body, CREATE_RULES, store)?;
    let now = now();
    let doctor = store.insert_doctor(NewDoctor {
        user_id: input.integer("user_id"),
        specialization: input.require_text("specialization")?,
        created_at: now,
        updated_at: now,
    })?;
    tracing::info!(doctor_id = doctor.id, "doctor created");
    Ok(doctor)
}

/// Replaces the specialization; `user_id` changes only when supplied.
pub fn update(store: &dyn Store, id: i64, body: &Value) -> Result<Doctor> {
    let input = validate(body, UPDATE_RULES, store)?;
    let doctor = store.update_doctor(
        id,
        DoctorChanges {
            user_id: input.nullable_integer("user_id"),
            specialization: Some(input.require_text("specialization")?),
            updated_at: now(),
        },
    )?;
    tracing::info!(doctor_id = doctor.id, "doctor updated");
    Ok(doctor)
}

pub fn delete(store: &dyn Store, id: i64) -> Result<()> {
    store.delete_doctor(id)?;
    tracing::info!(doctor_id = id, "doctor deleted with its appointments");
    Ok(())
}

/// Patients seen by the doctor, one entry per appointment.
pub fn patients(store: &dyn Store, id: i64) -> Result<Vec<LinkedPatient>> {
    store.find_doctor(id)?;
    Ok(store.doctor_patients(id)?)
}

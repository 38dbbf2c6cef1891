use serde_json::Value;

use super::now;
use crate::error::Result;
use crate::models::{Appointment, AppointmentDetails, Entity, NewAppointment, Relations};
use crate::store::Store;
use crate::validation::{Constraint, FieldRule, FieldType, validate};

pub const CREATE_RULES: &[FieldRule] = &[
    FieldRule::required("doctor_id", FieldType::Integer)
        .with(&[Constraint::Exists(Entity::Doctor)]),
    FieldRule::required("patient_id", FieldType::Integer)
        .with(&[Constraint::Exists(Entity::Patient)]),
    FieldRule::required("date_time", FieldType::DateTime),
    FieldRule::required("reason", FieldType::String),
    FieldRule::optional("notes", FieldType::String),
];

pub fn list(store: &dyn Store, with: Relations) -> Result<Vec<AppointmentDetails>> {
    Ok(store.list_appointments(with)?)
}

pub fn get(store: &dyn Store, id: i64, with: Relations) -> Result<AppointmentDetails> {
    Ok(store.find_appointment(id, with)?)
}

/// Books an appointment. Overlapping times for the same doctor or patient are allowed.
pub fn create(store: &dyn Store, body: &Value) -> Result<Appointment> {
    let input = validate(body, CREATE_RULES, store)?;
    let now = now();
    let appointment = store.insert_appointment(NewAppointment {
        doctor_id: input.require_integer("doctor_id")?,
        patient_id: input.require_integer("patient_id")?,
        date_time: input.require_date_time("date_time")?,
        reason: input.require_text("reason")?,
        notes: input.text("notes"),
        created_at: now,
        updated_at: now,
    })?;
    tracing::info!(
        appointment_id = appointment.id,
        doctor_id = appointment.doctor_id,
        patient_id = appointment.patient_id,
        "appointment created"
    );
    Ok(appointment)
}

pub fn delete(store: &dyn Store, id: i64) -> Result<()> {
    store.delete_appointment(id)?;
    tracing::info!(appointment_id = id, "appointment deleted");
    Ok(())
}

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{appointments, doctors, patients, users};

/// The persisted entity kinds, used for existence checks and not-found reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    User,
    Doctor,
    Patient,
    Appointment,
}

impl Entity {
    pub fn name(self) -> &'static str {
        match self {
            Entity::User => "User",
            Entity::Doctor => "Doctor",
            Entity::Patient => "Patient",
            Entity::Appointment => "Appointment",
        }
    }
}

// Every timestamp (appointment times and row stamps) is exchanged as
// "YYYY-MM-DD HH:MM:SS".
pub mod date_time_format {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(with = "date_time_format")]
    pub created_at: NaiveDateTime,
    #[serde(with = "date_time_format")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = doctors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Doctor {
    pub id: i64,
    pub user_id: Option<i64>,
    pub specialization: String,
    #[serde(with = "date_time_format")]
    pub created_at: NaiveDateTime,
    #[serde(with = "date_time_format")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = doctors)]
pub struct NewDoctor {
    pub user_id: Option<i64>,
    pub specialization: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields an update may touch. `None` leaves a column unchanged, `Some(None)` clears it.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = doctors)]
pub struct DoctorChanges {
    pub user_id: Option<Option<i64>>,
    pub specialization: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = patients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Patient {
    pub id: i64,
    pub user_id: Option<i64>,
    pub birth_date: NaiveDate,
    pub medical_history: Option<String>,
    #[serde(with = "date_time_format")]
    pub created_at: NaiveDateTime,
    #[serde(with = "date_time_format")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = patients)]
pub struct NewPatient {
    pub user_id: Option<i64>,
    pub birth_date: NaiveDate,
    pub medical_history: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = patients)]
pub struct PatientChanges {
    pub user_id: Option<Option<i64>>,
    pub birth_date: Option<NaiveDate>,
    pub medical_history: Option<Option<String>>,
    pub updated_at: NaiveDateTime,
}

/// A scheduled visit. It is both an entity of its own and the join row
/// linking one doctor to one patient.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    #[serde(with = "date_time_format")]
    pub date_time: NaiveDateTime,
    pub reason: String,
    pub notes: Option<String>,
    #[serde(with = "date_time_format")]
    pub created_at: NaiveDateTime,
    #[serde(with = "date_time_format")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = appointments)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub date_time: NaiveDateTime,
    pub reason: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Which associations to fetch alongside an appointment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relations {
    pub doctor: bool,
    pub patient: bool,
}

impl Relations {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            doctor: true,
            patient: true,
        }
    }
}

/// Parses a comma-separated relation list such as `doctor,patient`.
/// An empty list loads nothing.
impl FromStr for Relations {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut with = Relations::none();
        for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match name {
                "doctor" => with.doctor = true,
                "patient" => with.patient = true,
                other => return Err(format!("Unknown relation '{other}'")),
            }
        }
        Ok(with)
    }
}

/// An appointment with whichever associations were requested embedded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<Doctor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<Patient>,
}

/// The relationship attributes carried by an appointment row when it is
/// read as the link between a doctor and a patient.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Pivot {
    pub doctor_id: i64,
    pub patient_id: i64,
    #[serde(with = "date_time_format")]
    pub date_time: NaiveDateTime,
    pub reason: String,
    pub notes: Option<String>,
    #[serde(with = "date_time_format")]
    pub created_at: NaiveDateTime,
    #[serde(with = "date_time_format")]
    pub updated_at: NaiveDateTime,
}

impl From<&Appointment> for Pivot {
    fn from(appointment: &Appointment) -> Self {
        Self {
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            date_time: appointment.date_time,
            reason: appointment.reason.clone(),
            notes: appointment.notes.clone(),
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedPatient {
    #[serde(flatten)]
    pub patient: Patient,
    pub pivot: Pivot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedDoctor {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub pivot: Pivot,
}

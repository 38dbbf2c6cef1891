use thiserror::Error;

use crate::models::{
    Appointment, AppointmentDetails, Doctor, DoctorChanges, Entity, LinkedDoctor, LinkedPatient,
    NewAppointment, NewDoctor, NewPatient, NewUser, Patient, PatientChanges, Relations, User,
};

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::{DbPool, PgStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{} not found", .0.name())]
    NotFound(Entity),

    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("unique violation: {0}")]
    UniqueViolation(String),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("query failed: {0}")]
    Query(diesel::result::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::ForeignKeyViolation(info.message().to_string())
            }
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::UniqueViolation(info.message().to_string())
            }
            other => StoreError::Query(other),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Answers whether a row with the given id is present.
pub trait ReferenceLookup {
    fn exists(&self, entity: Entity, id: i64) -> StoreResult<bool>;
}

/// Persistence for the scheduling tables.
///
/// Every method is a single blocking statement (or read) against the backing
/// store. Lookups by id return `StoreError::NotFound` on a miss. Deleting a
/// doctor or patient removes their appointments.
pub trait Store: ReferenceLookup + Send + Sync {
    fn list_users(&self) -> StoreResult<Vec<User>>;
    fn find_user(&self, id: i64) -> StoreResult<User>;
    fn insert_user(&self, new_user: NewUser) -> StoreResult<User>;

    fn list_doctors(&self) -> StoreResult<Vec<Doctor>>;
    fn find_doctor(&self, id: i64) -> StoreResult<Doctor>;
    fn insert_doctor(&self, new_doctor: NewDoctor) -> StoreResult<Doctor>;
    fn update_doctor(&self, id: i64, changes: DoctorChanges) -> StoreResult<Doctor>;
    fn delete_doctor(&self, id: i64) -> StoreResult<()>;
    fn doctor_patients(&self, doctor_id: i64) -> StoreResult<Vec<LinkedPatient>>;

    fn list_patients(&self) -> StoreResult<Vec<Patient>>;
    fn find_patient(&self, id: i64) -> StoreResult<Patient>;
    fn insert_patient(&self, new_patient: NewPatient) -> StoreResult<Patient>;
    fn update_patient(&self, id: i64, changes: PatientChanges) -> StoreResult<Patient>;
    fn delete_patient(&self, id: i64) -> StoreResult<()>;
    fn patient_doctors(&self, patient_id: i64) -> StoreResult<Vec<LinkedDoctor>>;

    fn list_appointments(&self, with: Relations) -> StoreResult<Vec<AppointmentDetails>>;
    fn find_appointment(&self, id: i64, with: Relations) -> StoreResult<AppointmentDetails>;
    fn insert_appointment(&self, new_appointment: NewAppointment) -> StoreResult<Appointment>;
    fn delete_appointment(&self, id: i64) -> StoreResult<()>;
}

use diesel::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};

use super::{ReferenceLookup, Store, StoreError, StoreResult};
use crate::models::{
    Appointment, AppointmentDetails, Doctor, DoctorChanges, Entity, LinkedDoctor, LinkedPatient,
    NewAppointment, NewDoctor, NewPatient, NewUser, Patient, PatientChanges, Pivot, Relations,
    User,
};
use crate::schema::{appointments, doctors, patients, users};

// Database connection pool type
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub fn build_pool(database_url: &str, max_size: u32) -> Result<DbPool, r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    r2d2::Pool::builder().max_size(max_size).build(manager)
}

/// PostgreSQL-backed store. Foreign keys and cascades are enforced by the schema.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> StoreResult<PooledConnection<ConnectionManager<PgConnection>>> {
        Ok(self.pool.get()?)
    }
}

fn found<T>(row: Option<T>, entity: Entity) -> StoreResult<T> {
    row.ok_or(StoreError::NotFound(entity))
}

fn deleted(affected: usize, entity: Entity) -> StoreResult<()> {
    if affected == 0 {
        return Err(StoreError::NotFound(entity));
    }
    Ok(())
}

fn details(
    appointment: Appointment,
    doctor: Option<Doctor>,
    patient: Option<Patient>,
) -> AppointmentDetails {
    AppointmentDetails {
        appointment,
        doctor,
        patient,
    }
}

impl ReferenceLookup for PgStore {
    fn exists(&self, entity: Entity, id: i64) -> StoreResult<bool> {
        use diesel::dsl::exists;

        let mut conn = self.conn()?;
        let present: bool = match entity {
            Entity::User => diesel::select(exists(users::table.find(id))).get_result(&mut conn)?,
            Entity::Doctor => {
                diesel::select(exists(doctors::table.find(id))).get_result(&mut conn)?
            }
            Entity::Patient => {
                diesel::select(exists(patients::table.find(id))).get_result(&mut conn)?
            }
            Entity::Appointment => {
                diesel::select(exists(appointments::table.find(id))).get_result(&mut conn)?
            }
        };
        Ok(present)
    }
}

impl Store for PgStore {
    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut conn = self.conn()?;
        Ok(users::table
            .order(users::id.asc())
            .select(User::as_select())
            .load(&mut conn)?)
    }

    fn find_user(&self, id: i64) -> StoreResult<User> {
        let mut conn = self.conn()?;
        let user = users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        found(user, Entity::User)
    }

    fn insert_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)?)
    }

    fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        let mut conn = self.conn()?;
        Ok(doctors::table
            .order(doctors::id.asc())
            .select(Doctor::as_select())
            .load(&mut conn)?)
    }

    fn find_doctor(&self, id: i64) -> StoreResult<Doctor> {
        let mut conn = self.conn()?;
        let doctor = doctors::table
            .find(id)
            .select(Doctor::as_select())
            .first(&mut conn)
            .optional()?;
        found(doctor, Entity::Doctor)
    }

    fn insert_doctor(&self, new_doctor: NewDoctor) -> StoreResult<Doctor> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(doctors::table)
            .values(&new_doctor)
            .returning(Doctor::as_returning())
            .get_result(&mut conn)?)
    }

    fn update_doctor(&self, id: i64, changes: DoctorChanges) -> StoreResult<Doctor> {
        let mut conn = self.conn()?;
        let doctor = diesel::update(doctors::table.find(id))
            .set(&changes)
            .returning(Doctor::as_returning())
            .get_result(&mut conn)
            .optional()?;
        found(doctor, Entity::Doctor)
    }

    fn delete_doctor(&self, id: i64) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let affected = diesel::delete(doctors::table.find(id)).execute(&mut conn)?;
        deleted(affected, Entity::Doctor)
    }

    fn doctor_patients(&self, doctor_id: i64) -> StoreResult<Vec<LinkedPatient>> {
        let mut conn = self.conn()?;
        let rows = appointments::table
            .inner_join(patients::table)
            .filter(appointments::doctor_id.eq(doctor_id))
            .order(appointments::id.asc())
            .select((Patient::as_select(), Pivot::as_select()))
            .load::<(Patient, Pivot)>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(patient, pivot)| LinkedPatient { patient, pivot })
            .collect())
    }

    fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        let mut conn = self.conn()?;
        Ok(patients::table
            .order(patients::id.asc())
            .select(Patient::as_select())
            .load(&mut conn)?)
    }

    fn find_patient(&self, id: i64) -> StoreResult<Patient> {
        let mut conn = self.conn()?;
        let patient = patients::table
            .find(id)
            .select(Patient::as_select())
            .first(&mut conn)
            .optional()?;
        found(patient, Entity::Patient)
    }

    fn insert_patient(&self, new_patient: NewPatient) -> StoreResult<Patient> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(patients::table)
            .values(&new_patient)
            .returning(Patient::as_returning())
            .get_result(&mut conn)?)
    }

    fn update_patient(&self, id: i64, changes: PatientChanges) -> StoreResult<Patient> {
        let mut conn = self.conn()?;
        let patient = diesel::update(patients::table.find(id))
            .set(&changes)
            .returning(Patient::as_returning())
            .get_result(&mut conn)
            .optional()?;
        found(patient, Entity::Patient)
    }

    fn delete_patient(&self, id: i64) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let affected = diesel::delete(patients::table.find(id)).execute(&mut conn)?;
        deleted(affected, Entity::Patient)
    }

    fn patient_doctors(&self, patient_id: i64) -> StoreResult<Vec<LinkedDoctor>> {
        let mut conn = self.conn()?;
        let rows = appointments::table
            .inner_join(doctors::table)
            .filter(appointments::patient_id.eq(patient_id))
            .order(appointments::id.asc())
            .select((Doctor::as_select(), Pivot::as_select()))
            .load::<(Doctor, Pivot)>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(doctor, pivot)| LinkedDoctor { doctor, pivot })
            .collect())
    }

    fn list_appointments(&self, with: Relations) -> StoreResult<Vec<AppointmentDetails>> {
        let mut conn = self.conn()?;
        let rows = match (with.doctor, with.patient) {
            (true, true) => appointments::table
                .inner_join(doctors::table)
                .inner_join(patients::table)
                .order(appointments::id.asc())
                .select((
                    Appointment::as_select(),
                    Doctor::as_select(),
                    Patient::as_select(),
                ))
                .load::<(Appointment, Doctor, Patient)>(&mut conn)?
                .into_iter()
                .map(|(a, d, p)| details(a, Some(d), Some(p)))
                .collect(),
            (true, false) => appointments::table
                .inner_join(doctors::table)
                .order(appointments::id.asc())
                .select((Appointment::as_select(), Doctor::as_select()))
                .load::<(Appointment, Doctor)>(&mut conn)?
                .into_iter()
                .map(|(a, d)| details(a, Some(d), None))
                .collect(),
            (false, true) => appointments::table
                .inner_join(patients::table)
                .order(appointments::id.asc())
                .select((Appointment::as_select(), Patient::as_select()))
                .load::<(Appointment, Patient)>(&mut conn)?
                .into_iter()
                .map(|(a, p)| details(a, None, Some(p)))
                .collect(),
            (false, false) => appointments::table
                .order(appointments::id.asc())
                .select(Appointment::as_select())
                .load::<Appointment>(&mut conn)?
                .into_iter()
                .map(|a| details(a, None, None))
                .collect(),
        };
        Ok(rows)
    }

    fn find_appointment(&self, id: i64, with: Relations) -> StoreResult<AppointmentDetails> {
        let mut conn = self.conn()?;
        let row = match (with.doctor, with.patient) {
            (true, true) => appointments::table
                .inner_join(doctors::table)
                .inner_join(patients::table)
                .filter(appointments::id.eq(id))
                .select((
                    Appointment::as_select(),
                    Doctor::as_select(),
                    Patient::as_select(),
                ))
                .first::<(Appointment, Doctor, Patient)>(&mut conn)
                .optional()?
                .map(|(a, d, p)| details(a, Some(d), Some(p))),
            (true, false) => appointments::table
                .inner_join(doctors::table)
                .filter(appointments::id.eq(id))
                .select((Appointment::as_select(), Doctor::as_select()))
                .first::<(Appointment, Doctor)>(&mut conn)
                .optional()?
                .map(|(a, d)| details(a, Some(d), None)),
            (false, true) => appointments::table
                .inner_join(patients::table)
                .filter(appointments::id.eq(id))
                .select((Appointment::as_select(), Patient::as_select()))
                .first::<(Appointment, Patient)>(&mut conn)
                .optional()?
                .map(|(a, p)| details(a, None, Some(p))),
            (false, false) => appointments::table
                .find(id)
                .select(Appointment::as_select())
                .first::<Appointment>(&mut conn)
                .optional()?
                .map(|a| details(a, None, None)),
        };
        found(row, Entity::Appointment)
    }

    fn insert_appointment(&self, new_appointment: NewAppointment) -> StoreResult<Appointment> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(appointments::table)
            .values(&new_appointment)
            .returning(Appointment::as_returning())
            .get_result(&mut conn)?)
    }

    fn delete_appointment(&self, id: i64) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let affected = diesel::delete(appointments::table.find(id)).execute(&mut conn)?;
        deleted(affected, Entity::Appointment)
    }
}

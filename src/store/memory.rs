use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{ReferenceLookup, Store, StoreError, StoreResult};
use crate::models::{
    Appointment, AppointmentDetails, Doctor, DoctorChanges, Entity, LinkedDoctor, LinkedPatient,
    NewAppointment, NewDoctor, NewPatient, NewUser, Patient, PatientChanges, Pivot, Relations,
    User,
};

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Clone> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn get(&self, id: i64, entity: Entity) -> StoreResult<T> {
        self.rows
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(entity))
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<User>,
    doctors: Table<Doctor>,
    patients: Table<Patient>,
    appointments: Table<Appointment>,
}

impl Tables {
    fn check_user(&self, user_id: Option<i64>) -> StoreResult<()> {
        match user_id {
            Some(id) if !self.users.rows.contains_key(&id) => Err(StoreError::ForeignKeyViolation(
                format!("users.id = {id} is not present"),
            )),
            _ => Ok(()),
        }
    }

    fn details(&self, appointment: &Appointment, with: Relations) -> AppointmentDetails {
        AppointmentDetails {
            appointment: appointment.clone(),
            doctor: with
                .doctor
                .then(|| self.doctors.rows.get(&appointment.doctor_id).cloned())
                .flatten(),
            patient: with
                .patient
                .then(|| self.patients.rows.get(&appointment.patient_id).cloned())
                .flatten(),
        }
    }
}

/// In-process store with the same foreign-key and cascade behaviour as the
/// PostgreSQL schema. Ids are assigned sequentially per table, starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Rows are only mutated after every check passes, so a poisoned lock
        // still guards consistent tables.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReferenceLookup for MemoryStore {
    fn exists(&self, entity: Entity, id: i64) -> StoreResult<bool> {
        let tables = self.tables();
        Ok(match entity {
            Entity::User => tables.users.rows.contains_key(&id),
            Entity::Doctor => tables.doctors.rows.contains_key(&id),
            Entity::Patient => tables.patients.rows.contains_key(&id),
            Entity::Appointment => tables.appointments.rows.contains_key(&id),
        })
    }
}

impl Store for MemoryStore {
    fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables().users.all())
    }

    fn find_user(&self, id: i64) -> StoreResult<User> {
        self.tables().users.get(id, Entity::User)
    }

    fn insert_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables();
        if tables.users.rows.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::UniqueViolation(format!(
                "users.email = {} already exists",
                new_user.email
            )));
        }
        let user = User {
            id: tables.users.next_id(),
            name: new_user.name,
            email: new_user.email,
            created_at: new_user.created_at,
            updated_at: new_user.updated_at,
        };
        tables.users.rows.insert(user.id, user.clone());
        Ok(user)
    }

    fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        Ok(self.tables().doctors.all())
    }

    fn find_doctor(&self, id: i64) -> StoreResult<Doctor> {
        self.tables().doctors.get(id, Entity::Doctor)
    }

    fn insert_doctor(&self, new_doctor: NewDoctor) -> StoreResult<Doctor> {
        let mut tables = self.tables();
        tables.check_user(new_doctor.user_id)?;
        let doctor = Doctor {
            id: tables.doctors.next_id(),
            user_id: new_doctor.user_id,
            specialization: new_doctor.specialization,
            created_at: new_doctor.created_at,
            updated_at: new_doctor.updated_at,
        };
        tables.doctors.rows.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    fn update_doctor(&self, id: i64, changes: DoctorChanges) -> StoreResult<Doctor> {
        let mut tables = self.tables();
        if let Some(user_id) = changes.user_id {
            tables.check_user(user_id)?;
        }
        let doctor = tables
            .doctors
            .rows
            .get_mut(&id)
            .ok_or(StoreError::NotFound(Entity::Doctor))?;
        if let Some(user_id) = changes.user_id {
            doctor.user_id = user_id;
        }
        if let Some(specialization) = changes.specialization {
            doctor.specialization = specialization;
        }
        doctor.updated_at = changes.updated_at;
        Ok(doctor.clone())
    }

    fn delete_doctor(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables();
        tables
            .doctors
            .rows
            .remove(&id)
            .ok_or(StoreError::NotFound(Entity::Doctor))?;
        tables.appointments.rows.retain(|_, a| a.doctor_id != id);
        Ok(())
    }

    fn doctor_patients(&self, doctor_id: i64) -> StoreResult<Vec<LinkedPatient>> {
        let tables = self.tables();
        Ok(tables
            .appointments
            .rows
            .values()
            .filter(|a| a.doctor_id == doctor_id)
            .filter_map(|a| {
                let patient = tables.patients.rows.get(&a.patient_id)?.clone();
                Some(LinkedPatient {
                    patient,
                    pivot: Pivot::from(a),
                })
            })
            .collect())
    }

    fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        Ok(self.tables().patients.all())
    }

    fn find_patient(&self, id: i64) -> StoreResult<Patient> {
        self.tables().patients.get(id, Entity::Patient)
    }

    fn insert_patient(&self, new_patient: NewPatient) -> StoreResult<Patient> {
        let mut tables = self.tables();
        tables.check_user(new_patient.user_id)?;
        let patient = Patient {
            id: tables.patients.next_id(),
            user_id: new_patient.user_id,
            birth_date: new_patient.birth_date,
            medical_history: new_patient.medical_history,
            created_at: new_patient.created_at,
            updated_at: new_patient.updated_at,
        };
        tables.patients.rows.insert(patient.id, patient.clone());
        Ok(patient)
    }

    fn update_patient(&self, id: i64, changes: PatientChanges) -> StoreResult<Patient> {
        let mut tables = self.tables();
        if let Some(user_id) = changes.user_id {
            tables.check_user(user_id)?;
        }
        let patient = tables
            .patients
            .rows
            .get_mut(&id)
            .ok_or(StoreError::NotFound(Entity::Patient))?;
        if let Some(user_id) = changes.user_id {
            patient.user_id = user_id;
        }
        if let Some(birth_date) = changes.birth_date {
            patient.birth_date = birth_date;
        }
        if let Some(medical_history) = changes.medical_history {
            patient.medical_history = medical_history;
        }
        patient.updated_at = changes.updated_at;
        Ok(patient.clone())
    }

    fn delete_patient(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables();
        tables
            .patients
            .rows
            .remove(&id)
            .ok_or(StoreError::NotFound(Entity::Patient))?;
        tables.appointments.rows.retain(|_, a| a.patient_id != id);
        Ok(())
    }

    fn patient_doctors(&self, patient_id: i64) -> StoreResult<Vec<LinkedDoctor>> {
        let tables = self.tables();
        Ok(tables
            .appointments
            .rows
            .values()
            .filter(|a| a.patient_id == patient_id)
            .filter_map(|a| {
                let doctor = tables.doctors.rows.get(&a.doctor_id)?.clone();
                Some(LinkedDoctor {
                    doctor,
                    pivot: Pivot::from(a),
                })
            })
            .collect())
    }

    fn list_appointments(&self, with: Relations) -> StoreResult<Vec<AppointmentDetails>> {
        let tables = self.tables();
        Ok(tables
            .appointments
            .rows
            .values()
            .map(|a| tables.details(a, with))
            .collect())
    }

    fn find_appointment(&self, id: i64, with: Relations) -> StoreResult<AppointmentDetails> {
        let tables = self.tables();
        let appointment = tables
            .appointments
            .rows
            .get(&id)
            .ok_or(StoreError::NotFound(Entity::Appointment))?;
        Ok(tables.details(appointment, with))
    }

    fn insert_appointment(&self, new_appointment: NewAppointment) -> StoreResult<Appointment> {
        let mut tables = self.tables();
        if !tables.doctors.rows.contains_key(&new_appointment.doctor_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "doctors.id = {} is not present",
                new_appointment.doctor_id
            )));
        }
        if !tables.patients.rows.contains_key(&new_appointment.patient_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "patients.id = {} is not present",
                new_appointment.patient_id
            )));
        }
        let appointment = Appointment {
            id: tables.appointments.next_id(),
            doctor_id: new_appointment.doctor_id,
            patient_id: new_appointment.patient_id,
            date_time: new_appointment.date_time,
            reason: new_appointment.reason,
            notes: new_appointment.notes,
            created_at: new_appointment.created_at,
            updated_at: new_appointment.updated_at,
        };
        tables
            .appointments
            .rows
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    fn delete_appointment(&self, id: i64) -> StoreResult<()> {
        self.tables()
            .appointments
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(Entity::Appointment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn seed_doctor(store: &MemoryStore, specialization: &str) -> Doctor {
        let now = at("2024-11-16 09:00:00");
        store
            .insert_doctor(NewDoctor {
                user_id: None,
                specialization: specialization.to_string(),
                created_at: now,
                updated_at: now,
            })
            .unwrap()
    }

    fn seed_patient(store: &MemoryStore) -> Patient {
        let now = at("2024-11-16 09:00:00");
        store
            .insert_patient(NewPatient {
                user_id: None,
                birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                medical_history: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap()
    }

    fn book(
        store: &MemoryStore,
        doctor_id: i64,
        patient_id: i64,
        when: &str,
    ) -> StoreResult<Appointment> {
        let now = at("2024-11-16 09:00:00");
        store.insert_appointment(NewAppointment {
            doctor_id,
            patient_id,
            date_time: at(when),
            reason: "Consulta general".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    #[test]
    fn ids_are_sequential_per_table() {
        let store = MemoryStore::new();
        assert_eq!(seed_doctor(&store, "Cardiología").id, 1);
        assert_eq!(seed_doctor(&store, "Neurología").id, 2);
        assert_eq!(seed_patient(&store).id, 1);
    }

    #[test]
    fn insert_appointment_rejects_missing_doctor() {
        let store = MemoryStore::new();
        let patient = seed_patient(&store);

        let result = book(&store, 42, patient.id, "2024-12-01 10:00:00");

        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
        assert!(store.list_appointments(Relations::none()).unwrap().is_empty());
    }

    #[test]
    fn deleting_doctor_cascades_to_appointments() {
        let store = MemoryStore::new();
        let doctor = seed_doctor(&store, "Cardiología");
        let other = seed_doctor(&store, "Pediatría");
        let patient = seed_patient(&store);
        book(&store, doctor.id, patient.id, "2024-12-01 10:00:00").unwrap();
        book(&store, doctor.id, patient.id, "2024-12-08 10:00:00").unwrap();
        let kept = book(&store, other.id, patient.id, "2024-12-02 10:00:00").unwrap();

        store.delete_doctor(doctor.id).unwrap();

        let remaining = store.list_appointments(Relations::none()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].appointment.id, kept.id);
    }

    #[test]
    fn deleting_patient_cascades_to_appointments() {
        let store = MemoryStore::new();
        let doctor = seed_doctor(&store, "Cardiología");
        let patient = seed_patient(&store);
        let appointment = book(&store, doctor.id, patient.id, "2024-12-01 10:00:00").unwrap();

        store.delete_patient(patient.id).unwrap();

        assert!(matches!(
            store.find_appointment(appointment.id, Relations::all()),
            Err(StoreError::NotFound(Entity::Appointment))
        ));
    }

    #[test]
    fn relations_are_only_attached_when_requested() {
        let store = MemoryStore::new();
        let doctor = seed_doctor(&store, "Cardiología");
        let patient = seed_patient(&store);
        let appointment = book(&store, doctor.id, patient.id, "2024-12-01 10:00:00").unwrap();

        let bare = store.find_appointment(appointment.id, Relations::none()).unwrap();
        assert!(bare.doctor.is_none() && bare.patient.is_none());

        let full = store.find_appointment(appointment.id, Relations::all()).unwrap();
        assert_eq!(full.doctor, Some(doctor));
        assert_eq!(full.patient, Some(patient));
    }

    #[test]
    fn pivot_lists_one_entry_per_appointment() {
        let store = MemoryStore::new();
        let doctor = seed_doctor(&store, "Cardiología");
        let patient = seed_patient(&store);
        book(&store, doctor.id, patient.id, "2024-12-01 10:00:00").unwrap();
        book(&store, doctor.id, patient.id, "2024-12-15 10:00:00").unwrap();

        let linked = store.doctor_patients(doctor.id).unwrap();
        assert_eq!(linked.len(), 2);
        assert!(linked.iter().all(|l| l.patient.id == patient.id));
        assert_eq!(linked[1].pivot.date_time, at("2024-12-15 10:00:00"));

        let doctors = store.patient_doctors(patient.id).unwrap();
        assert_eq!(doctors.len(), 2);
    }

    #[test]
    fn duplicate_email_is_a_unique_violation() {
        let store = MemoryStore::new();
        let now = at("2024-11-16 09:00:00");
        let new_user = || NewUser {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            created_at: now,
            updated_at: now,
        };
        store.insert_user(new_user()).unwrap();

        assert!(matches!(
            store.insert_user(new_user()),
            Err(StoreError::UniqueViolation(_))
        ));
    }
}

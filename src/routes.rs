use actix_web::web;

use crate::error::AppError;
use crate::handlers;

/// JSON extractor settings: malformed bodies become a 400 with a JSON message.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(handlers::list_users))
            .route("", web::post().to(handlers::create_user))
            .route("/{user_id}", web::get().to(handlers::get_user)),
    )
    .service(
        web::scope("/doctors")
            .route("", web::get().to(handlers::list_doctors))
            .route("", web::post().to(handlers::create_doctor))
            .route("/{doctor_id}", web::get().to(handlers::get_doctor))
            .route("/{doctor_id}", web::put().to(handlers::update_doctor))
            .route("/{doctor_id}", web::patch().to(handlers::update_doctor))
            .route("/{doctor_id}", web::delete().to(handlers::delete_doctor))
            .route("/{doctor_id}/patients", web::get().to(handlers::get_doctor_patients)),
    )
    .service(
        web::scope("/patients")
            .route("", web::get().to(handlers::list_patients))
            .route("", web::post().to(handlers::create_patient))
            .route("/{patient_id}", web::get().to(handlers::get_patient))
            .route("/{patient_id}", web::put().to(handlers::update_patient))
            .route("/{patient_id}", web::patch().to(handlers::update_patient))
            .route("/{patient_id}", web::delete().to(handlers::delete_patient))
            .route("/{patient_id}/doctors", web::get().to(handlers::get_patient_doctors)),
    )
    .service(
        web::scope("/appointments")
            .route("", web::get().to(handlers::list_appointments))
            .route("", web::post().to(handlers::create_appointment))
            .route("/{appointment_id}", web::get().to(handlers::get_appointment))
            .route("/{appointment_id}", web::delete().to(handlers::delete_appointment)),
    );
}

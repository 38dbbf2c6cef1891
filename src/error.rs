use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::json;
use thiserror::Error;

use crate::models::Entity;
use crate::store::StoreError;

/// Per-field validation messages in the order the rules were checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message.into()),
            None => self.fields.push((field.to_string(), vec![message.into()])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// The first message reported for `field`.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, messages)| messages.first())
            .map(String::as_str)
    }

    /// The first message reported, used as the response summary.
    pub fn first_message(&self) -> Option<&str> {
        self.fields
            .first()
            .and_then(|(_, messages)| messages.first())
            .map(String::as_str)
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{} not found", .0.name())]
    NotFound(Entity),

    #[error("{}", .0.first_message().unwrap_or("The given data was invalid."))]
    Validation(ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{}", .0.first_message().unwrap_or("The resource already exists."))]
    Conflict(ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => AppError::NotFound(entity),
            StoreError::UniqueViolation(detail) => {
                tracing::debug!(%detail, "unique constraint rejected write");
                AppError::Conflict(ValidationErrors::default())
            }
            other => AppError::Storage(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(serde::Serialize)]
struct FieldErrorBody<'a> {
    message: String,
    errors: &'a ValidationErrors,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::Validation(errors) | AppError::Conflict(errors) => {
                HttpResponse::build(status).json(FieldErrorBody {
                    message: self.to_string(),
                    errors,
                })
            }
            AppError::Storage(_) | AppError::Blocking(_) => {
                tracing::error!(error = %self, "request failed");
                HttpResponse::build(status).json(json!({ "message": "Server Error" }))
            }
            _ => HttpResponse::build(status).json(json!({ "message": self.to_string() })),
        }
    }
}

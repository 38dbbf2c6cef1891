use serde_json::Value;

use super::now;
use crate::error::{AppError, Result, ValidationErrors};
use crate::models::{NewUser, User};
use crate::store::{Store, StoreError};
use crate::validation::{Constraint, FieldRule, FieldType, validate};

pub const CREATE_RULES: &[FieldRule] = &[
    FieldRule::required("name", FieldType::String).with(&[Constraint::MaxLength(255)]),
    FieldRule::required("email", FieldType::Email).with(&[Constraint::MaxLength(255)]),
];

pub fn list(store: &dyn Store) -> Result<Vec<User>> {
    Ok(store.list_users()?)
}

pub fn get(store: &dyn Store, id: i64) -> Result<User> {
    Ok(store.find_user(id)?)
}

pub fn create(store: &dyn Store, body: &Value) -> Result<User> {
    let input = validate(body, CREATE_RULES, store)?;
    let now = now();
    let user = store
        .insert_user(NewUser {
            name: input.require_text("name")?,
            email: input.require_text("email")?,
            created_at: now,
            updated_at: now,
        })
        .map_err(|err| match err {
            StoreError::UniqueViolation(detail) => {
                tracing::debug!(%detail, "duplicate user email");
                AppError::Conflict(ValidationErrors::single(
                    "email",
                    "The email has already been taken.",
                ))
            }
            other => other.into(),
        })?;
    tracing::info!(user_id = user.id, "user created");
    Ok(user)
}

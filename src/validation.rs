//! Declarative request validation.
//!
//! Each operation owns a `&'static [FieldRule]` table naming the fields it
//! accepts. `validate` checks a JSON body against that table and returns only
//! the listed fields, converted to typed values. Anything else in the body is
//! dropped.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};

use crate::error::{AppError, ValidationErrors};
use crate::models::Entity;
use crate::store::ReferenceLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Date,
    DateTime,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Maximum length in characters.
    MaxLength(usize),
    /// The integer must be the id of an existing row.
    Exists(Entity),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    /// The field must be present.
    pub required: bool,
    /// An explicit `null` (or blank string) is accepted and kept as null.
    pub nullable: bool,
    pub kind: FieldType,
    pub constraints: &'static [Constraint],
}

impl FieldRule {
    pub const fn required(field: &'static str, kind: FieldType) -> Self {
        Self {
            field,
            required: true,
            nullable: false,
            kind,
            constraints: &[],
        }
    }

    pub const fn optional(field: &'static str, kind: FieldType) -> Self {
        Self {
            field,
            required: false,
            nullable: true,
            kind,
            constraints: &[],
        }
    }

    /// May be omitted, but when present must carry a value.
    pub const fn sometimes(field: &'static str, kind: FieldType) -> Self {
        Self {
            field,
            required: false,
            nullable: false,
            kind,
            constraints: &[],
        }
    }

    pub const fn with(mut self, constraints: &'static [Constraint]) -> Self {
        self.constraints = constraints;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// The allow-listed, typed fields of a request that passed validation.
/// Fields absent from the request are absent here; an explicit `null` is kept
/// as `FieldValue::Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedInput {
    values: HashMap<&'static str, FieldValue>,
}

fn missing(field: &str) -> AppError {
    AppError::Validation(ValidationErrors::single(
        field,
        format!("The {} field is required.", display_name(field)),
    ))
}

impl ValidatedInput {
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        match self.values.get(field) {
            Some(FieldValue::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn require_text(&self, field: &str) -> Result<String, AppError> {
        self.text(field).ok_or_else(|| missing(field))
    }

    /// `None` when absent, `Some(None)` when explicitly null.
    pub fn nullable_text(&self, field: &str) -> Option<Option<String>> {
        match self.values.get(field)? {
            FieldValue::Text(s) => Some(Some(s.clone())),
            _ => Some(None),
        }
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        match self.values.get(field) {
            Some(FieldValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn require_integer(&self, field: &str) -> Result<i64, AppError> {
        self.integer(field).ok_or_else(|| missing(field))
    }

    pub fn nullable_integer(&self, field: &str) -> Option<Option<i64>> {
        match self.values.get(field)? {
            FieldValue::Integer(n) => Some(Some(*n)),
            _ => Some(None),
        }
    }

    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        match self.values.get(field) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn require_date(&self, field: &str) -> Result<NaiveDate, AppError> {
        self.date(field).ok_or_else(|| missing(field))
    }

    pub fn require_date_time(&self, field: &str) -> Result<NaiveDateTime, AppError> {
        match self.values.get(field) {
            Some(FieldValue::DateTime(dt)) => Ok(*dt),
            _ => Err(missing(field)),
        }
    }
}

fn display_name(field: &str) -> String {
    field.replace('_', " ")
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses the timestamp forms clients send: `2024-12-01 10:00:00`, the
/// `T`-separated form, RFC 3339 (normalised to UTC) or a bare date at midnight.
pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parses a calendar date. Timestamps keep the date as written in their own
/// offset, so `1990-01-01T01:00:00+05:00` is 1990-01-01.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

fn is_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !raw.chars().any(char::is_whitespace)
        && !domain.contains('@')
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Converts a raw JSON value to the rule's type, or returns the message to report.
fn coerce(rule: &FieldRule, value: &Value) -> Result<FieldValue, String> {
    let name = display_name(rule.field);
    match rule.kind {
        FieldType::String => match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            _ => Err(format!("The {name} field must be a string.")),
        },
        FieldType::Email => match value {
            Value::String(s) if is_email(s) => Ok(FieldValue::Text(s.trim().to_string())),
            _ => Err(format!("The {name} field must be a valid email address.")),
        },
        FieldType::Integer => {
            let parsed = match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed
                .map(FieldValue::Integer)
                .ok_or_else(|| format!("The {name} field must be an integer."))
        }
        FieldType::Date => value
            .as_str()
            .and_then(parse_date)
            .map(FieldValue::Date)
            .ok_or_else(|| format!("The {name} field must be a valid date.")),
        FieldType::DateTime => value
            .as_str()
            .and_then(parse_date_time)
            .map(FieldValue::DateTime)
            .ok_or_else(|| format!("The {name} field must be a valid date.")),
    }
}

fn check_constraints<L: ReferenceLookup + ?Sized>(
    rule: &FieldRule,
    value: &FieldValue,
    lookup: &L,
) -> Result<Option<String>, AppError> {
    let name = display_name(rule.field);
    for constraint in rule.constraints {
        match (constraint, value) {
            (Constraint::MaxLength(max), FieldValue::Text(s)) if s.chars().count() > *max => {
                return Ok(Some(format!(
                    "The {name} field must not be greater than {max} characters."
                )));
            }
            (Constraint::Exists(entity), FieldValue::Integer(id)) => {
                if !lookup.exists(*entity, *id)? {
                    return Ok(Some(format!("The selected {name} is invalid.")));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

/// Checks `body` against `rules`. Every field is checked and each failing
/// field reports its first failing rule. A body that is not a JSON object is
/// treated as empty.
pub fn validate<L: ReferenceLookup + ?Sized>(
    body: &Value,
    rules: &[FieldRule],
    lookup: &L,
) -> Result<ValidatedInput, AppError> {
    let empty = Map::new();
    let fields = body.as_object().unwrap_or(&empty);

    let mut input = ValidatedInput::default();
    let mut errors = ValidationErrors::default();

    for rule in rules {
        let raw = fields.get(rule.field);
        let name = display_name(rule.field);

        match raw {
            None if !rule.required => continue,
            Some(value) if is_blank(value) => {
                if rule.nullable {
                    input.values.insert(rule.field, FieldValue::Null);
                } else {
                    errors.add(rule.field, format!("The {name} field is required."));
                }
                continue;
            }
            None => {
                errors.add(rule.field, format!("The {name} field is required."));
                continue;
            }
            Some(_) => {}
        }

        let Some(raw) = raw else { continue };
        let value = match coerce(rule, raw) {
            Ok(value) => value,
            Err(message) => {
                errors.add(rule.field, message);
                continue;
            }
        };
        if let Some(message) = check_constraints(rule, &value, lookup)? {
            errors.add(rule.field, message);
            continue;
        }
        input.values.insert(rule.field, value);
    }

    if errors.is_empty() {
        Ok(input)
    } else {
        Err(AppError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreResult;
    use serde_json::json;

    /// Lookup that knows only doctor 1.
    struct OnlyDoctorOne;

    impl ReferenceLookup for OnlyDoctorOne {
        fn exists(&self, entity: Entity, id: i64) -> StoreResult<bool> {
            Ok(entity == Entity::Doctor && id == 1)
        }
    }

    const RULES: &[FieldRule] = &[
        FieldRule::required("doctor_id", FieldType::Integer)
            .with(&[Constraint::Exists(Entity::Doctor)]),
        FieldRule::required("title", FieldType::String).with(&[Constraint::MaxLength(5)]),
        FieldRule::required("date_time", FieldType::DateTime),
        FieldRule::optional("notes", FieldType::String),
    ];

    fn errors_of(result: Result<ValidatedInput, AppError>) -> ValidationErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_body_and_drops_unlisted_fields() {
        let body = json!({
            "doctor_id": 1,
            "title": "Check",
            "date_time": "2024-12-01 10:00:00",
            "id": 99,
            "created_at": "2020-01-01",
        });

        let input = validate(&body, RULES, &OnlyDoctorOne).unwrap();

        assert_eq!(input.integer("doctor_id"), Some(1));
        assert_eq!(input.text("title").as_deref(), Some("Check"));
        assert!(!input.contains("id"));
        assert!(!input.contains("created_at"));
        assert!(!input.contains("notes"));
    }

    #[test]
    fn reports_every_failing_field() {
        let body = json!({ "doctor_id": 7, "title": "Too long" });

        let errors = errors_of(validate(&body, RULES, &OnlyDoctorOne));

        assert_eq!(errors.first("doctor_id"), Some("The selected doctor id is invalid."));
        assert_eq!(
            errors.first("title"),
            Some("The title field must not be greater than 5 characters.")
        );
        assert_eq!(errors.first("date_time"), Some("The date time field is required."));
        assert!(!errors.contains("notes"));
    }

    #[test]
    fn summary_names_the_first_declared_rule() {
        let errors = errors_of(validate(&json!({}), RULES, &OnlyDoctorOne));

        assert_eq!(errors.first_message(), Some("The doctor id field is required."));
        assert_eq!(
            AppError::Validation(errors).to_string(),
            "The doctor id field is required."
        );
    }

    #[test]
    fn blank_strings_fail_required_and_null_optional() {
        let body = json!({
            "doctor_id": "1",
            "title": "   ",
            "date_time": "2024-12-01T10:00",
            "notes": "",
        });

        let errors = errors_of(validate(&body, RULES, &OnlyDoctorOne));
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("title"));

        let body = json!({
            "doctor_id": "1",
            "title": "Ok",
            "date_time": "2024-12-01T10:00",
            "notes": "",
        });
        let input = validate(&body, RULES, &OnlyDoctorOne).unwrap();
        assert_eq!(input.integer("doctor_id"), Some(1));
        assert_eq!(input.nullable_text("notes"), Some(None));
    }

    #[test]
    fn sometimes_fields_may_be_omitted_but_not_nulled() {
        const UPDATE: &[FieldRule] = &[FieldRule::sometimes("birth_date", FieldType::Date)];

        let input = validate(&json!({}), UPDATE, &OnlyDoctorOne).unwrap();
        assert!(!input.contains("birth_date"));

        let errors = errors_of(validate(&json!({ "birth_date": null }), UPDATE, &OnlyDoctorOne));
        assert_eq!(errors.first("birth_date"), Some("The birth date field is required."));
    }

    #[test]
    fn wrong_types_are_reported() {
        let body = json!({ "doctor_id": "one", "title": 5, "date_time": "tomorrow-ish" });

        let errors = errors_of(validate(&body, RULES, &OnlyDoctorOne));

        assert_eq!(errors.first("doctor_id"), Some("The doctor id field must be an integer."));
        assert_eq!(errors.first("title"), Some("The title field must be a string."));
        assert_eq!(errors.first("date_time"), Some("The date time field must be a valid date."));
    }

    #[test]
    fn non_object_body_is_treated_as_empty() {
        let errors = errors_of(validate(&json!([1, 2]), RULES, &OnlyDoctorOne));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn max_length_counts_characters() {
        let body = json!({ "doctor_id": 1, "title": "ñandú", "date_time": "2024-12-01" });
        assert!(validate(&body, RULES, &OnlyDoctorOne).is_ok());
    }

    #[test]
    fn parses_supported_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(parse_date_time("2024-12-01 10:00:00"), Some(expected));
        assert_eq!(parse_date_time("2024-12-01T10:00:00"), Some(expected));
        assert_eq!(parse_date_time("2024-12-01 10:00"), Some(expected));
        assert_eq!(parse_date_time("2024-12-01T12:00:00+02:00"), Some(expected));
        assert_eq!(
            parse_date_time("2024-12-01"),
            NaiveDate::from_ymd_opt(2024, 12, 1).map(|d| d.and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_date_time("2024-13-01 10:00:00"), None);
    }

    #[test]
    fn dates_keep_the_senders_calendar_day() {
        let new_year = NaiveDate::from_ymd_opt(1990, 1, 1);
        assert_eq!(parse_date("1990-01-01"), new_year);
        assert_eq!(parse_date("1990-01-01T01:00:00+05:00"), new_year);
        assert_eq!(parse_date("1990-01-01T23:30:00-08:00"), new_year);
        assert_eq!(parse_date("1990-01-01 08:15:00"), new_year);
        assert_eq!(parse_date("1990-02-30"), None);
    }

    #[test]
    fn email_shape() {
        assert!(is_email("ana@example.com"));
        assert!(!is_email("ana@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("ana example@example.com"));
    }
}

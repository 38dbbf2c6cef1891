//! Resource services: validate, persist, return the stored entity.
//!
//! Every function here is synchronous and expects to be run on a blocking
//! thread (see `handlers`).

use chrono::{NaiveDateTime, SubsecRound, Utc};

pub mod appointments;
pub mod doctors;
pub mod patients;
pub mod users;

/// Current UTC time at the precision PostgreSQL stores (microseconds), so a
/// row reads back exactly as it was returned from the write.
pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

// File: src/validation/mod.rs
// Purpose: Rule registry, binding engine and business helpers

pub mod business;
pub mod filters;
pub mod rule;
pub mod session;
pub mod validators;

pub use business::{days_in_month, month_window, END_DATE, START_DATE};
pub use filters::{Filter, FILTER_PARAM};
pub use rule::{parse_datetime, FieldRule, Transform, ValueType};
pub use session::{BoundData, Clock, ValidationSession};

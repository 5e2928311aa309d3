//! Form field checks shared by the page handlers.
//!
//! A failed check never becomes an HTTP error: handlers render the form again
//! with the problems listed and persist nothing.

use thiserror::Error;
use time::{macros::format_description, Date};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} must be a whole number")]
    NotAnInteger(&'static str),
    #[error("{0} must be a date like 2022-12-07")]
    NotADate(&'static str),
}

/// A required text field, exactly as submitted. Whitespace alone counts as
/// empty.
pub fn required(field: &'static str, value: &str) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        Err(FieldError::Required(field))
    } else {
        Ok(value.to_string())
    }
}

/// Integer parse that tolerates surrounding whitespace.
pub fn integer(field: &'static str, value: &str) -> Result<i64, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Required(field));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| FieldError::NotAnInteger(field))
}

/// `YYYY-MM-DD`, or `None` when left blank.
pub fn optional_date(field: &'static str, value: &str) -> Result<Option<Date>, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| FieldError::NotADate(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn required_rejects_blank_values() {
        assert_eq!(required("bookNotes", ""), Err(FieldError::Required("bookNotes")));
        assert_eq!(required("bookNotes", "   "), Err(FieldError::Required("bookNotes")));
        assert_eq!(required("bookNotes", " good ").unwrap(), " good ");
    }

    #[test]
    fn integer_accepts_large_and_padded_values() {
        assert_eq!(integer("bookRating", "999999999").unwrap(), 999_999_999);
        assert_eq!(integer("bookRating", " 103 ").unwrap(), 103);
        assert_eq!(integer("bookRating", "-2").unwrap(), -2);
        assert_eq!(
            integer("bookRating", "7.5"),
            Err(FieldError::NotAnInteger("bookRating"))
        );
        assert_eq!(integer("bookRating", ""), Err(FieldError::Required("bookRating")));
    }

    #[test]
    fn dates_are_iso_calendar_dates() {
        assert_eq!(
            optional_date("dateFinished", "2022-12-07").unwrap(),
            Some(date!(2022 - 12 - 07))
        );
        assert_eq!(optional_date("dateFinished", "").unwrap(), None);
        assert_eq!(
            optional_date("dateFinished", "07/12/2022"),
            Err(FieldError::NotADate("dateFinished"))
        );
        assert_eq!(
            optional_date("dateFinished", "2022-02-30"),
            Err(FieldError::NotADate("dateFinished"))
        );
    }

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            FieldError::Required("genreName").to_string(),
            "genreName is required"
        );
    }
}

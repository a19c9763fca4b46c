//! Request body helpers shared by the JSON handlers.

use std::fmt::Display;

use validator::Validate;

use ruchna_core::{Email, Phone};

use crate::error::{AppError, FieldErrors, flatten_validation_errors};

/// Field-level problems collected across `validator` and domain parsers.
#[derive(Debug, Default)]
pub struct Problems(FieldErrors);

impl Problems {
    /// Start from the derive-level validation of `input`.
    pub fn of<T: Validate>(input: &T) -> Self {
        match input.validate() {
            Ok(()) => Self::default(),
            Err(errors) => Self(flatten_validation_errors(&errors)),
        }
    }

    /// Record `message` under `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Keep the parsed value, or record the parse error under `field`.
    pub fn check<T, E: Display>(&mut self, field: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    /// Parse a required Ukrainian phone number.
    pub fn phone(&mut self, field: &str, raw: &str) -> Option<Phone> {
        self.check(field, Phone::parse(raw))
    }

    /// Parse an optional email; blank counts as absent.
    pub fn email(&mut self, field: &str, raw: Option<&str>) -> Option<Email> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        self.check(field, Email::parse(raw))
    }

    /// Fail with a 400 carrying every recorded problem, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when at least one problem was recorded.
    pub fn finish(self, message: &str) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(message, self.0))
        }
    }
}

/// Trim and drop blank optional text.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reject names that are only whitespace or too short once trimmed.
///
/// # Errors
///
/// Returns a `validator::ValidationError` with code `name`.
pub fn trimmed_name(value: &str) -> Result<(), validator::ValidationError> {
    let len = value.trim().chars().count();
    if (2..=100).contains(&len) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("name")
            .with_message("name must be 2 to 100 characters".into()))
    }
}

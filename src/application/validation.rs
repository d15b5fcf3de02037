//! Declarative request validation.
//!
//! Request types implement [`Validate`]; the `ValidatedJson` extractor runs
//! it before any handler code, so operations only ever see checked input.

use std::collections::BTreeMap;

use serde::Serialize;

/// Messages grouped by field, in the order the rules ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Input that can check itself.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Non-empty after trimming.
pub fn require_text(errors: &mut ValidationErrors, field: &str, value: &str, label: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} is required"));
        false
    } else {
        true
    }
}

pub fn max_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize, label: &str) {
    if value.chars().count() > max {
        errors.add(field, format!("{label} must not exceed {max} characters"));
    }
}

/// A coordinate must be set (non-zero) and inside `[-bound, bound]`.
pub fn coordinate(errors: &mut ValidationErrors, field: &str, value: f64, bound: f64, label: &str) {
    if value == 0.0 {
        errors.add(field, format!("{label} is required"));
    }
    if !(-bound..=bound).contains(&value) {
        errors.add(field, format!("{label} must be between -{bound} and {bound} degrees"));
    }
}

/// Minimal address shape check: one `@`, something on both sides, a dot in the domain part.
pub fn is_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_accumulate_in_order() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "first");
        errors.add("title", "second");
        errors.add("city", "third");

        assert_eq!(errors.get("title").unwrap(), ["first", "second"]);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["city", "title"]);
        assert!(errors.into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_coordinate_rules() {
        let mut errors = ValidationErrors::new();
        coordinate(&mut errors, "latitude", 0.0, 90.0, "Latitude");
        coordinate(&mut errors, "longitude", 181.0, 180.0, "Longitude");
        coordinate(&mut errors, "ok", -90.0, 90.0, "Ok");

        assert_eq!(errors.get("latitude").unwrap(), ["Latitude is required"]);
        assert_eq!(
            errors.get("longitude").unwrap(),
            ["Longitude must be between -180 and 180 degrees"]
        );
        assert!(errors.get("ok").is_none());
    }

    #[test]
    fn test_text_rules() {
        let mut errors = ValidationErrors::new();
        assert!(!require_text(&mut errors, "title", "   ", "Title"));
        max_length(&mut errors, "title", &"x".repeat(101), 100, "Title");
        max_length(&mut errors, "venue", &"é".repeat(100), 100, "Venue");

        assert_eq!(
            errors.get("title").unwrap(),
            ["Title is required", "Title must not exceed 100 characters"]
        );
        assert!(errors.get("venue").is_none());
    }

    #[test]
    fn test_email_shape() {
        assert!(is_email("bob@test.com"));
        assert!(is_email("a@b"));
        assert!(!is_email("bob"));
        assert!(!is_email("@test.com"));
        assert!(!is_email("bob@"));
        assert!(!is_email("bob@@test.com"));
        assert!(!is_email("bob @test.com"));
    }
}

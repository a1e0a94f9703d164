//! Field validation shared by every record type.
//!
//! Text limits are counted in characters (Unicode scalar values), matching the
//! `VARCHAR(n)` semantics of the relational schema. Integer fields are stored
//! unsigned; callers hand in signed values so that a negative input fails
//! validation instead of wrapping.

use crate::error::{DomainError, DomainResult};

/// Largest value an integer column accepts (the range of a signed 32-bit column).
pub const MAX_STORED_INTEGER: u32 = i32::MAX as u32;

/// Validate a required text field: not blank and at most `max_chars` characters.
pub fn required_text(field: &str, value: &str, max_chars: usize) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    bounded_text(field, value, max_chars)
}

/// Validate an optional text field's length.
pub fn bounded_text(field: &str, value: &str, max_chars: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len > max_chars {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max_chars} characters (got {len})"
        )));
    }
    Ok(())
}

/// Convert a caller-supplied integer into a stored non-negative value.
pub fn non_negative(field: &str, value: i64) -> DomainResult<u32> {
    if value < 0 {
        return Err(DomainError::validation(format!(
            "{field} must be non-negative (got {value})"
        )));
    }
    in_range(field, value)
}

/// Convert a caller-supplied integer into a stored strictly positive value.
pub fn positive(field: &str, value: i64) -> DomainResult<u32> {
    if value < 1 {
        return Err(DomainError::validation(format!(
            "{field} must be positive (got {value})"
        )));
    }
    in_range(field, value)
}

fn in_range(field: &str, value: i64) -> DomainResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_STORED_INTEGER)
        .ok_or_else(|| {
            DomainError::validation(format!(
                "{field} must be at most {MAX_STORED_INTEGER} (got {value})"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn required_text_rejects_blank() {
        assert!(required_text("name", "", 10).is_err());
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "ok", 10).is_ok());
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        // 5 Cyrillic characters, 10 bytes.
        assert!(required_text("name", "Пятак", 5).is_ok());
        assert!(required_text("name", "Пятак!", 5).is_err());
    }

    #[test]
    fn non_negative_accepts_zero_and_rejects_negatives() {
        assert_eq!(non_negative("price", 0).unwrap(), 0);
        assert_eq!(non_negative("price", 500).unwrap(), 500);
        let err = non_negative("price", -1).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation("price must be non-negative (got -1)".to_string())
        );
    }

    #[test]
    fn positive_rejects_zero() {
        assert!(positive("quantity", 0).is_err());
        assert_eq!(positive("quantity", 1).unwrap(), 1);
    }

    #[test]
    fn values_above_column_range_are_rejected() {
        assert!(non_negative("quantity", i64::from(MAX_STORED_INTEGER)).is_ok());
        assert!(non_negative("quantity", i64::from(MAX_STORED_INTEGER) + 1).is_err());
        assert!(positive("quantity", i64::MAX).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn text_within_limit_is_accepted(value in "[a-zA-Zа-я0-9]{1,40}") {
            prop_assert!(required_text("name", &value, 40).is_ok());
        }

        #[test]
        fn text_over_limit_is_rejected(value in "[a-zA-Zа-я0-9]{41,80}") {
            prop_assert!(required_text("name", &value, 40).is_err());
        }

        #[test]
        fn negative_integers_never_convert(value in i64::MIN..0) {
            prop_assert!(non_negative("quantity", value).is_err());
            prop_assert!(positive("quantity", value).is_err());
        }
    }
}

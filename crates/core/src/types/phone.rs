//! Egyptian mobile phone number type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Operator prefix (010, 011, 012, 015) followed by eight digits.
static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^01[0125][0-9]{8}$").expect("Invalid regex"));

/// Error returned when a string is not an Egyptian mobile number.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("phone number must be 11 digits starting with 010, 011, 012 or 015")]
pub struct PhoneError;

/// An Egyptian mobile number, e.g. `01012345678`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a `Phone` from a string. The input is taken as-is: surrounding
    /// whitespace makes it invalid.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] if the input does not match
    /// `^01[0125][0-9]{8}$`.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if MOBILE_RE.is_match(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(PhoneError)
        }
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_operator_prefixes() {
        for number in ["01012345678", "01112345678", "01212345678", "01512345678"] {
            assert!(Phone::parse(number).is_ok(), "{number} should be valid");
        }
    }

    #[test]
    fn test_rejects_unknown_prefix() {
        assert_eq!(Phone::parse("01312345678"), Err(PhoneError));
        assert_eq!(Phone::parse("02012345678"), Err(PhoneError));
    }

    #[test]
    fn test_rejects_wrong_length_and_characters() {
        for number in ["0101234567", "010123456789", "+201012345678", "0101234567a", ""] {
            assert_eq!(Phone::parse(number), Err(PhoneError), "{number:?}");
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_invalid() {
        assert_eq!(Phone::parse(" 01012345678"), Err(PhoneError));
        assert_eq!(Phone::parse("01012345678\n"), Err(PhoneError));
    }
}

//! Capsule code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CapsuleCode`].
///
/// Every variant is a flavour of "invalid format"; the distinction only
/// exists so the lookup form can say what is wrong.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CapsuleCodeError {
    /// The input string is empty.
    #[error("capsule code cannot be empty")]
    Empty,
    /// The input has the wrong number of characters.
    #[error("capsule code must be exactly {expected} characters, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length of the rejected input, in characters.
        actual: usize,
    },
    /// The input contains something other than `A-Z` or `0-9`.
    #[error("capsule code may only contain uppercase letters and digits")]
    InvalidCharacter,
}

/// An 8-character capsule code drawn from `[A-Z0-9]`.
///
/// Codes are assigned by the backend when a capsule is created; the client
/// never generates one. The same rule gates the "look up capsule" action.
///
/// ## Examples
///
/// ```
/// use time_capsule_core::CapsuleCode;
///
/// assert!(CapsuleCode::parse("AB12CD34").is_ok());
/// assert!(CapsuleCode::parse("ab12cd34").is_err()); // lowercase
/// assert!(CapsuleCode::parse("AB12CD3").is_err());  // too short
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct CapsuleCode(String);

impl CapsuleCode {
    /// Exact length of every capsule code.
    pub const LENGTH: usize = 8;

    /// Parse a `CapsuleCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is exactly 8 characters, each an
    /// ASCII uppercase letter or digit.
    pub fn parse(s: &str) -> Result<Self, CapsuleCodeError> {
        if s.is_empty() {
            return Err(CapsuleCodeError::Empty);
        }

        let actual = s.chars().count();
        if actual != Self::LENGTH {
            return Err(CapsuleCodeError::InvalidLength {
                expected: Self::LENGTH,
                actual,
            });
        }

        if !s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(CapsuleCodeError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `CapsuleCode` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CapsuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CapsuleCode {
    type Err = CapsuleCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CapsuleCode {
    type Error = CapsuleCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CapsuleCode> for String {
    fn from(code: CapsuleCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CapsuleCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of [`validate_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeValidation {
    /// Whether the input is a well-formed capsule code.
    pub valid: bool,
    /// Why it was rejected, when `valid` is false.
    pub reason: Option<CapsuleCodeError>,
}

/// Validate user input against the capsule code format without keeping the
/// parsed value.
#[must_use]
pub fn validate_code(code: &str) -> CodeValidation {
    match CapsuleCode::parse(code) {
        Ok(_) => CodeValidation {
            valid: true,
            reason: None,
        },
        Err(reason) => CodeValidation {
            valid: false,
            reason: Some(reason),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_codes() {
        assert!(CapsuleCode::parse("AB12CD34").is_ok());
        assert!(CapsuleCode::parse("00000000").is_ok());
        assert!(CapsuleCode::parse("ZZZZZZZZ").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(CapsuleCode::parse(""), Err(CapsuleCodeError::Empty));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            CapsuleCode::parse("AB12CD3"),
            Err(CapsuleCodeError::InvalidLength {
                expected: 8,
                actual: 7
            })
        );
        assert!(matches!(
            CapsuleCode::parse("AB12CD345"),
            Err(CapsuleCodeError::InvalidLength { actual: 9, .. })
        ));
    }

    #[test]
    fn test_parse_lowercase_rejected() {
        assert_eq!(
            CapsuleCode::parse("ab12cd34"),
            Err(CapsuleCodeError::InvalidCharacter)
        );
    }

    #[test]
    fn test_parse_symbols_and_non_ascii_rejected() {
        assert_eq!(
            CapsuleCode::parse("AB12-D34"),
            Err(CapsuleCodeError::InvalidCharacter)
        );
        // 8 characters, but not 8 ASCII bytes
        assert_eq!(
            CapsuleCode::parse("ÄB12CD34"),
            Err(CapsuleCodeError::InvalidCharacter)
        );
    }

    #[test]
    fn test_validate_code_reports_reason() {
        let ok = validate_code("AB12CD34");
        assert!(ok.valid);
        assert!(ok.reason.is_none());

        let bad = validate_code("ab12cd34");
        assert!(!bad.valid);
        assert_eq!(bad.reason, Some(CapsuleCodeError::InvalidCharacter));
    }

    #[test]
    fn test_deserialize_enforces_format() {
        let code: CapsuleCode = serde_json::from_str("\"AB12CD34\"").unwrap();
        assert_eq!(code.as_str(), "AB12CD34");

        assert!(serde_json::from_str::<CapsuleCode>("\"short\"").is_err());
    }

    #[test]
    fn test_display() {
        let code = CapsuleCode::parse("AB12CD34").unwrap();
        assert_eq!(format!("{code}"), "AB12CD34");
    }
}

//! Admin credential types.

use secrecy::{ExposeSecret, SecretString};

/// Errors that can occur when accepting an [`AdminPassword`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Nothing was entered.
    #[error("password cannot be empty")]
    Empty,
    /// The input is shorter than the minimum.
    #[error("password must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
}

/// The admin password as typed into the login form.
///
/// Only the shape is checked here; whether it is correct is up to the
/// backend. The value is held as a secret so it never shows up in `Debug`
/// output or logs.
#[derive(Debug, Clone)]
pub struct AdminPassword(SecretString);

impl AdminPassword {
    /// Minimum accepted length, in characters.
    pub const MIN_LENGTH: usize = 4;

    /// Accept a password from the login form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or shorter than
    /// [`Self::MIN_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, PasswordError> {
        if s.is_empty() {
            return Err(PasswordError::Empty);
        }

        if s.chars().count() < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        Ok(Self(SecretString::from(s.to_owned())))
    }

    /// The password as a secret.
    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.0
    }

    /// Expose the password for sending it to the backend.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

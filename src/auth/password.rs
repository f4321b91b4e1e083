//! Password validation and hashing.
//!
//! `ValidatedPassword` wraps a string that passed the strength check.
//! `PasswordHash` is the salted bcrypt hash stored for a user.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that has been validated, but not yet hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// `user_inputs` are strings the password should not be built from, such
    /// as the user's email address.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with the estimator's advice if the password is too easy to guess.
    pub fn new(raw_password_string: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let password_analysis = zxcvbn(raw_password_string, user_inputs);

        match password_analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password_string.to_string())),
            _ => Err(Error::TooWeak(
                password_analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string(),
            )),
        }
    }

    /// Validate a password for the account registered with `email`.
    ///
    /// The estimator only matches whole inputs, so the address is also given in
    /// pieces: the local part, its dot, dash, underscore and plus separated
    /// words, and the domain labels.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] if the password is too easy to guess.
    pub fn for_email(raw_password_string: &str, email: &str) -> Result<Self, Error> {
        let user_inputs = email_inputs(email);

        Self::new(raw_password_string, &user_inputs)
    }

    /// Create a new `ValidatedPassword` without any validation.
    ///
    /// Used for seeding demo databases with a known password.
    pub fn new_unchecked(raw_password_string: &str) -> Self {
        Self(raw_password_string.to_string())
    }
}

fn email_inputs(email: &str) -> Vec<&str> {
    let (local_part, domain) = email.split_once('@').unwrap_or((email, ""));
    let mut inputs = vec![email, local_part];

    inputs.extend(local_part.split(['.', '-', '_', '+']));
    inputs.extend(domain.split('.'));
    inputs.retain(|input| !input.is_empty());
    inputs.dedup();

    inputs
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash a validated password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to verify a password.
    /// Pass in [PasswordHash::DEFAULT_COST] outside of tests.
    ///
    /// # Errors
    ///
    /// This function will return an error if the password could not be hashed.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }

    /// Check that `raw_password` matches the stored password.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

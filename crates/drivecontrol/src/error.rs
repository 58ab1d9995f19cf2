//! Error types for drivecontrol.
//!
//! This module defines all error types used throughout the drivecontrol crate,
//! providing detailed context for debugging and short messages suitable for
//! showing inline to the user.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for drivecontrol operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Ledger Errors ===
    /// User-supplied input was rejected before any record was built.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// No vehicle with the given id exists in the ledger.
    #[error("vehicle not found: {id}")]
    VehicleNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// No fuel or maintenance entry with the given id exists on the vehicle.
    #[error("entry not found: {id}")]
    EntryNotFound {
        /// The id that was looked up.
        id: String,
    },

    // === Account Errors ===
    /// An account with the same username (ignoring case) already exists.
    #[error("an account named '{username}' already exists")]
    DuplicateAccount {
        /// The rejected username.
        username: String,
    },

    /// No account matches the given username.
    #[error("no account named '{username}'")]
    AccountNotFound {
        /// The username that was looked up.
        username: String,
    },

    /// The account exists but the password did not match.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The operation needs a logged-in session.
    #[error("not logged in")]
    NotLoggedIn,

    /// Hashing or verifying a password failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    // === Insight Errors ===
    /// The insight service is disabled or has no credentials.
    #[error("insight service unavailable: {reason}")]
    InsightUnavailable {
        /// Why the service cannot be used.
        reason: String,
    },

    /// The request to the insight service failed.
    #[error("insight request failed: {0}")]
    InsightRequest(#[from] reqwest::Error),

    /// The insight service answered with a non-success status.
    #[error("insight service returned HTTP {status}: {body}")]
    InsightStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for drivecontrol operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error for the named field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a vehicle-not-found error.
    #[must_use]
    pub fn vehicle_not_found(id: impl Into<String>) -> Self {
        Self::VehicleNotFound { id: id.into() }
    }

    /// Create an entry-not-found error.
    #[must_use]
    pub fn entry_not_found(id: impl Into<String>) -> Self {
        Self::EntryNotFound { id: id.into() }
    }

    /// Create an insight-unavailable error.
    #[must_use]
    pub fn insight_unavailable(reason: impl Into<String>) -> Self {
        Self::InsightUnavailable {
            reason: reason.into(),
        }
    }

    /// Check if this error is an input validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error reports a duplicate account.
    #[must_use]
    pub fn is_duplicate_account(&self) -> bool {
        matches!(self, Self::DuplicateAccount { .. })
    }

    /// Check if this error is a login failure (unknown user or bad password).
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound { .. } | Self::InvalidCredentials
        )
    }
}

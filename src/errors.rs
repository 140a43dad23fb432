//! Unified error type for the fee ledger.
//!
//! Every fallible function in the crate returns [`Result`]. Variants carry enough
//! context to render a user-facing message; the API layer maps them onto HTTP
//! status codes.

use thiserror::Error;

/// All errors produced by the ledger, its configuration and its HTTP surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Input rejected before touching the database
    #[error("{message}")]
    Validation {
        /// Human-readable description of the problem
        message: String,
    },

    /// Fee amount is zero, negative, NaN or infinite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Payment was requested with an empty selection
    #[error("No fee records selected for payment")]
    NothingSelected,

    /// Family does not exist (or was deleted)
    #[error("Family '{id}' not found")]
    FamilyNotFound {
        /// Family id that was looked up
        id: String,
    },

    /// Fee record does not exist
    #[error("Fee record '{id}' not found")]
    FeeNotFound {
        /// Fee id that was looked up
        id: String,
    },

    /// Fee record is already paid and cannot be paid again
    #[error("Fee record '{id}' is already paid")]
    FeeAlreadyPaid {
        /// Offending fee id
        id: String,
    },

    /// Fee record is unpaid, so there is no payment to reverse
    #[error("Fee record '{id}' is not paid")]
    FeeNotPaid {
        /// Offending fee id
        id: String,
    },

    /// A selected fee record belongs to a different family
    #[error("Fee record '{id}' belongs to family '{actual}', not '{expected}'")]
    FamilyMismatch {
        /// Offending fee id
        id: String,
        /// Family the payment was made for
        expected: String,
        /// Family that owns the record
        actual: String,
    },

    /// A stored fee record violates the status/payment-fields invariant
    #[error("Fee record '{id}' is inconsistent: {reason}")]
    InconsistentFee {
        /// Offending fee id
        id: String,
        /// Which part of the invariant is broken
        reason: String,
    },

    /// Compare-and-swap update touched fewer rows than expected
    #[error("Fee records changed while the payment was being applied ({expected} expected, {updated} updated)")]
    ConcurrentModification {
        /// Rows the update should have touched
        expected: u64,
        /// Rows it actually touched
        updated: u64,
    },

    /// Scannable code could not be rendered
    #[error("QR code generation failed: {message}")]
    QrCode {
        /// Encoder error message
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (config files, sockets)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bind address could not be parsed
    #[error("Invalid bind address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl Error {
    /// Returns true for the "thing does not exist" family of errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FamilyNotFound { .. } | Self::FeeNotFound { .. })
    }

    /// Returns true for errors caused by bad caller input.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidAmount { .. }
                | Self::NothingSelected
                | Self::FeeAlreadyPaid { .. }
                | Self::FeeNotPaid { .. }
                | Self::FamilyMismatch { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

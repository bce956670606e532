//! Error types for the certmesh library.
//!
//! This module defines all error types used throughout the library.
//! All errors implement `std::error::Error` and carry the offending
//! team, role or subject where one exists.

use thiserror::Error;

/// The main error type for certmesh operations.
///
/// This enum covers all failures that can occur while generating keys,
/// signing certificates, resolving the trust topology and assembling
/// per-team artifacts.
#[derive(Error, Debug)]
pub enum CertmeshError {
    /// Key pair generation failed (entropy or parameter error)
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// A CSR's role does not match the signing CA's authorization
    #[error("Role mismatch: CA signs {authorized} certificates, request is for {requested}")]
    RoleMismatch {
        requested: String,
        authorized: String,
    },

    /// The team does not require the requested role
    #[error("Unsupported role: team {team} has no mapping for role {role}")]
    UnsupportedRole { team: String, role: String },

    /// The team is not present in the registry
    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    /// Degenerate or uncontained certificate validity window
    #[error("Invalid validity window: {0}")]
    InvalidValidity(String),

    /// CA-side signing failure (key unreadable or signing rejected)
    #[error("Signing error: {0}")]
    Signing(String),

    /// Subject identity is empty or not a valid DN/SAN
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// Artifact or bundle I/O error
    #[error("Storage I/O error: {0}")]
    Storage(#[from] std::io::Error),

    /// Registry JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input data
    #[error("Parse error: {0}")]
    Parse(String),

    /// PEM encoding/decoding error
    #[error("PEM error: {0}")]
    Pem(String),

    /// Certificate chain verification failure
    #[error("Verification error: {0}")]
    Verification(String),

    /// One or more issuance units failed during a batch run
    #[error("Provisioning failed: {0}")]
    Provision(String),
}

/// A specialized Result type for certmesh operations.
pub type Result<T> = std::result::Result<T, CertmeshError>;

//! Certificate primitives.
//!
//! This module provides CSR construction, validity windows, serial
//! allocation, the certificate authority itself, and read-side
//! verification of issued material.

pub mod authority;
pub mod csr;
pub mod serial;
pub mod validity;
pub mod verify;

pub use authority::{CaParams, CaScope, CertificateAuthority, RoleAuthorization, SignedCertificate};
pub use csr::{build_csr, CertRole, DnProfile, SigningRequest, SubjectIdentity};
pub use serial::{SerialAllocator, SerialPolicy};
pub use validity::ValidityWindow;

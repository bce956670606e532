//! certmesh: batch mTLS PKI provisioning.
//!
//! This library provisions a small PKI for a set of independent teams
//! that must establish mutual-TLS trust. It enables operators to:
//!
//! - Generate per-(team, role) key pairs and certificate signing requests
//! - Create and reuse root CAs under a shared-root or split trust topology
//! - Sign CSRs into client and server certificates with correct X.509
//!   semantics (issuer linkage, unique serials, validity containment,
//!   key usages, subject alternative names)
//! - Lay out the artifact tree and assemble per-team distribution
//!   bundles that never contain a CA private key
//!
//! All operations return `Result` types; nothing panics on bad input.
//!
//! # Example
//!
//! ```rust,no_run
//! use certmesh::provision::{OutputLayout, ProvisionOptions, Provisioner, TeamRegistry};
//! use certmesh::error::Result;
//!
//! fn example() -> Result<()> {
//!     let registry = TeamRegistry::from_json(
//!         r#"{"teams": [{"id": "acme", "hostname": "acme-api.example.com"}]}"#,
//!     )?;
//!     let provisioner = Provisioner::prepare(
//!         registry,
//!         OutputLayout::new("certs"),
//!         ProvisionOptions::default(),
//!     )?;
//!     let report = provisioner.provision_all()?;
//!     println!("Issued {} certificates", report.issued.len());
//!     Ok(())
//! }
//! ```

pub mod cert;
pub mod crypto;
pub mod error;
pub mod provision;

// Re-export commonly used types
pub use error::{CertmeshError, Result};

//! Cryptographic key generation module.
//!
//! This module produces the asymmetric key pairs that back every CA and
//! every leaf certificate. Key generation draws on the operating system
//! entropy source through ring and fails loudly if that source is
//! unavailable; there is no fallback randomness.
//!
//! # Example
//!
//! ```rust
//! use certmesh::crypto::{generate_key_pair, KeyAlgorithm};
//!
//! # fn example() -> certmesh::error::Result<()> {
//! let key = generate_key_pair(KeyAlgorithm::EcdsaP256)?;
//! assert!(key.serialize_pem().contains("BEGIN PRIVATE KEY"));
//! # Ok(())
//! # }
//! ```

pub mod algorithm;

pub use algorithm::{generate_key_pair, KeyAlgorithm};

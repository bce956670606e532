//! Key algorithm selection and key pair generation.
//!
//! This module maps the supported algorithm names onto rcgen signature
//! algorithms and generates fresh key pairs through ring.

use crate::error::{CertmeshError, Result};
use rcgen::KeyPair;
use std::fmt;
use std::str::FromStr;

/// Supported key algorithms for CA and leaf key pairs.
///
/// ECDSA P-256 is the default. RSA is not offered because the ring
/// backend does not generate RSA keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// ECDSA over NIST P-256 with SHA-256
    EcdsaP256,
    /// ECDSA over NIST P-384 with SHA-384
    EcdsaP384,
    /// Ed25519
    Ed25519,
}

impl KeyAlgorithm {
    /// The rcgen signature algorithm backing this key algorithm.
    pub fn signature_algorithm(&self) -> &'static rcgen::SignatureAlgorithm {
        match self {
            KeyAlgorithm::EcdsaP256 => &rcgen::PKCS_ECDSA_P256_SHA256,
            KeyAlgorithm::EcdsaP384 => &rcgen::PKCS_ECDSA_P384_SHA384,
            KeyAlgorithm::Ed25519 => &rcgen::PKCS_ED25519,
        }
    }

    /// Canonical name, as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::EcdsaP256 => "ecdsa-p256",
            KeyAlgorithm::EcdsaP384 => "ecdsa-p384",
            KeyAlgorithm::Ed25519 => "ed25519",
        }
    }
}

impl Default for KeyAlgorithm {
    fn default() -> Self {
        KeyAlgorithm::EcdsaP256
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = CertmeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ecdsa-p256" | "p256" => Ok(KeyAlgorithm::EcdsaP256),
            "ecdsa-p384" | "p384" => Ok(KeyAlgorithm::EcdsaP384),
            "ed25519" => Ok(KeyAlgorithm::Ed25519),
            _ => Err(CertmeshError::KeyGeneration(format!(
                "Unsupported algorithm: '{}'. Use 'ecdsa-p256', 'ecdsa-p384', or 'ed25519'",
                s
            ))),
        }
    }
}

/// Generate a fresh key pair for the given algorithm.
///
/// Fails only on unsupported parameters or an entropy-source failure;
/// it never falls back to weaker randomness.
///
/// # Example
///
/// ```
/// use certmesh::crypto::{generate_key_pair, KeyAlgorithm};
///
/// # fn example() -> certmesh::error::Result<()> {
/// let key = generate_key_pair(KeyAlgorithm::Ed25519)?;
/// assert!(key.serialize_pem().contains("BEGIN PRIVATE KEY"));
/// # Ok(())
/// # }
/// ```
pub fn generate_key_pair(algorithm: KeyAlgorithm) -> Result<KeyPair> {
    KeyPair::generate_for(algorithm.signature_algorithm()).map_err(|e| {
        CertmeshError::KeyGeneration(format!("Failed to generate {} key: {}", algorithm, e))
    })
}

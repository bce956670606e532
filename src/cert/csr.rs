//! Subject identities and certificate signing requests.
//!
//! This module builds the subject distinguished names used by every
//! certificate in the system and turns a key pair plus an identity into
//! a CSR ready for signing.

use crate::error::{CertmeshError, Result};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::prelude::FromDer;

/// Longest common name accepted by X.509 (ub-common-name).
const MAX_COMMON_NAME: usize = 64;

/// The role a certificate authenticates: TLS client or TLS server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertRole {
    Client,
    Server,
}

impl CertRole {
    /// Canonical lowercase name, used in file names and common names.
    pub fn name(&self) -> &'static str {
        match self {
            CertRole::Client => "client",
            CertRole::Server => "server",
        }
    }
}

impl fmt::Display for CertRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CertRole {
    type Err = CertmeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "client" => Ok(CertRole::Client),
            "server" => Ok(CertRole::Server),
            _ => Err(CertmeshError::Parse(format!(
                "Unknown role: '{}'. Use 'client' or 'server'",
                s
            ))),
        }
    }
}

/// Organization-wide distinguished-name fields applied to every subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnProfile {
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
}

/// The subject of one certificate: common name, optional organizational
/// unit, optional SAN name, and the shared organization profile.
///
/// Leaf certificates always carry a SAN name (the team identifier for
/// client certificates, the team hostname for server certificates); CA
/// subjects leave it unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectIdentity {
    pub common_name: String,
    pub org_unit: Option<String>,
    pub san_name: Option<String>,
    pub profile: DnProfile,
}

impl SubjectIdentity {
    /// Check that the identity is syntactically valid as a DN/SAN.
    pub fn validate(&self) -> Result<()> {
        if self.common_name.trim().is_empty() {
            return Err(CertmeshError::InvalidSubject(
                "common name cannot be empty".to_string(),
            ));
        }
        if self.common_name.len() > MAX_COMMON_NAME {
            return Err(CertmeshError::InvalidSubject(format!(
                "common name '{}' exceeds {} characters",
                self.common_name, MAX_COMMON_NAME
            )));
        }
        if let Some(ou) = &self.org_unit {
            if ou.trim().is_empty() {
                return Err(CertmeshError::InvalidSubject(
                    "organizational unit cannot be empty".to_string(),
                ));
            }
        }
        if let Some(country) = &self.profile.country {
            if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CertmeshError::InvalidSubject(format!(
                    "country must be a two-letter code, got '{}'",
                    country
                )));
            }
        }
        if let Some(san) = &self.san_name {
            validate_dns_name(san)?;
        }
        Ok(())
    }
}

/// Assemble the X.509 distinguished name for an identity.
///
/// Field order follows the conventional subject line:
/// C, ST, L, O, OU, CN.
pub fn subject_dn(identity: &SubjectIdentity) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    let profile = &identity.profile;

    if let Some(country) = &profile.country {
        dn.push(DnType::CountryName, country.as_str());
    }
    if let Some(state) = &profile.state {
        dn.push(DnType::StateOrProvinceName, state.as_str());
    }
    if let Some(locality) = &profile.locality {
        dn.push(DnType::LocalityName, locality.as_str());
    }
    if let Some(organization) = &profile.organization {
        dn.push(DnType::OrganizationName, organization.as_str());
    }
    if let Some(org_unit) = &identity.org_unit {
        dn.push(DnType::OrganizationalUnitName, org_unit.as_str());
    }
    dn.push(DnType::CommonName, identity.common_name.as_str());

    dn
}

/// Validate a single DNS label (team identifiers are one label).
///
/// Labels are lowercase alphanumeric with interior hyphens, at most 63
/// characters.
pub fn validate_dns_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(CertmeshError::InvalidSubject(
            "DNS label cannot be empty".to_string(),
        ));
    }
    if label.len() > 63 {
        return Err(CertmeshError::InvalidSubject(format!(
            "DNS label '{}' exceeds 63 characters",
            label
        )));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(CertmeshError::InvalidSubject(format!(
            "DNS label '{}' cannot start or end with a hyphen",
            label
        )));
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CertmeshError::InvalidSubject(format!(
            "DNS label '{}' must be lowercase alphanumeric with hyphens",
            label
        )));
    }
    Ok(())
}

/// Validate a full DNS name (dot-separated labels, at most 253 characters).
pub fn validate_dns_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CertmeshError::InvalidSubject(
            "DNS name cannot be empty".to_string(),
        ));
    }
    if name.len() > 253 {
        return Err(CertmeshError::InvalidSubject(format!(
            "DNS name '{}' exceeds 253 characters",
            name
        )));
    }
    for label in name.split('.') {
        validate_dns_label(label).map_err(|_| {
            CertmeshError::InvalidSubject(format!("'{}' is not a valid DNS name", name))
        })?;
    }
    Ok(())
}

/// A certificate signing request together with the role and identity it
/// was built for.
///
/// The CSR itself is transient: it is consumed by signing and is never a
/// trust artifact. The identity travels with it so the signing CA can
/// set the subject alternative name authoritatively.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    pub csr_pem: String,
    pub role: CertRole,
    pub identity: SubjectIdentity,
}

impl SigningRequest {
    /// DER bytes of the subjectPublicKeyInfo embedded in the CSR.
    ///
    /// Signed certificates must carry these bytes unchanged.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        let block = pem::parse(&self.csr_pem)
            .map_err(|e| CertmeshError::Pem(format!("Failed to parse CSR PEM: {}", e)))?;
        let (_, csr) = X509CertificationRequest::from_der(block.contents())
            .map_err(|e| CertmeshError::Parse(format!("Failed to parse CSR: {}", e)))?;
        Ok(csr.certification_request_info.subject_pki.raw.to_vec())
    }
}

/// Build a CSR for a leaf identity.
///
/// The subject DN is embedded in the request; the SAN name must be
/// present since every leaf certificate carries one. Deterministic given
/// identical inputs, up to the signature algorithm's internal randomness.
///
/// # Example
///
/// ```
/// use certmesh::cert::csr::{build_csr, CertRole, DnProfile, SubjectIdentity};
/// use certmesh::crypto::{generate_key_pair, KeyAlgorithm};
///
/// # fn example() -> certmesh::error::Result<()> {
/// let key = generate_key_pair(KeyAlgorithm::EcdsaP256)?;
/// let identity = SubjectIdentity {
///     common_name: "acme-client".to_string(),
///     org_unit: Some("acme".to_string()),
///     san_name: Some("acme".to_string()),
///     profile: DnProfile::default(),
/// };
/// let request = build_csr(&key, &identity, CertRole::Client)?;
/// assert!(request.csr_pem.contains("BEGIN CERTIFICATE REQUEST"));
/// # Ok(())
/// # }
/// ```
pub fn build_csr(
    key: &KeyPair,
    identity: &SubjectIdentity,
    role: CertRole,
) -> Result<SigningRequest> {
    identity.validate()?;
    let san = identity.san_name.as_deref().ok_or_else(|| {
        CertmeshError::InvalidSubject(format!(
            "leaf identity '{}' requires a subject alternative name",
            identity.common_name
        ))
    })?;

    let mut params = CertificateParams::default();
    params.distinguished_name = subject_dn(identity);
    params.subject_alt_names.push(SanType::DnsName(
        san.to_string()
            .try_into()
            .map_err(|e| CertmeshError::InvalidSubject(format!("invalid SAN '{}': {}", san, e)))?,
    ));

    let csr = params.serialize_request(key).map_err(|e| {
        CertmeshError::KeyGeneration(format!(
            "Failed to build CSR for {}: {}",
            identity.common_name, e
        ))
    })?;
    let csr_pem = csr.pem().map_err(|e| {
        CertmeshError::Pem(format!(
            "Failed to encode CSR for {}: {}",
            identity.common_name, e
        ))
    })?;

    Ok(SigningRequest {
        csr_pem,
        role,
        identity: identity.clone(),
    })
}

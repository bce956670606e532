//! Certificate verification and inspection.
//!
//! Everything here works on PEM strings and answers questions about
//! already-issued material: does this leaf chain to that CA, what
//! subject and extensions does a certificate carry, what is its
//! SHA-256 fingerprint. Nothing in this module can sign.

use crate::error::{CertmeshError, Result};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::FromDer;

/// Fields pulled out of a parsed certificate.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub subject_cn: Option<String>,
    pub issuer_cn: Option<String>,
    pub serial: Vec<u8>,
    pub is_ca: bool,
    pub san_names: Vec<String>,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub client_auth: bool,
    pub server_auth: bool,
}

impl CertificateInfo {
    pub fn serial_hex(&self) -> String {
        hex::encode(&self.serial)
    }
}

fn decode_der(pem_input: &str, expected_tag: &str) -> Result<Vec<u8>> {
    let block = pem::parse(pem_input)
        .map_err(|e| CertmeshError::Pem(format!("Failed to parse PEM: {}", e)))?;
    if block.tag() != expected_tag {
        return Err(CertmeshError::Pem(format!(
            "Expected {} PEM block, found {}",
            expected_tag,
            block.tag()
        )));
    }
    Ok(block.contents().to_vec())
}

/// Check that `cert_pem` was issued and signed by `issuer_pem`.
///
/// Both the issuer/subject DN linkage and the cryptographic signature
/// must hold.
pub fn verify_signed_by(cert_pem: &str, issuer_pem: &str) -> Result<()> {
    let cert_der = decode_der(cert_pem, "CERTIFICATE")?;
    let issuer_der = decode_der(issuer_pem, "CERTIFICATE")?;
    let (_, cert) = X509Certificate::from_der(&cert_der)
        .map_err(|e| CertmeshError::Parse(format!("Invalid certificate: {}", e)))?;
    let (_, issuer) = X509Certificate::from_der(&issuer_der)
        .map_err(|e| CertmeshError::Parse(format!("Invalid issuer certificate: {}", e)))?;

    let issuer_dn = cert.issuer().to_string();
    let subject_dn = issuer.subject().to_string();
    if issuer_dn != subject_dn {
        return Err(CertmeshError::Verification(format!(
            "Certificate issuer '{}' does not match CA subject '{}'",
            issuer_dn, subject_dn
        )));
    }

    cert.verify_signature(Some(issuer.public_key()))
        .map_err(|e| CertmeshError::Verification(format!("Signature verification failed: {}", e)))
}

/// Check that `cert_pem` chains to one of the given trust anchors.
pub fn verify_chain(cert_pem: &str, anchor_pems: &[&str]) -> Result<()> {
    for anchor in anchor_pems {
        if verify_signed_by(cert_pem, anchor).is_ok() {
            return Ok(());
        }
    }
    Err(CertmeshError::Verification(format!(
        "Certificate does not chain to any of the {} trust anchors",
        anchor_pems.len()
    )))
}

/// Parse a certificate and extract its identity, extensions and window.
pub fn inspect(cert_pem: &str) -> Result<CertificateInfo> {
    let der = decode_der(cert_pem, "CERTIFICATE")?;
    let (_, cert) = X509Certificate::from_der(&der)
        .map_err(|e| CertmeshError::Parse(format!("Invalid certificate: {}", e)))?;

    let subject_cn = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);
    let issuer_cn = cert
        .issuer()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);

    let is_ca = cert
        .basic_constraints()
        .map_err(|e| CertmeshError::Parse(format!("Invalid basicConstraints: {}", e)))?
        .map(|bc| bc.value.ca)
        .unwrap_or(false);

    let mut san_names = Vec::new();
    if let Some(san) = cert
        .subject_alternative_name()
        .map_err(|e| CertmeshError::Parse(format!("Invalid subjectAltName: {}", e)))?
    {
        for name in &san.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                san_names.push(dns.to_string());
            }
        }
    }

    let (client_auth, server_auth) = match cert
        .extended_key_usage()
        .map_err(|e| CertmeshError::Parse(format!("Invalid extendedKeyUsage: {}", e)))?
    {
        Some(eku) => (eku.value.client_auth, eku.value.server_auth),
        None => (false, false),
    };

    Ok(CertificateInfo {
        subject_cn,
        issuer_cn,
        serial: cert.raw_serial().to_vec(),
        is_ca,
        san_names,
        not_before: cert.validity().not_before.to_datetime(),
        not_after: cert.validity().not_after.to_datetime(),
        client_auth,
        server_auth,
    })
}

/// DER bytes of the certificate's SubjectPublicKeyInfo.
///
/// Comparing this against a CSR's public key proves the issued
/// certificate binds the same key the requester generated.
pub fn public_key_der(cert_pem: &str) -> Result<Vec<u8>> {
    let der = decode_der(cert_pem, "CERTIFICATE")?;
    let (_, cert) = X509Certificate::from_der(&der)
        .map_err(|e| CertmeshError::Parse(format!("Invalid certificate: {}", e)))?;
    Ok(cert.public_key().raw.to_vec())
}

/// Hex SHA-256 fingerprint over the certificate DER.
pub fn fingerprint_sha256(cert_pem: &str) -> Result<String> {
    let der = decode_der(cert_pem, "CERTIFICATE")?;
    let digest = Sha256::digest(&der);
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::authority::{
        CaParams, CaScope, CertificateAuthority, RoleAuthorization, SignedCertificate,
    };
    use crate::cert::csr::{build_csr, CertRole, DnProfile, SubjectIdentity};
    use crate::cert::serial::SerialPolicy;
    use crate::cert::validity::ValidityWindow;
    use crate::crypto::{generate_key_pair, KeyAlgorithm};

    fn new_ca(name: &str) -> CertificateAuthority {
        CertificateAuthority::create_root(CaParams {
            name: name.to_string(),
            identity: SubjectIdentity {
                common_name: name.to_string(),
                org_unit: None,
                san_name: None,
                profile: DnProfile::default(),
            },
            algorithm: KeyAlgorithm::EcdsaP256,
            validity: ValidityWindow::days_from_now(3650).unwrap(),
            scope: CaScope::Global,
            authorization: RoleAuthorization::Dual,
            serial_policy: SerialPolicy::Random,
        })
        .unwrap()
    }

    fn new_leaf(ca: &CertificateAuthority, team: &str, role: CertRole) -> SignedCertificate {
        let key = generate_key_pair(KeyAlgorithm::EcdsaP256).unwrap();
        let identity = SubjectIdentity {
            common_name: format!("{}-{}", team, role),
            org_unit: Some(team.to_string()),
            san_name: Some(team.to_string()),
            profile: DnProfile::default(),
        };
        let request = build_csr(&key, &identity, role).unwrap();
        ca.sign(&request, ValidityWindow::days_from_now(30).unwrap()).unwrap()
    }

    #[test]
    fn test_verify_signed_by_success() {
        let ca = new_ca("root-ca");
        let leaf = new_leaf(&ca, "acme", CertRole::Client);
        verify_signed_by(&leaf.pem, ca.cert_pem()).unwrap();
    }

    #[test]
    fn test_verify_rejects_foreign_issuer() {
        let ca = new_ca("root-ca");
        let other = new_ca("other-ca");
        let leaf = new_leaf(&ca, "acme", CertRole::Client);

        let result = verify_signed_by(&leaf.pem, other.cert_pem());
        assert!(matches!(result, Err(CertmeshError::Verification(_))));
    }

    #[test]
    fn test_verify_rejects_forged_signature() {
        // Same name, different key: the DN linkage holds but the
        // signature must not.
        let ca = new_ca("root-ca");
        let impostor = new_ca("root-ca");
        let leaf = new_leaf(&ca, "acme", CertRole::Client);

        let result = verify_signed_by(&leaf.pem, impostor.cert_pem());
        assert!(matches!(result, Err(CertmeshError::Verification(_))));
    }

    #[test]
    fn test_verify_chain_picks_matching_anchor() {
        let ca_a = new_ca("root-a");
        let ca_b = new_ca("root-b");
        let leaf = new_leaf(&ca_b, "acme", CertRole::Server);

        verify_chain(&leaf.pem, &[ca_a.cert_pem(), ca_b.cert_pem()]).unwrap();
    }

    #[test]
    fn test_verify_chain_without_matching_anchor() {
        let ca_a = new_ca("root-a");
        let ca_b = new_ca("root-b");
        let leaf = new_leaf(&ca_a, "acme", CertRole::Server);

        let result = verify_chain(&leaf.pem, &[ca_b.cert_pem()]);
        assert!(matches!(result, Err(CertmeshError::Verification(_))));
    }

    #[test]
    fn test_inspect_leaf_fields() {
        let ca = new_ca("root-ca");
        let leaf = new_leaf(&ca, "acme", CertRole::Client);
        let info = inspect(&leaf.pem).unwrap();

        assert_eq!(info.subject_cn.as_deref(), Some("acme-client"));
        assert_eq!(info.issuer_cn.as_deref(), Some("root-ca"));
        assert!(!info.is_ca);
        assert_eq!(info.san_names, vec!["acme".to_string()]);
        assert!(info.client_auth);
        assert!(!info.server_auth);
        assert!(info.not_before < info.not_after);
        assert!(!info.serial_hex().is_empty());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let ca = new_ca("root-ca");
        let leaf_a = new_leaf(&ca, "acme", CertRole::Client);
        let leaf_b = new_leaf(&ca, "acme", CertRole::Client);

        assert_eq!(
            fingerprint_sha256(&leaf_a.pem).unwrap(),
            fingerprint_sha256(&leaf_a.pem).unwrap()
        );
        assert_ne!(
            fingerprint_sha256(&leaf_a.pem).unwrap(),
            fingerprint_sha256(&leaf_b.pem).unwrap()
        );
    }

    #[test]
    fn test_rejects_non_certificate_pem() {
        let key = generate_key_pair(KeyAlgorithm::EcdsaP256).unwrap();
        let result = inspect(&key.serialize_pem());
        assert!(matches!(result, Err(CertmeshError::Pem(_))));
    }
}

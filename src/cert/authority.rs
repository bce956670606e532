//! Certificate authority operations.
//!
//! A `CertificateAuthority` holds a private key and a self-signed
//! certificate, and signs CSRs into leaf certificates. Each CA is
//! authorized for one role (or explicitly for both), scoped either
//! globally or to a single team, and owns its serial number allocator.

use crate::cert::csr::{subject_dn, CertRole, SigningRequest, SubjectIdentity};
use crate::cert::serial::{SerialAllocator, SerialPolicy};
use crate::cert::validity::ValidityWindow;
use crate::crypto::{generate_key_pair, KeyAlgorithm};
use crate::error::{CertmeshError, Result};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, CertificateSigningRequestParams,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose, SanType,
};

/// Whether a CA is trusted for every team or for exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaScope {
    Global,
    Team(String),
}

/// The roles a CA is authorized to sign.
///
/// A CA signs both roles only when explicitly configured with `Dual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAuthorization {
    Client,
    Server,
    Dual,
}

impl RoleAuthorization {
    pub fn permits(&self, role: CertRole) -> bool {
        match self {
            RoleAuthorization::Client => role == CertRole::Client,
            RoleAuthorization::Server => role == CertRole::Server,
            RoleAuthorization::Dual => true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoleAuthorization::Client => "client",
            RoleAuthorization::Server => "server",
            RoleAuthorization::Dual => "client+server",
        }
    }
}

/// Parameters for creating a root CA.
#[derive(Debug, Clone)]
pub struct CaParams {
    /// File-name stem and common name, e.g. "root-client-ca".
    pub name: String,
    pub identity: SubjectIdentity,
    pub algorithm: KeyAlgorithm,
    pub validity: ValidityWindow,
    pub scope: CaScope,
    pub authorization: RoleAuthorization,
    pub serial_policy: SerialPolicy,
}

/// A certificate emitted by [`CertificateAuthority::sign`].
#[derive(Debug, Clone)]
pub struct SignedCertificate {
    pub pem: String,
    pub serial: Vec<u8>,
}

impl SignedCertificate {
    pub fn serial_hex(&self) -> String {
        hex::encode(&self.serial)
    }
}

/// A long-lived signing authority: private key, self-signed certificate,
/// role authorization and serial allocator.
pub struct CertificateAuthority {
    name: String,
    scope: CaScope,
    authorization: RoleAuthorization,
    cert: Certificate,
    cert_pem: String,
    key: KeyPair,
    validity: ValidityWindow,
    serials: SerialAllocator,
}

impl CertificateAuthority {
    /// Create a self-signed root CA.
    ///
    /// The certificate carries CA:true, keyCertSign and cRLSign, and its
    /// own serial comes from the CA's allocator so it counts toward
    /// serial uniqueness like everything else the CA issues.
    ///
    /// # Example
    ///
    /// ```
    /// use certmesh::cert::authority::{CaParams, CaScope, CertificateAuthority, RoleAuthorization};
    /// use certmesh::cert::csr::{DnProfile, SubjectIdentity};
    /// use certmesh::cert::serial::SerialPolicy;
    /// use certmesh::cert::validity::ValidityWindow;
    /// use certmesh::crypto::KeyAlgorithm;
    ///
    /// # fn example() -> certmesh::error::Result<()> {
    /// let ca = CertificateAuthority::create_root(CaParams {
    ///     name: "root-ca".to_string(),
    ///     identity: SubjectIdentity {
    ///         common_name: "root-ca".to_string(),
    ///         org_unit: None,
    ///         san_name: None,
    ///         profile: DnProfile::default(),
    ///     },
    ///     algorithm: KeyAlgorithm::EcdsaP256,
    ///     validity: ValidityWindow::days_from_now(3650)?,
    ///     scope: CaScope::Global,
    ///     authorization: RoleAuthorization::Dual,
    ///     serial_policy: SerialPolicy::Random,
    /// })?;
    /// assert!(ca.cert_pem().contains("BEGIN CERTIFICATE"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_root(params: CaParams) -> Result<Self> {
        let CaParams {
            name,
            identity,
            algorithm,
            validity,
            scope,
            authorization,
            serial_policy,
        } = params;

        identity.validate()?;
        let key = generate_key_pair(algorithm)?;
        let serials = SerialAllocator::new(serial_policy);

        let mut cert_params = CertificateParams::default();
        cert_params.distinguished_name = subject_dn(&identity);
        cert_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        cert_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        cert_params.serial_number = Some(serials.next());
        cert_params.not_before = validity.not_before();
        cert_params.not_after = validity.not_after();

        let cert = cert_params.self_signed(&key).map_err(|e| {
            CertmeshError::Signing(format!("Failed to self-sign CA '{}': {}", name, e))
        })?;
        let cert_pem = cert.pem();

        Ok(Self {
            name,
            scope,
            authorization,
            cert,
            cert_pem,
            key,
            validity,
            serials,
        })
    }

    /// Reconstruct a CA from its PEM key and certificate.
    ///
    /// The supplied certificate PEM stays the canonical trust anchor;
    /// it is never re-serialized. Loaded CAs allocate random serials,
    /// since counter state does not survive across runs.
    pub fn load(
        name: &str,
        cert_pem: &str,
        key_pem: &str,
        scope: CaScope,
        authorization: RoleAuthorization,
    ) -> Result<Self> {
        let key = KeyPair::from_pem(key_pem).map_err(|e| {
            CertmeshError::Signing(format!("CA key for '{}' is unreadable: {}", name, e))
        })?;
        let cert_params = CertificateParams::from_ca_cert_pem(cert_pem).map_err(|e| {
            CertmeshError::Signing(format!("CA certificate for '{}' is unreadable: {}", name, e))
        })?;
        let validity = ValidityWindow::new(cert_params.not_before, cert_params.not_after)?;

        // Re-derive the signing handle; the PEM on disk stays canonical.
        let cert = cert_params.self_signed(&key).map_err(|e| {
            CertmeshError::Signing(format!("Failed to rebuild CA '{}': {}", name, e))
        })?;

        Ok(Self {
            name: name.to_string(),
            scope,
            authorization,
            cert,
            cert_pem: cert_pem.to_string(),
            key,
            validity,
            serials: SerialAllocator::new(SerialPolicy::Random),
        })
    }

    /// Sign a CSR into a leaf certificate.
    ///
    /// Fails with `RoleMismatch` if the request's role is outside this
    /// CA's authorization, and with `InvalidValidity` if the requested
    /// window is not contained in the CA's own. The leaf's subject DN
    /// comes from the CSR; SAN, key usages, basic constraints, serial
    /// and validity are set by the CA.
    pub fn sign(
        &self,
        request: &SigningRequest,
        validity: ValidityWindow,
    ) -> Result<SignedCertificate> {
        if !self.authorization.permits(request.role) {
            return Err(CertmeshError::RoleMismatch {
                requested: request.role.name().to_string(),
                authorized: self.authorization.name().to_string(),
            });
        }
        if !self.validity.contains(&validity) {
            return Err(CertmeshError::InvalidValidity(format!(
                "requested window {} is not contained in CA '{}' window {}",
                validity, self.name, self.validity
            )));
        }
        let san = request.identity.san_name.as_deref().ok_or_else(|| {
            CertmeshError::InvalidSubject(format!(
                "request for '{}' carries no subject alternative name",
                request.identity.common_name
            ))
        })?;

        // Proof of possession: the parser verifies the CSR's self-signature.
        let mut csr = CertificateSigningRequestParams::from_pem(&request.csr_pem)
            .map_err(|e| CertmeshError::Parse(format!("Invalid signing request: {}", e)))?;

        let serial = self.serials.next();
        let serial_bytes = serial.to_bytes();

        csr.params.is_ca = IsCa::NoCa;
        csr.params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        csr.params.extended_key_usages = vec![match request.role {
            CertRole::Client => ExtendedKeyUsagePurpose::ClientAuth,
            CertRole::Server => ExtendedKeyUsagePurpose::ServerAuth,
        }];
        csr.params.serial_number = Some(serial);
        csr.params.not_before = validity.not_before();
        csr.params.not_after = validity.not_after();
        let san_value = san.to_string().try_into().map_err(|e| {
            CertmeshError::InvalidSubject(format!("invalid SAN '{}': {}", san, e))
        })?;
        csr.params.subject_alt_names.clear();
        csr.params.subject_alt_names.push(SanType::DnsName(san_value));

        let cert = csr.signed_by(&self.cert, &self.key).map_err(|e| {
            CertmeshError::Signing(format!(
                "CA '{}' failed to sign '{}': {}",
                self.name, request.identity.common_name, e
            ))
        })?;

        Ok(SignedCertificate {
            pem: cert.pem(),
            serial: serial_bytes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &CaScope {
        &self.scope
    }

    pub fn authorization(&self) -> RoleAuthorization {
        self.authorization
    }

    /// The canonical certificate PEM for this CA.
    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    /// PKCS#8 PEM of the CA private key. Never place this in a bundle.
    pub fn key_pem(&self) -> String {
        self.key.serialize_pem()
    }

    pub fn validity(&self) -> ValidityWindow {
        self.validity
    }
}

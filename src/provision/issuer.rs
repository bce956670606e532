//! Per-unit certificate issuance.
//!
//! The issuer orchestrates one (team, role) unit end to end: validity
//! window, fresh key pair, CSR, CA lookup through the topology policy,
//! signature. Re-invoking for the same unit always mints a new key and
//! certificate; nothing is retrieved or reused.

use crate::cert::authority::SignedCertificate;
use crate::cert::csr::{build_csr, CertRole, SigningRequest};
use crate::cert::validity::ValidityWindow;
use crate::crypto::{generate_key_pair, KeyAlgorithm};
use crate::error::Result;
use crate::provision::registry::TeamRegistry;
use crate::provision::topology::TopologyPolicy;

/// Everything produced for one (team, role) unit.
#[derive(Debug, Clone)]
pub struct IssuedIdentity {
    pub team: String,
    pub role: CertRole,
    pub key_pem: String,
    pub request: SigningRequest,
    pub certificate: SignedCertificate,
}

impl IssuedIdentity {
    pub fn common_name(&self) -> &str {
        &self.request.identity.common_name
    }
}

/// Issues units against a registry and a wired topology policy.
pub struct CertificateIssuer<'a> {
    registry: &'a TeamRegistry,
    policy: &'a TopologyPolicy,
    algorithm: KeyAlgorithm,
    validity_days: u32,
}

impl<'a> CertificateIssuer<'a> {
    pub fn new(
        registry: &'a TeamRegistry,
        policy: &'a TopologyPolicy,
        algorithm: KeyAlgorithm,
        validity_days: u32,
    ) -> Self {
        Self {
            registry,
            policy,
            algorithm,
            validity_days,
        }
    }

    /// Issue a fresh key + certificate for one (team, role).
    ///
    /// The validity window and team lookup are checked before any key
    /// material is generated, so a degenerate window or unknown team
    /// spends no entropy.
    pub fn issue(&self, team_id: &str, role: CertRole) -> Result<IssuedIdentity> {
        let validity = ValidityWindow::days_from_now(self.validity_days)?;
        let team = self.registry.team(team_id)?;

        let key = generate_key_pair(self.algorithm)?;
        let identity = team.identity(role, &self.registry.organization);
        let request = build_csr(&key, &identity, role)?;

        let ca = self.policy.resolve(team_id, role)?;
        let certificate = ca.sign(&request, validity)?;

        Ok(IssuedIdentity {
            team: team.id.clone(),
            role,
            key_pem: key.serialize_pem(),
            request,
            certificate,
        })
    }
}

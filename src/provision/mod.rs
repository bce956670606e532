//! Batch provisioning.
//!
//! This module drives a whole provisioning run: load the registry,
//! create or reuse the CAs the topology calls for, issue every
//! (team, role) unit, write the artifact tree and per-team bundles,
//! and re-verify existing artifacts on demand.

pub mod bundle;
pub mod issuer;
pub mod layout;
pub mod registry;
pub mod topology;

pub use issuer::{CertificateIssuer, IssuedIdentity};
pub use layout::OutputLayout;
pub use registry::{TeamEntry, TeamRegistry};
pub use topology::{TopologyPolicy, TrustTopology};

use crate::cert::authority::{CaParams, CaScope, CertificateAuthority, RoleAuthorization};
use crate::cert::csr::{CertRole, SubjectIdentity};
use crate::cert::serial::SerialPolicy;
use crate::cert::validity::ValidityWindow;
use crate::cert::verify;
use crate::crypto::KeyAlgorithm;
use crate::error::{CertmeshError, Result};
use bundle::BundleBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default leaf certificate lifetime in days.
pub const DEFAULT_LEAF_DAYS: u32 = 1000;
/// Default CA certificate lifetime in days.
pub const DEFAULT_CA_DAYS: u32 = 3650;

/// Knobs for a provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub topology: TrustTopology,
    pub algorithm: KeyAlgorithm,
    pub validity_days: u32,
    pub ca_validity_days: u32,
    pub serial_policy: SerialPolicy,
    /// Keep CSR files next to keys and certificates. CSRs never enter
    /// bundles either way.
    pub write_csrs: bool,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            topology: TrustTopology::default(),
            algorithm: KeyAlgorithm::default(),
            validity_days: DEFAULT_LEAF_DAYS,
            ca_validity_days: DEFAULT_CA_DAYS,
            serial_policy: SerialPolicy::default(),
            write_csrs: true,
        }
    }
}

/// One successfully issued (team, role) unit and where it was written.
#[derive(Debug, Clone)]
pub struct IssuedUnit {
    pub team: String,
    pub role: CertRole,
    pub common_name: String,
    pub serial_hex: String,
    pub key_path: PathBuf,
    pub csr_path: Option<PathBuf>,
    pub cert_path: PathBuf,
}

/// A unit that failed without aborting the run.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    pub team: String,
    pub role: CertRole,
    pub error: String,
}

/// Outcome of a full provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub created_cas: Vec<String>,
    pub loaded_cas: Vec<String>,
    pub issued: Vec<IssuedUnit>,
    pub bundles: Vec<PathBuf>,
    pub failures: Vec<UnitFailure>,
}

impl ProvisionReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Verification result for one on-disk unit.
#[derive(Debug, Clone)]
pub struct VerifyEntry {
    pub team: String,
    pub role: CertRole,
    pub cert_path: PathBuf,
    pub common_name: Option<String>,
    pub serial_hex: Option<String>,
    pub error: Option<String>,
}

/// Outcome of verifying an artifact tree.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub entries: Vec<VerifyEntry>,
}

impl VerifyReport {
    pub fn all_valid(&self) -> bool {
        self.entries.iter().all(|e| e.error.is_none())
    }
}

fn read_pem_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        CertmeshError::Storage(io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
    })
}

/// A wired provisioning run: registry, layout, options and the CA set.
pub struct Provisioner {
    registry: TeamRegistry,
    layout: OutputLayout,
    options: ProvisionOptions,
    policy: TopologyPolicy,
    created_cas: Vec<String>,
    loaded_cas: Vec<String>,
}

impl Provisioner {
    /// Wire up a run, creating any CA whose files are missing.
    ///
    /// Existing CA material at the expected paths is loaded and reused,
    /// so re-running provision rotates leaves while the trust anchors
    /// stay byte-stable.
    pub fn prepare(
        registry: TeamRegistry,
        layout: OutputLayout,
        options: ProvisionOptions,
    ) -> Result<Self> {
        Self::wire(registry, layout, options, true)
    }

    /// Wire up against an existing artifact tree only.
    ///
    /// Used by rotation and verification, which must never invent new
    /// trust anchors as a side effect.
    pub fn open(
        registry: TeamRegistry,
        layout: OutputLayout,
        options: ProvisionOptions,
    ) -> Result<Self> {
        Self::wire(registry, layout, options, false)
    }

    fn wire(
        registry: TeamRegistry,
        layout: OutputLayout,
        options: ProvisionOptions,
        create_missing: bool,
    ) -> Result<Self> {
        registry.validate()?;
        if create_missing {
            layout.ensure_dirs(options.topology)?;
        }

        let mut created = Vec::new();
        let mut loaded = Vec::new();
        let profile = registry.organization.clone();

        let root_name = options.topology.root_ca_name();
        let root = Self::create_or_load_ca(
            root_name,
            &layout.ca_key(root_name),
            &layout.ca_cert(root_name),
            SubjectIdentity {
                common_name: root_name.to_string(),
                org_unit: None,
                san_name: None,
                profile: profile.clone(),
            },
            CaScope::Global,
            options.topology.root_authorization(),
            &options,
            create_missing,
            &mut created,
            &mut loaded,
        )?;

        let mut server_cas = BTreeMap::new();
        if options.topology == TrustTopology::Split {
            for team in &registry.teams {
                if !team.requires(CertRole::Server) {
                    continue;
                }
                let name = topology::server_ca_name(&team.id);
                let ca = Self::create_or_load_ca(
                    &name,
                    &layout.server_ca_key(&team.id),
                    &layout.server_ca_cert(&team.id),
                    SubjectIdentity {
                        common_name: name.clone(),
                        org_unit: Some(team.id.clone()),
                        san_name: None,
                        profile: profile.clone(),
                    },
                    CaScope::Team(team.id.clone()),
                    RoleAuthorization::Server,
                    &options,
                    create_missing,
                    &mut created,
                    &mut loaded,
                )?;
                server_cas.insert(team.id.clone(), ca);
            }
        }

        let policy = TopologyPolicy::new(options.topology, &registry, root, server_cas)?;

        Ok(Self {
            registry,
            layout,
            options,
            policy,
            created_cas: created,
            loaded_cas: loaded,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn create_or_load_ca(
        name: &str,
        key_path: &Path,
        cert_path: &Path,
        identity: SubjectIdentity,
        scope: CaScope,
        authorization: RoleAuthorization,
        options: &ProvisionOptions,
        create_missing: bool,
        created: &mut Vec<String>,
        loaded: &mut Vec<String>,
    ) -> Result<CertificateAuthority> {
        let have_key = key_path.exists();
        let have_cert = cert_path.exists();
        match (have_key, have_cert) {
            (true, true) => {
                let cert_pem = read_pem_file(cert_path)?;
                let key_pem = read_pem_file(key_path)?;
                let ca =
                    CertificateAuthority::load(name, &cert_pem, &key_pem, scope, authorization)?;
                loaded.push(name.to_string());
                Ok(ca)
            }
            (false, false) => {
                if !create_missing {
                    return Err(CertmeshError::Provision(format!(
                        "CA '{}' not found at {} (run provision first)",
                        name,
                        cert_path.display()
                    )));
                }
                if options.validity_days >= options.ca_validity_days {
                    return Err(CertmeshError::InvalidValidity(format!(
                        "Leaf validity ({} days) must be shorter than CA validity ({} days)",
                        options.validity_days, options.ca_validity_days
                    )));
                }
                let ca = CertificateAuthority::create_root(CaParams {
                    name: name.to_string(),
                    identity,
                    algorithm: options.algorithm,
                    validity: ValidityWindow::days_from_now(options.ca_validity_days)?,
                    scope,
                    authorization,
                    serial_policy: options.serial_policy,
                })?;
                layout::write_private_key(key_path, &ca.key_pem())?;
                layout::write_artifact(cert_path, ca.cert_pem())?;
                created.push(name.to_string());
                Ok(ca)
            }
            (true, false) | (false, true) => {
                let (found, missing) = if have_key {
                    (key_path, cert_path)
                } else {
                    (cert_path, key_path)
                };
                Err(CertmeshError::Provision(format!(
                    "CA '{}' material is incomplete: found {} but {} is missing",
                    name,
                    found.display(),
                    missing.display()
                )))
            }
        }
    }

    pub fn registry(&self) -> &TeamRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &TopologyPolicy {
        &self.policy
    }

    /// Issue every required unit and bundle every fully provisioned team.
    ///
    /// Unit failures are collected and reported; a team with any failed
    /// unit gets no bundle. A `Signing` failure aborts the whole run
    /// immediately.
    pub fn provision_all(&self) -> Result<ProvisionReport> {
        let issuer = CertificateIssuer::new(
            &self.registry,
            &self.policy,
            self.options.algorithm,
            self.options.validity_days,
        );
        let mut report = ProvisionReport {
            created_cas: self.created_cas.clone(),
            loaded_cas: self.loaded_cas.clone(),
            issued: Vec::new(),
            bundles: Vec::new(),
            failures: Vec::new(),
        };

        for team in &self.registry.teams {
            let mut team_ok = true;
            for role in &team.roles {
                match self.issue_unit(&issuer, &team.id, *role) {
                    Ok(unit) => report.issued.push(unit),
                    Err(e @ CertmeshError::Signing(_)) => return Err(e),
                    Err(e) => {
                        team_ok = false;
                        report.failures.push(UnitFailure {
                            team: team.id.clone(),
                            role: *role,
                            error: e.to_string(),
                        });
                    }
                }
            }
            if team_ok {
                report.bundles.push(self.write_bundle(&team.id)?);
            }
        }
        Ok(report)
    }

    /// Re-issue one (team, role) unit and rebuild that team's bundle.
    pub fn rotate(&self, team: &str, role: CertRole) -> Result<(IssuedUnit, PathBuf)> {
        let issuer = CertificateIssuer::new(
            &self.registry,
            &self.policy,
            self.options.algorithm,
            self.options.validity_days,
        );
        let unit = self.issue_unit(&issuer, team, role)?;
        let bundle = self.write_bundle(team)?;
        Ok((unit, bundle))
    }

    /// Chain-verify every on-disk unit against its resolved CA and check
    /// the identity it carries.
    pub fn verify_artifacts(&self) -> Result<VerifyReport> {
        let mut entries = Vec::new();
        for team in &self.registry.teams {
            for role in &team.roles {
                entries.push(self.verify_unit(team, *role));
            }
        }
        Ok(VerifyReport { entries })
    }

    fn issue_unit(
        &self,
        issuer: &CertificateIssuer<'_>,
        team: &str,
        role: CertRole,
    ) -> Result<IssuedUnit> {
        let issued = issuer.issue(team, role)?;

        let key_path = self.layout.leaf_key(team, role);
        let cert_path = self.layout.leaf_cert(team, role);
        let mut written: Vec<PathBuf> = Vec::new();

        match self.write_unit_files(&issued, &key_path, &cert_path, &mut written) {
            Ok(csr_path) => Ok(IssuedUnit {
                team: issued.team.clone(),
                role,
                common_name: issued.common_name().to_string(),
                serial_hex: issued.certificate.serial_hex(),
                key_path,
                csr_path,
                cert_path,
            }),
            Err(e) => {
                // A failed unit leaves no partial artifacts behind
                for path in &written {
                    let _ = fs::remove_file(path);
                }
                Err(e)
            }
        }
    }

    fn write_unit_files(
        &self,
        issued: &IssuedIdentity,
        key_path: &Path,
        cert_path: &Path,
        written: &mut Vec<PathBuf>,
    ) -> Result<Option<PathBuf>> {
        written.push(key_path.to_path_buf());
        layout::write_private_key(key_path, &issued.key_pem)?;

        let csr_path = if self.options.write_csrs {
            let path = self.layout.leaf_csr(&issued.team, issued.role);
            written.push(path.clone());
            layout::write_artifact(&path, &issued.request.csr_pem)?;
            Some(path)
        } else {
            None
        };

        written.push(cert_path.to_path_buf());
        layout::write_artifact(cert_path, &issued.certificate.pem)?;
        Ok(csr_path)
    }

    /// Assemble `bundles/<team>.tar.gz` from the on-disk leaf files and
    /// the team's trust anchors.
    fn write_bundle(&self, team_id: &str) -> Result<PathBuf> {
        let team = self.registry.team(team_id)?;
        let mut builder = BundleBuilder::new(team_id);

        if team.requires(CertRole::Client) {
            builder.add_private_key(
                &layout::leaf_file_name(team_id, CertRole::Client, "key"),
                &read_pem_file(&self.layout.leaf_key(team_id, CertRole::Client))?,
                "Private key for this team's TLS client identity",
            )?;
            builder.add_certificate(
                &layout::leaf_file_name(team_id, CertRole::Client, "crt"),
                &read_pem_file(&self.layout.leaf_cert(team_id, CertRole::Client))?,
                "Client certificate presented when calling other teams",
            )?;
        }
        if team.requires(CertRole::Server) {
            builder.add_private_key(
                &layout::leaf_file_name(team_id, CertRole::Server, "key"),
                &read_pem_file(&self.layout.leaf_key(team_id, CertRole::Server))?,
                "Private key for this team's TLS server",
            )?;
            builder.add_certificate(
                &layout::leaf_file_name(team_id, CertRole::Server, "crt"),
                &read_pem_file(&self.layout.leaf_cert(team_id, CertRole::Server))?,
                &format!("Server certificate for {}", team.hostname),
            )?;
        }
        for ca in self.policy.trust_anchors(team_id)? {
            let note = match (ca.scope(), ca.authorization()) {
                (CaScope::Global, RoleAuthorization::Dual) => {
                    "Root CA certificate; verifies every client and server in the mesh".to_string()
                }
                (CaScope::Global, _) => {
                    "Client root CA certificate; verifies any team's client certificate".to_string()
                }
                (CaScope::Team(id), _) => format!(
                    "Server CA for team '{}'; verifies that team's server certificate",
                    id
                ),
            };
            builder.add_certificate(&format!("{}.crt", ca.name()), ca.cert_pem(), &note)?;
        }

        let path = self.layout.bundle_archive(team_id);
        builder.write(&path)?;
        Ok(path)
    }

    fn verify_unit(&self, team: &TeamEntry, role: CertRole) -> VerifyEntry {
        let cert_path = self.layout.leaf_cert(&team.id, role);
        let mut entry = VerifyEntry {
            team: team.id.clone(),
            role,
            cert_path: cert_path.clone(),
            common_name: None,
            serial_hex: None,
            error: None,
        };
        if let Err(e) = self.check_unit(team, role, &cert_path, &mut entry) {
            entry.error = Some(e.to_string());
        }
        entry
    }

    fn check_unit(
        &self,
        team: &TeamEntry,
        role: CertRole,
        cert_path: &Path,
        entry: &mut VerifyEntry,
    ) -> Result<()> {
        let cert_pem = read_pem_file(cert_path)?;
        let ca = self.policy.resolve(&team.id, role)?;
        verify::verify_signed_by(&cert_pem, ca.cert_pem())?;

        let info = verify::inspect(&cert_pem)?;
        entry.common_name = info.subject_cn.clone();
        entry.serial_hex = Some(info.serial_hex());

        let expected_cn = format!("{}-{}", team.id, role.name());
        if info.subject_cn.as_deref() != Some(expected_cn.as_str()) {
            return Err(CertmeshError::Verification(format!(
                "Expected common name '{}', found '{}'",
                expected_cn,
                info.subject_cn.unwrap_or_default()
            )));
        }
        if info.is_ca {
            return Err(CertmeshError::Verification(format!(
                "'{}' is marked as a CA certificate",
                expected_cn
            )));
        }
        let role_ok = match role {
            CertRole::Client => info.client_auth,
            CertRole::Server => info.server_auth,
        };
        if !role_ok {
            return Err(CertmeshError::Verification(format!(
                "'{}' lacks the {} extended key usage",
                expected_cn,
                role.name()
            )));
        }
        let expected_san = match role {
            CertRole::Client => team.id.as_str(),
            CertRole::Server => team.hostname.as_str(),
        };
        if !info.san_names.iter().any(|n| n == expected_san) {
            return Err(CertmeshError::Verification(format!(
                "'{}' does not carry SAN '{}'",
                expected_cn, expected_san
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REGISTRY_JSON: &str = r#"{
        "organization": {"organization": "Miniconomy"},
        "teams": [
            {"id": "acme", "hostname": "acme-api.example.com"},
            {"id": "globex", "hostname": "globex.example.com", "roles": ["client"]}
        ]
    }"#;

    fn test_registry() -> TeamRegistry {
        TeamRegistry::from_json(REGISTRY_JSON).unwrap()
    }

    fn test_options(topology: TrustTopology) -> ProvisionOptions {
        ProvisionOptions {
            topology,
            validity_days: 30,
            ca_validity_days: 365,
            ..ProvisionOptions::default()
        }
    }

    #[test]
    fn test_prepare_creates_split_cas() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let provisioner = Provisioner::prepare(
            test_registry(),
            layout.clone(),
            test_options(TrustTopology::Split),
        )
        .unwrap();

        assert_eq!(
            provisioner.created_cas,
            vec!["root-client-ca".to_string(), "acme-server-ca".to_string()]
        );
        assert!(provisioner.loaded_cas.is_empty());
        assert!(layout.ca_key("root-client-ca").exists());
        assert!(layout.ca_cert("root-client-ca").exists());
        assert!(layout.server_ca_cert("acme").exists());
        // globex is client-only and owns no server CA
        assert!(!layout.server_ca_cert("globex").exists());
    }

    #[test]
    fn test_prepare_reuses_existing_cas() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let options = test_options(TrustTopology::Split);

        Provisioner::prepare(test_registry(), layout.clone(), options.clone()).unwrap();
        let first_root = fs::read(layout.ca_cert("root-client-ca")).unwrap();

        let second = Provisioner::prepare(test_registry(), layout.clone(), options).unwrap();
        assert!(second.created_cas.is_empty());
        assert_eq!(
            second.loaded_cas,
            vec!["root-client-ca".to_string(), "acme-server-ca".to_string()]
        );
        // Loading never rewrites the trust anchor
        assert_eq!(fs::read(layout.ca_cert("root-client-ca")).unwrap(), first_root);
    }

    #[test]
    fn test_open_requires_existing_cas() {
        let temp_dir = TempDir::new().unwrap();
        let result = Provisioner::open(
            test_registry(),
            OutputLayout::new(temp_dir.path()),
            test_options(TrustTopology::Split),
        );
        assert!(matches!(result, Err(CertmeshError::Provision(_))));
    }

    #[test]
    fn test_provision_all_split() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let provisioner = Provisioner::prepare(
            test_registry(),
            layout.clone(),
            test_options(TrustTopology::Split),
        )
        .unwrap();

        let report = provisioner.provision_all().unwrap();
        assert!(report.all_succeeded());
        // acme client+server, globex client
        assert_eq!(report.issued.len(), 3);
        assert_eq!(report.bundles.len(), 2);

        assert!(layout.leaf_key("acme", CertRole::Client).exists());
        assert!(layout.leaf_csr("acme", CertRole::Client).exists());
        assert!(layout.leaf_cert("acme", CertRole::Server).exists());
        assert!(layout.leaf_cert("globex", CertRole::Client).exists());
        assert!(layout.bundle_archive("acme").exists());
        assert!(layout.bundle_archive("globex").exists());
    }

    #[test]
    fn test_provision_all_shared_root() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let provisioner = Provisioner::prepare(
            test_registry(),
            layout.clone(),
            test_options(TrustTopology::SharedRoot),
        )
        .unwrap();

        let report = provisioner.provision_all().unwrap();
        assert!(report.all_succeeded());
        assert_eq!(report.created_cas, vec!["root-ca".to_string()]);
        assert!(layout.ca_cert("root-ca").exists());
        assert!(!temp_dir.path().join("server-cas").exists());
    }

    #[test]
    fn test_discard_csrs() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let options = ProvisionOptions {
            write_csrs: false,
            ..test_options(TrustTopology::Split)
        };
        let provisioner = Provisioner::prepare(test_registry(), layout.clone(), options).unwrap();

        let report = provisioner.provision_all().unwrap();
        assert!(report.issued.iter().all(|u| u.csr_path.is_none()));
        assert!(!layout.leaf_csr("acme", CertRole::Client).exists());
        assert!(layout.leaf_key("acme", CertRole::Client).exists());
    }

    #[test]
    fn test_degenerate_validity_fails_every_unit() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let options = ProvisionOptions {
            validity_days: 0,
            ..test_options(TrustTopology::Split)
        };
        let provisioner = Provisioner::prepare(test_registry(), layout.clone(), options).unwrap();

        let report = provisioner.provision_all().unwrap();
        assert_eq!(report.failures.len(), 3);
        assert!(report.issued.is_empty());
        assert!(report.bundles.is_empty());
        // No partial leaf artifacts anywhere
        assert!(!layout.leaf_key("acme", CertRole::Client).exists());
        assert!(!layout.leaf_cert("acme", CertRole::Server).exists());
        assert!(!layout.bundle_archive("acme").exists());
    }

    #[test]
    fn test_rotate_mints_new_serial() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let options = test_options(TrustTopology::Split);
        let provisioner =
            Provisioner::prepare(test_registry(), layout.clone(), options.clone()).unwrap();
        let report = provisioner.provision_all().unwrap();
        let before = report
            .issued
            .iter()
            .find(|u| u.team == "acme" && u.role == CertRole::Client)
            .unwrap()
            .clone();
        let old_cert = fs::read_to_string(&before.cert_path).unwrap();

        let rotator = Provisioner::open(test_registry(), layout.clone(), options).unwrap();
        let (after, bundle) = rotator.rotate("acme", CertRole::Client).unwrap();

        assert_ne!(before.serial_hex, after.serial_hex);
        assert_ne!(fs::read_to_string(&after.cert_path).unwrap(), old_cert);
        assert!(bundle.exists());

        // The replaced certificate still verifies against the same root
        let root_pem = fs::read_to_string(layout.ca_cert("root-client-ca")).unwrap();
        verify::verify_signed_by(&old_cert, &root_pem).unwrap();
    }

    #[test]
    fn test_rotate_unknown_team() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let options = test_options(TrustTopology::Split);
        let provisioner =
            Provisioner::prepare(test_registry(), layout.clone(), options.clone()).unwrap();
        provisioner.provision_all().unwrap();

        let result = provisioner.rotate("initech", CertRole::Client);
        assert!(matches!(result, Err(CertmeshError::UnknownTeam(_))));
    }

    #[test]
    fn test_verify_artifacts_clean_tree() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let options = test_options(TrustTopology::Split);
        Provisioner::prepare(test_registry(), layout.clone(), options.clone())
            .unwrap()
            .provision_all()
            .unwrap();

        let verifier = Provisioner::open(test_registry(), layout, options).unwrap();
        let report = verifier.verify_artifacts().unwrap();
        assert_eq!(report.entries.len(), 3);
        assert!(report.all_valid());
        assert!(report.entries.iter().all(|e| e.serial_hex.is_some()));
    }

    #[test]
    fn test_verify_detects_swapped_certificate() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path());
        let options = test_options(TrustTopology::Split);
        Provisioner::prepare(test_registry(), layout.clone(), options.clone())
            .unwrap()
            .provision_all()
            .unwrap();

        // globex's client certificate chains to the same root but names
        // the wrong team
        let globex = fs::read(layout.leaf_cert("globex", CertRole::Client)).unwrap();
        fs::write(layout.leaf_cert("acme", CertRole::Client), globex).unwrap();

        let verifier = Provisioner::open(test_registry(), layout, options).unwrap();
        let report = verifier.verify_artifacts().unwrap();
        assert!(!report.all_valid());

        let bad = report
            .entries
            .iter()
            .find(|e| e.team == "acme" && e.role == CertRole::Client)
            .unwrap();
        assert!(bad.error.as_deref().unwrap().contains("common name"));
    }
}

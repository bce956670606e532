//! Trust topology policy.
//!
//! The topology decides which CA signs each (team, role) unit and which
//! CA certificates belong in a team's bundle. It is chosen once per
//! provisioning run and never inferred from existing artifacts.

use crate::cert::authority::{CaScope, CertificateAuthority, RoleAuthorization};
use crate::cert::csr::CertRole;
use crate::error::{CertmeshError, Result};
use crate::provision::registry::TeamRegistry;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The two supported trust layouts.
///
/// `SharedRoot` keeps a single dual-authorized CA for everything.
/// `Split` keeps one global client CA and one server CA per team, so a
/// team's server trust can be revoked without touching client trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustTopology {
    SharedRoot,
    #[default]
    Split,
}

impl TrustTopology {
    pub fn name(&self) -> &'static str {
        match self {
            TrustTopology::SharedRoot => "shared-root",
            TrustTopology::Split => "split",
        }
    }

    /// File-name stem and common name of the global root CA.
    pub fn root_ca_name(&self) -> &'static str {
        match self {
            TrustTopology::SharedRoot => "root-ca",
            TrustTopology::Split => "root-client-ca",
        }
    }

    /// Role authorization the global root CA must carry.
    pub fn root_authorization(&self) -> RoleAuthorization {
        match self {
            TrustTopology::SharedRoot => RoleAuthorization::Dual,
            TrustTopology::Split => RoleAuthorization::Client,
        }
    }
}

impl fmt::Display for TrustTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrustTopology {
    type Err = CertmeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "shared-root" => Ok(TrustTopology::SharedRoot),
            "split" => Ok(TrustTopology::Split),
            _ => Err(CertmeshError::Parse(format!(
                "Unknown topology: '{}'. Use 'shared-root' or 'split'",
                s
            ))),
        }
    }
}

/// File-name stem and common name of a team's server CA (split topology).
pub fn server_ca_name(team: &str) -> String {
    format!("{}-server-ca", team)
}

/// A fully wired topology: the CAs plus the registry's team/role map.
///
/// Construction checks that the CA set matches the topology, so
/// `resolve` afterwards is a pure lookup.
pub struct TopologyPolicy {
    topology: TrustTopology,
    root: CertificateAuthority,
    server_cas: BTreeMap<String, CertificateAuthority>,
    team_roles: BTreeMap<String, Vec<CertRole>>,
}

impl TopologyPolicy {
    pub fn new(
        topology: TrustTopology,
        registry: &TeamRegistry,
        root: CertificateAuthority,
        server_cas: BTreeMap<String, CertificateAuthority>,
    ) -> Result<Self> {
        if root.authorization() != topology.root_authorization() {
            return Err(CertmeshError::Provision(format!(
                "Topology '{}' requires a {} root CA, got {}",
                topology,
                topology.root_authorization().name(),
                root.authorization().name()
            )));
        }
        match topology {
            TrustTopology::SharedRoot => {
                if !server_cas.is_empty() {
                    return Err(CertmeshError::Provision(
                        "Topology 'shared-root' does not use per-team server CAs".to_string(),
                    ));
                }
            }
            TrustTopology::Split => {
                for team in &registry.teams {
                    if team.requires(CertRole::Server) && !server_cas.contains_key(&team.id) {
                        return Err(CertmeshError::Provision(format!(
                            "Topology 'split' is missing a server CA for team '{}'",
                            team.id
                        )));
                    }
                }
                for (team_id, ca) in &server_cas {
                    if registry.team(team_id).is_err() {
                        return Err(CertmeshError::Provision(format!(
                            "Server CA '{}' does not belong to any registered team",
                            ca.name()
                        )));
                    }
                    if ca.scope() != &CaScope::Team(team_id.clone()) {
                        return Err(CertmeshError::Provision(format!(
                            "Server CA '{}' is not scoped to team '{}'",
                            ca.name(),
                            team_id
                        )));
                    }
                    if ca.authorization() != RoleAuthorization::Server {
                        return Err(CertmeshError::Provision(format!(
                            "Server CA '{}' must be server-only, got {}",
                            ca.name(),
                            ca.authorization().name()
                        )));
                    }
                }
            }
        }

        let team_roles = registry
            .teams
            .iter()
            .map(|t| (t.id.clone(), t.roles.clone()))
            .collect();

        Ok(Self {
            topology,
            root,
            server_cas,
            team_roles,
        })
    }

    pub fn topology(&self) -> TrustTopology {
        self.topology
    }

    pub fn root(&self) -> &CertificateAuthority {
        &self.root
    }

    pub fn server_ca(&self, team: &str) -> Option<&CertificateAuthority> {
        self.server_cas.get(team)
    }

    /// The CA that must sign this (team, role) unit.
    pub fn resolve(&self, team: &str, role: CertRole) -> Result<&CertificateAuthority> {
        let roles = self
            .team_roles
            .get(team)
            .ok_or_else(|| CertmeshError::UnknownTeam(team.to_string()))?;
        if !roles.contains(&role) {
            return Err(CertmeshError::UnsupportedRole {
                team: team.to_string(),
                role: role.name().to_string(),
            });
        }
        match (self.topology, role) {
            (TrustTopology::SharedRoot, _) | (TrustTopology::Split, CertRole::Client) => {
                Ok(&self.root)
            }
            (TrustTopology::Split, CertRole::Server) => {
                self.server_cas.get(team).ok_or_else(|| {
                    CertmeshError::Provision(format!("No server CA wired for team '{}'", team))
                })
            }
        }
    }

    /// The CAs whose certificates go into the team's bundle: the global
    /// root always, plus the team's own server CA under split topology.
    pub fn trust_anchors(&self, team: &str) -> Result<Vec<&CertificateAuthority>> {
        let roles = self
            .team_roles
            .get(team)
            .ok_or_else(|| CertmeshError::UnknownTeam(team.to_string()))?;

        let mut anchors = vec![&self.root];
        if self.topology == TrustTopology::Split && roles.contains(&CertRole::Server) {
            if let Some(ca) = self.server_cas.get(team) {
                anchors.push(ca);
            }
        }
        Ok(anchors)
    }
}

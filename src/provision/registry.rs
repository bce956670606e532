//! Team registry input.
//!
//! The registry is the JSON document operators feed into provisioning:
//! one organization-wide DN profile plus one entry per team. Parsing
//! validates the whole document up front so a bad entry is reported
//! before any key material is generated.

use crate::cert::csr::{validate_dns_label, validate_dns_name, CertRole, DnProfile, SubjectIdentity};
use crate::error::{CertmeshError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Longest accepted team identifier. Leaves room for the longest
/// derived common name, `<id>-server-ca`, within the 64-character CN
/// bound.
const MAX_TEAM_ID: usize = 54;

/// One team to provision: identifier, server hostname, requested roles.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamEntry {
    /// Single DNS label, e.g. "acme". Used in file names, common names
    /// and client SANs.
    pub id: String,
    /// DNS name the team's server certificate is issued for.
    pub hostname: String,
    #[serde(default = "default_roles")]
    pub roles: Vec<CertRole>,
}

fn default_roles() -> Vec<CertRole> {
    vec![CertRole::Client, CertRole::Server]
}

impl TeamEntry {
    pub fn requires(&self, role: CertRole) -> bool {
        self.roles.contains(&role)
    }

    /// The leaf subject for this team in the given role.
    ///
    /// Common name is `<id>-<role>`; the SAN is the team identifier for
    /// clients and the hostname for servers.
    pub fn identity(&self, role: CertRole, profile: &DnProfile) -> SubjectIdentity {
        let san_name = match role {
            CertRole::Client => self.id.clone(),
            CertRole::Server => self.hostname.clone(),
        };
        SubjectIdentity {
            common_name: format!("{}-{}", self.id, role.name()),
            org_unit: Some(self.id.clone()),
            san_name: Some(san_name),
            profile: profile.clone(),
        }
    }
}

/// The parsed and validated registry document.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamRegistry {
    #[serde(default)]
    pub organization: DnProfile,
    pub teams: Vec<TeamEntry>,
}

impl TeamRegistry {
    /// Read and validate a registry from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate a registry from a JSON string.
    ///
    /// # Example
    ///
    /// ```
    /// use certmesh::provision::registry::TeamRegistry;
    ///
    /// let registry = TeamRegistry::from_json(
    ///     r#"{"teams": [{"id": "acme", "hostname": "acme-api.example.com"}]}"#,
    /// ).unwrap();
    /// assert_eq!(registry.teams.len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let registry: TeamRegistry = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Check identifiers, hostnames and role lists across the document.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for team in &self.teams {
            validate_dns_label(&team.id).map_err(|_| {
                CertmeshError::Parse(format!(
                    "Registry: team id '{}' must be a lowercase DNS label",
                    team.id
                ))
            })?;
            if team.id.len() > MAX_TEAM_ID {
                return Err(CertmeshError::Parse(format!(
                    "Registry: team id '{}' exceeds {} characters",
                    team.id, MAX_TEAM_ID
                )));
            }
            if !seen.insert(team.id.as_str()) {
                return Err(CertmeshError::Parse(format!(
                    "Registry: duplicate team id '{}'",
                    team.id
                )));
            }
            validate_dns_name(&team.hostname).map_err(|_| {
                CertmeshError::Parse(format!(
                    "Registry: team '{}' hostname '{}' is not a valid DNS name",
                    team.id, team.hostname
                ))
            })?;
            if team.roles.is_empty() {
                return Err(CertmeshError::Parse(format!(
                    "Registry: team '{}' requests no roles",
                    team.id
                )));
            }
            let mut roles = HashSet::new();
            for role in &team.roles {
                if !roles.insert(role) {
                    return Err(CertmeshError::Parse(format!(
                        "Registry: team '{}' lists role '{}' twice",
                        team.id, role
                    )));
                }
            }
        }
        Ok(())
    }

    /// Look up a team by identifier.
    pub fn team(&self, id: &str) -> Result<&TeamEntry> {
        self.teams
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| CertmeshError::UnknownTeam(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "organization": {
            "country": "ZA",
            "state": "Gauteng",
            "locality": "Johannesburg",
            "organization": "Miniconomy"
        },
        "teams": [
            {"id": "acme", "hostname": "acme-api.example.com"},
            {"id": "globex", "hostname": "globex.example.com", "roles": ["client"]}
        ]
    }"#;

    #[test]
    fn test_from_json_success() {
        let registry = TeamRegistry::from_json(FIXTURE).unwrap();
        assert_eq!(registry.teams.len(), 2);
        assert_eq!(registry.organization.country.as_deref(), Some("ZA"));
        assert_eq!(registry.teams[0].id, "acme");
    }

    #[test]
    fn test_default_roles_are_both() {
        let registry = TeamRegistry::from_json(FIXTURE).unwrap();
        let acme = registry.team("acme").unwrap();
        assert!(acme.requires(CertRole::Client));
        assert!(acme.requires(CertRole::Server));

        let globex = registry.team("globex").unwrap();
        assert!(globex.requires(CertRole::Client));
        assert!(!globex.requires(CertRole::Server));
    }

    #[test]
    fn test_missing_organization_defaults() {
        let registry = TeamRegistry::from_json(
            r#"{"teams": [{"id": "acme", "hostname": "acme.example.com"}]}"#,
        )
        .unwrap();
        assert_eq!(registry.organization, DnProfile::default());
    }

    #[test]
    fn test_rejects_duplicate_team_ids() {
        let result = TeamRegistry::from_json(
            r#"{"teams": [
                {"id": "acme", "hostname": "a.example.com"},
                {"id": "acme", "hostname": "b.example.com"}
            ]}"#,
        );
        assert!(matches!(result, Err(CertmeshError::Parse(_))));
    }

    #[test]
    fn test_rejects_invalid_team_id() {
        let result = TeamRegistry::from_json(
            r#"{"teams": [{"id": "Acme Corp", "hostname": "acme.example.com"}]}"#,
        );
        assert!(matches!(result, Err(CertmeshError::Parse(_))));
    }

    #[test]
    fn test_rejects_overlong_team_id() {
        let id = "a".repeat(55);
        let result = TeamRegistry::from_json(&format!(
            r#"{{"teams": [{{"id": "{}", "hostname": "acme.example.com"}}]}}"#,
            id
        ));
        assert!(matches!(result, Err(CertmeshError::Parse(_))));
    }

    #[test]
    fn test_rejects_invalid_hostname() {
        let result = TeamRegistry::from_json(
            r#"{"teams": [{"id": "acme", "hostname": "not a hostname"}]}"#,
        );
        assert!(matches!(result, Err(CertmeshError::Parse(_))));
    }

    #[test]
    fn test_rejects_empty_roles() {
        let result = TeamRegistry::from_json(
            r#"{"teams": [{"id": "acme", "hostname": "acme.example.com", "roles": []}]}"#,
        );
        assert!(matches!(result, Err(CertmeshError::Parse(_))));
    }

    #[test]
    fn test_rejects_duplicate_roles() {
        let result = TeamRegistry::from_json(
            r#"{"teams": [{"id": "acme", "hostname": "acme.example.com", "roles": ["client", "client"]}]}"#,
        );
        assert!(matches!(result, Err(CertmeshError::Parse(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = TeamRegistry::from_json("{teams: nope");
        assert!(matches!(result, Err(CertmeshError::Json(_))));
    }

    #[test]
    fn test_unknown_team_lookup() {
        let registry = TeamRegistry::from_json(FIXTURE).unwrap();
        let result = registry.team("initech");
        assert!(matches!(result, Err(CertmeshError::UnknownTeam(_))));
    }

    #[test]
    fn test_client_identity() {
        let registry = TeamRegistry::from_json(FIXTURE).unwrap();
        let acme = registry.team("acme").unwrap();
        let identity = acme.identity(CertRole::Client, &registry.organization);

        assert_eq!(identity.common_name, "acme-client");
        assert_eq!(identity.org_unit.as_deref(), Some("acme"));
        assert_eq!(identity.san_name.as_deref(), Some("acme"));
        assert_eq!(identity.profile.organization.as_deref(), Some("Miniconomy"));
    }

    #[test]
    fn test_server_identity() {
        let registry = TeamRegistry::from_json(FIXTURE).unwrap();
        let acme = registry.team("acme").unwrap();
        let identity = acme.identity(CertRole::Server, &registry.organization);

        assert_eq!(identity.common_name, "acme-server");
        assert_eq!(identity.san_name.as_deref(), Some("acme-api.example.com"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, FIXTURE).unwrap();

        let registry = TeamRegistry::load(&path).unwrap();
        assert_eq!(registry.teams.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = TeamRegistry::load(Path::new("/nonexistent/registry.json"));
        assert!(matches!(result, Err(CertmeshError::Storage(_))));
    }
}

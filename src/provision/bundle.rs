//! Per-team distribution bundles.
//!
//! A bundle is the single archive a team receives: their own keys and
//! certificates plus the CA certificates they must trust, with a
//! generated README describing each file. The builder refuses CA
//! private keys by construction, and archives are staged through a
//! temporary file so a failed write never leaves something that looks
//! like a finished bundle.

use crate::error::{CertmeshError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

struct BundleEntry {
    name: String,
    contents: Vec<u8>,
    mode: u32,
    note: String,
}

/// Collects a team's files, then writes them as `<team>.tar.gz`.
pub struct BundleBuilder {
    team: String,
    entries: Vec<BundleEntry>,
}

impl BundleBuilder {
    pub fn new(team: &str) -> Self {
        Self {
            team: team.to_string(),
            entries: Vec::new(),
        }
    }

    /// Add one of the team's own leaf private keys.
    ///
    /// Only `<team>-client.key` and `<team>-server.key` are accepted;
    /// any other key name is rejected so a CA key can never end up in a
    /// bundle, whatever the caller passes.
    pub fn add_private_key(&mut self, name: &str, pem: &str, note: &str) -> Result<()> {
        let allowed = [
            format!("{}-client.key", self.team),
            format!("{}-server.key", self.team),
        ];
        if !allowed.iter().any(|a| a == name) {
            return Err(CertmeshError::Provision(format!(
                "Refusing to bundle private key '{}': only team '{}' leaf keys belong in its bundle",
                name, self.team
            )));
        }
        self.entries.push(BundleEntry {
            name: name.to_string(),
            contents: pem.as_bytes().to_vec(),
            mode: 0o600,
            note: note.to_string(),
        });
        Ok(())
    }

    /// Add a certificate (leaf or CA trust anchor).
    ///
    /// The PEM is classified before acceptance: it must contain at
    /// least one certificate block and no private key material.
    pub fn add_certificate(&mut self, name: &str, pem: &str, note: &str) -> Result<()> {
        let mut certificates = 0usize;
        for item in rustls_pemfile::read_all(&mut pem.as_bytes()) {
            let item = item
                .map_err(|e| CertmeshError::Pem(format!("Unreadable PEM in '{}': {}", name, e)))?;
            match item {
                rustls_pemfile::Item::X509Certificate(_) => certificates += 1,
                rustls_pemfile::Item::Pkcs8Key(_)
                | rustls_pemfile::Item::Sec1Key(_)
                | rustls_pemfile::Item::Pkcs1Key(_) => {
                    return Err(CertmeshError::Provision(format!(
                        "Refusing to bundle '{}': it contains private key material",
                        name
                    )));
                }
                _ => {}
            }
        }
        if certificates == 0 {
            return Err(CertmeshError::Pem(format!(
                "'{}' contains no certificate",
                name
            )));
        }
        self.entries.push(BundleEntry {
            name: name.to_string(),
            contents: pem.as_bytes().to_vec(),
            mode: 0o644,
            note: note.to_string(),
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generated README content: one line per file plus handling notes.
    fn readme(&self) -> String {
        let mut text = format!("Certificate bundle for team '{}'\n\n", self.team);
        for entry in &self.entries {
            text.push_str(&format!("{}\n    {}\n", entry.name, entry.note));
        }
        text.push_str("\nFiles ending in .key are private and must never be shared.\n");
        text
    }

    /// Write the archive to `path` via a temporary sibling file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        // Build the whole archive in memory first
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut archive = tar::Builder::new(encoder);
        for entry in &self.entries {
            append_entry(&mut archive, &entry.name, &entry.contents, entry.mode, mtime)?;
        }
        append_entry(&mut archive, "README.txt", self.readme().as_bytes(), 0o644, mtime)?;
        let bytes = archive.into_inner()?.finish()?;

        let file_name = path.file_name().ok_or_else(|| {
            CertmeshError::Provision(format!("Bundle path '{}' has no file name", path.display()))
        })?;
        let tmp = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn append_entry(
    archive: &mut tar::Builder<GzEncoder<Vec<u8>>>,
    name: &str,
    contents: &[u8],
    mode: u32,
    mtime: u64,
) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(mode);
    header.set_mtime(mtime);
    archive.append_data(&mut header, name, contents)?;
    Ok(())
}

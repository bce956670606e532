//! certmesh CLI application.
//!
//! This binary provisions, rotates and verifies per-team mTLS key and
//! certificate trees from a JSON team registry.

use certmesh::cert::csr::CertRole;
use certmesh::error::{CertmeshError, Result};
use certmesh::provision::{
    OutputLayout, ProvisionOptions, Provisioner, TeamRegistry, DEFAULT_CA_DAYS, DEFAULT_LEAF_DAYS,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "certmesh")]
#[command(about = "Batch mTLS PKI provisioning for independent teams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision CAs, certificates and bundles for every registered team
    Provision {
        /// Team registry JSON file
        #[arg(long)]
        registry: PathBuf,

        /// Output directory for all artifacts
        #[arg(long, default_value = "certs")]
        out: PathBuf,

        /// Trust topology: shared-root or split
        #[arg(long, default_value = "split")]
        topology: String,

        /// Key algorithm: ecdsa-p256, ecdsa-p384 or ed25519
        #[arg(long, default_value = "ecdsa-p256")]
        algorithm: String,

        /// Leaf certificate validity in days
        #[arg(long, default_value_t = DEFAULT_LEAF_DAYS)]
        days: u32,

        /// CA certificate validity in days
        #[arg(long, default_value_t = DEFAULT_CA_DAYS)]
        ca_days: u32,

        /// Serial allocation: random or sequential
        #[arg(long, default_value = "random")]
        serial_policy: String,

        /// Do not keep CSR files after issuance
        #[arg(long)]
        discard_csrs: bool,
    },

    /// Re-issue one (team, role) unit and rebuild the team's bundle
    Rotate {
        /// Team registry JSON file
        #[arg(long)]
        registry: PathBuf,

        /// Output directory holding the provisioned artifacts
        #[arg(long, default_value = "certs")]
        out: PathBuf,

        /// Trust topology the artifacts were provisioned with
        #[arg(long, default_value = "split")]
        topology: String,

        /// Team identifier from the registry
        #[arg(long)]
        team: String,

        /// Role to re-issue: client or server
        #[arg(long)]
        role: String,

        /// Key algorithm: ecdsa-p256, ecdsa-p384 or ed25519
        #[arg(long, default_value = "ecdsa-p256")]
        algorithm: String,

        /// Leaf certificate validity in days
        #[arg(long, default_value_t = DEFAULT_LEAF_DAYS)]
        days: u32,

        /// Do not keep the CSR file after issuance
        #[arg(long)]
        discard_csrs: bool,
    },

    /// Verify the on-disk artifacts against their CAs
    Verify {
        /// Team registry JSON file
        #[arg(long)]
        registry: PathBuf,

        /// Output directory holding the provisioned artifacts
        #[arg(long, default_value = "certs")]
        out: PathBuf,

        /// Trust topology the artifacts were provisioned with
        #[arg(long, default_value = "split")]
        topology: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Provision {
            registry,
            out,
            topology,
            algorithm,
            days,
            ca_days,
            serial_policy,
            discard_csrs,
        } => handle_provision(
            &registry,
            &out,
            &topology,
            &algorithm,
            days,
            ca_days,
            &serial_policy,
            discard_csrs,
        ),
        Commands::Rotate {
            registry,
            out,
            topology,
            team,
            role,
            algorithm,
            days,
            discard_csrs,
        } => handle_rotate(
            &registry,
            &out,
            &topology,
            &team,
            &role,
            &algorithm,
            days,
            discard_csrs,
        ),
        Commands::Verify {
            registry,
            out,
            topology,
        } => handle_verify(&registry, &out, &topology),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_provision(
    registry_path: &Path,
    out: &Path,
    topology: &str,
    algorithm: &str,
    days: u32,
    ca_days: u32,
    serial_policy: &str,
    discard_csrs: bool,
) -> Result<()> {
    let registry = TeamRegistry::load(registry_path)?;
    let options = ProvisionOptions {
        topology: topology.parse()?,
        algorithm: algorithm.parse()?,
        validity_days: days,
        ca_validity_days: ca_days,
        serial_policy: serial_policy.parse()?,
        write_csrs: !discard_csrs,
    };

    let provisioner = Provisioner::prepare(registry, OutputLayout::new(out), options)?;
    let report = provisioner.provision_all()?;

    for name in &report.created_cas {
        println!("✓ Created CA: {}", name);
    }
    for name in &report.loaded_cas {
        println!("✓ Reusing CA: {}", name);
    }
    for unit in &report.issued {
        println!("✓ Issued {} ({})", unit.common_name, unit.role);
        println!("  Serial: {}", unit.serial_hex);
        println!("  Certificate: {}", unit.cert_path.display());
    }
    for bundle in &report.bundles {
        println!("✓ Bundle: {}", bundle.display());
    }
    for failure in &report.failures {
        println!("✗ {} ({}) failed: {}", failure.team, failure.role, failure.error);
    }

    if !report.all_succeeded() {
        let total = report.issued.len() + report.failures.len();
        return Err(CertmeshError::Provision(format!(
            "{} of {} units failed",
            report.failures.len(),
            total
        )));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_rotate(
    registry_path: &Path,
    out: &Path,
    topology: &str,
    team: &str,
    role: &str,
    algorithm: &str,
    days: u32,
    discard_csrs: bool,
) -> Result<()> {
    let registry = TeamRegistry::load(registry_path)?;
    let role: CertRole = role.parse()?;
    let options = ProvisionOptions {
        topology: topology.parse()?,
        algorithm: algorithm.parse()?,
        validity_days: days,
        write_csrs: !discard_csrs,
        ..ProvisionOptions::default()
    };

    let provisioner = Provisioner::open(registry, OutputLayout::new(out), options)?;
    let (unit, bundle) = provisioner.rotate(team, role)?;

    println!("✓ Rotated {} ({})", unit.common_name, unit.role);
    println!("  Serial: {}", unit.serial_hex);
    println!("  Certificate: {}", unit.cert_path.display());
    println!("✓ Bundle: {}", bundle.display());

    Ok(())
}

fn handle_verify(registry_path: &Path, out: &Path, topology: &str) -> Result<()> {
    let registry = TeamRegistry::load(registry_path)?;
    let options = ProvisionOptions {
        topology: topology.parse()?,
        ..ProvisionOptions::default()
    };

    let provisioner = Provisioner::open(registry, OutputLayout::new(out), options)?;
    let report = provisioner.verify_artifacts()?;

    let mut failures = 0usize;
    for entry in &report.entries {
        match &entry.error {
            None => {
                println!(
                    "✓ {} ({}) verified",
                    entry.common_name.as_deref().unwrap_or("?"),
                    entry.role
                );
                println!("  Serial: {}", entry.serial_hex.as_deref().unwrap_or("?"));
            }
            Some(error) => {
                failures += 1;
                println!("✗ {} ({}): {}", entry.team, entry.role, error);
            }
        }
    }

    if failures > 0 {
        return Err(CertmeshError::Verification(format!(
            "{} of {} units failed verification",
            failures,
            report.entries.len()
        )));
    }
    println!("✓ All {} units verified", report.entries.len());
    Ok(())
}

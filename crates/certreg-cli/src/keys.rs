//! # Key Generation
//!
//! `keygen` writes a fresh Ed25519 seed and public key as hex files. The
//! seed file is what `--key` loads.

use std::path::Path;

use anyhow::{bail, Context, Result};
use certreg_crypto::Ed25519KeyPair;

use crate::Report;

/// Generate a key pair into `<output_dir>/<prefix>.key` and `.pub`.
///
/// Refuses to overwrite an existing key file.
pub fn cmd_keygen(output_dir: &Path, prefix: &str) -> Result<Report> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let key_path = output_dir.join(format!("{prefix}.key"));
    let pub_path = output_dir.join(format!("{prefix}.pub"));
    if key_path.exists() {
        bail!("key file already exists: {}", key_path.display());
    }

    let key = Ed25519KeyPair::generate();
    let pub_hex = key.public_key().to_hex();

    std::fs::write(&key_path, key.seed_hex().as_bytes())
        .with_context(|| format!("failed to write private key: {}", key_path.display()))?;
    std::fs::write(&pub_path, &pub_hex)
        .with_context(|| format!("failed to write public key: {}", pub_path.display()))?;

    tracing::info!(identity = %key.identity(), "generated key pair");

    Ok(Report::ok(vec![
        "OK: generated Ed25519 keypair".to_string(),
        format!("  Private key: {}", key_path.display()),
        format!("  Public key:  {}", pub_path.display()),
        format!("  Public key (hex): {pub_hex}"),
        format!("  Identity: {}", key.identity()),
    ]))
}

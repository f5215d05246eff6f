//! Bootstrap script loading
//!
//! The launch plan names one plain-text script that every instance in the
//! run receives as EC2 user data. The provider expects it base64-encoded.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read the bootstrap script and return its base64 encoding.
///
/// An unreadable file is fatal to the whole run, so the error names the
/// path for the operator.
pub fn load_encoded(path: &Path) -> Result<String> {
    let raw = fs::read(path)
        .with_context(|| format!("unable to read user-data file {}", path.display()))?;

    Ok(base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        raw,
    ))
}

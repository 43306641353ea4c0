use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::QaError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn default_identity_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".bin/username")
}

pub fn remediation_command(path: &Path, home_dir: &Path) -> String {
    let shown = path
        .strip_prefix(home_dir)
        .map(|p| format!("~/{}", p.display()))
        .unwrap_or_else(|_| path.display().to_string());
    format!("echo YOUR_ROC_USERNAME >{shown}")
}

pub fn resolve_identity(path: &Path) -> Result<Identity> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(QaError::ConfigMissing {
                path: path.to_path_buf(),
            }
            .into());
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read identity file: {}", path.display()));
        }
    };

    let Some(name) = raw.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Err(QaError::ConfigMissing {
            path: path.to_path_buf(),
        }
        .into());
    };

    log::debug!("operator identity resolved from {}", path.display());
    Ok(Identity(name.to_string()))
}

//! Config validation logic.
//! Everything here runs before the first filesystem mutation of a run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::errors::{QbotError, Result};

use super::types::Config;

impl Config {
    /// Validate settings against the source of this run.
    pub fn validate(&self, source: &Path) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(QbotError::Configuration(
                "no candidate extensions configured".into(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(QbotError::Configuration("language must not be empty".into()));
        }

        // A missing source is a walk failure, surfaced now so nothing gets staged.
        fs::symlink_metadata(source).map_err(|e| QbotError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;

        validate_staging_root(&self.temp_root, source)?;

        debug!(
            source = %source.display(),
            temp_root = %self.temp_root.display(),
            destination = %self.destination.display(),
            "Config validated"
        );
        Ok(())
    }
}

/// Reject paths containing whitespace.
///
/// Applied to operator-controlled paths only (the staging root); download paths may
/// legitimately contain spaces.
pub fn validate_no_whitespace(path: &Path) -> Result<()> {
    if path.to_string_lossy().chars().any(char::is_whitespace) {
        error!(path = %path.display(), "path contains whitespace");
        return Err(QbotError::InvalidPath {
            path: path.to_path_buf(),
            reason: "contains whitespace".into(),
        });
    }
    Ok(())
}

/// The staging root must be whitespace-free and disjoint from the source tree:
/// staging inside the source would be walked into, and a source inside staging
/// would be deleted by cleanup.
pub fn validate_staging_root(temp_root: &Path, source: &Path) -> Result<()> {
    validate_no_whitespace(temp_root)?;

    let temp_abs = absolutize(temp_root).map_err(|e| QbotError::InvalidPath {
        path: temp_root.to_path_buf(),
        reason: format!("cannot resolve: {e}"),
    })?;
    let source_abs = absolutize(source).map_err(|e| QbotError::InvalidPath {
        path: source.to_path_buf(),
        reason: format!("cannot resolve: {e}"),
    })?;

    if temp_abs.starts_with(&source_abs) || source_abs.starts_with(&temp_abs) {
        return Err(QbotError::InvalidPath {
            path: temp_root.to_path_buf(),
            reason: format!(
                "staging root and source '{}' must not contain one another",
                source.display()
            ),
        });
    }
    Ok(())
}

/// Canonicalize when the path exists; otherwise canonicalize the nearest existing
/// ancestor and re-append the missing tail.
fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if let Ok(real) = dunce::canonicalize(path) {
        return Ok(real);
    }
    let abs = std::path::absolute(path)?;
    let mut tail = Vec::new();
    let mut cur = abs.as_path();
    loop {
        if let Ok(real) = dunce::canonicalize(cur) {
            let mut out = real;
            for part in tail.iter().rev() {
                out.push(part);
            }
            return Ok(out);
        }
        match (cur.file_name(), cur.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name.to_os_string());
                cur = parent;
            }
            _ => return Ok(abs),
        }
    }
}

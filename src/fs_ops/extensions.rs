//! Extension discovery.
//!
//! `scan_extensions` is advisory: entries that cannot be read mid-walk are skipped,
//! and only a root that cannot be walked at all is an error. Relocation deliberately
//! uses the opposite policy (see `relocate`).

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::errors::{QbotError, Result};

/// Lower-cased, dot-stripped extensions found under a tree.
pub type ExtensionSet = BTreeSet<String>;

/// Lower-cased text after the last `.` of the file name, or None when there is none.
pub fn file_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Case-fold a user-provided extension and strip any leading dots.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Walk `root` recursively and collect the distinct extensions of its regular files.
pub fn scan_extensions(root: &Path) -> Result<ExtensionSet> {
    let meta = fs::metadata(root).map_err(|e| QbotError::Walk {
        path: root.to_path_buf(),
        source: e,
    })?;
    if !meta.is_dir() {
        return Err(QbotError::Walk {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        });
    }

    let mut found = ExtensionSet::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                trace!(error = %e, "skipping unreadable entry during extension scan");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(ext) = file_extension(entry.path()) {
            found.insert(ext);
        }
    }

    debug!(root = %root.display(), extensions = ?found, "scanned extensions");
    Ok(found)
}

/// Keep the caller's preferences that are present in `discovered`, in preference order.
/// Duplicates and empty entries are dropped. An empty result is not an error.
pub fn match_allowlist<S: AsRef<str>>(allowlist: &[S], discovered: &ExtensionSet) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();
    for pref in allowlist {
        let normalized = normalize_extension(pref.as_ref());
        if normalized.is_empty() || matched.contains(&normalized) {
            continue;
        }
        if discovered.contains(&normalized) {
            matched.push(normalized);
        }
    }
    matched
}

//! Tree relocation.
//! Walks a source tree depth-first (sorted by name), skips excluded paths, and moves every
//! regular file into a destination root, either flat or mirroring the source layout.
//!
//! Policy:
//! - A directory listing failure aborts the walk immediately.
//! - The first failed move aborts the walk; files already moved stay moved (no rollback).
//! - Symlinks are never followed or moved.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::{QbotError, Result};

use super::file_move::{MoveOutcome, move_file};

/// Substring patterns; a path containing any of them is excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    patterns: Vec<String>,
}

impl ExclusionSet {
    /// Build from patterns; empty patterns are dropped (they would match every path).
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list such as `sample,extras`.
    pub fn from_csv(s: &str) -> Self {
        Self::new(s.split(',').map(str::trim))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Plain substring containment against the full path.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let text = path.to_string_lossy();
        self.patterns.iter().any(|p| text.contains(p.as_str()))
    }
}

/// Where each relocated file lands under the destination root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DestinationLayout {
    /// `dest/<file name>`; two files with the same name collide and abort the walk.
    #[default]
    Flat,
    /// `dest/<path relative to source>`.
    PreserveStructure,
}

/// Counters for a completed relocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocationReport {
    pub moved: usize,
    pub renamed: usize,
    pub copied: usize,
    pub copied_bytes: u64,
    pub excluded: usize,
}

/// One planned move, as reported by `plan_relocation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// Move every non-excluded regular file under `source` into `dest`.
pub fn relocate_tree(
    source: &Path,
    dest: &Path,
    exclusions: &ExclusionSet,
    layout: DestinationLayout,
) -> Result<RelocationReport> {
    fs::create_dir_all(dest)
        .map_err(|e| QbotError::move_failed("create destination directory", source, dest, e))?;

    let mut report = RelocationReport::default();
    let excluded = walk_files(source, dest, exclusions, layout, |src, target| {
        match move_file(src, &target) {
            Ok(outcome) => {
                report.moved += 1;
                match outcome {
                    MoveOutcome::Renamed => report.renamed += 1,
                    MoveOutcome::Copied { bytes } => {
                        report.copied += 1;
                        report.copied_bytes += bytes;
                    }
                }
                debug!(src = %src.display(), dest = %target.display(), ?outcome, "relocated file");
                Ok(())
            }
            Err(e) => Err(QbotError::PartialFailure {
                path: src.to_path_buf(),
                moved: report.moved,
                source: Box::new(e),
            }),
        }
    })?;
    report.excluded = excluded;

    info!(
        source = %source.display(),
        dest = %dest.display(),
        moved = report.moved,
        copied = report.copied,
        excluded = report.excluded,
        "Relocation finished"
    );
    Ok(report)
}

/// Compute the moves `relocate_tree` would perform, without touching the filesystem.
/// Flat-layout name collisions and pre-existing destinations are reported as errors.
pub fn plan_relocation(
    source: &Path,
    dest: &Path,
    exclusions: &ExclusionSet,
    layout: DestinationLayout,
) -> Result<Vec<PlannedMove>> {
    let mut plan = Vec::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    walk_files(source, dest, exclusions, layout, |src, target| {
        if !claimed.insert(target.clone()) || fs::symlink_metadata(&target).is_ok() {
            return Err(QbotError::PartialFailure {
                path: src.to_path_buf(),
                moved: 0,
                source: Box::new(QbotError::DestinationExists { path: target }),
            });
        }
        plan.push(PlannedMove {
            source: src.to_path_buf(),
            dest: target,
        });
        Ok(())
    })?;
    Ok(plan)
}

/// Shared walker: calls `visit(file, destination)` for every included regular file.
/// Returns the number of excluded files.
fn walk_files<F>(
    source: &Path,
    dest: &Path,
    exclusions: &ExclusionSet,
    layout: DestinationLayout,
    mut visit: F,
) -> Result<usize>
where
    F: FnMut(&Path, PathBuf) -> Result<()>,
{
    let mut excluded = 0usize;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source.to_path_buf());
            QbotError::Walk {
                path,
                source: io::Error::from(e),
            }
        })?;

        let ftype = entry.file_type();
        if ftype.is_dir() {
            continue;
        }
        if ftype.is_symlink() {
            warn!(path = %entry.path().display(), "skipping symlink");
            continue;
        }
        if !ftype.is_file() {
            debug!(path = %entry.path().display(), "skipping special file");
            continue;
        }

        let path = entry.path();
        if exclusions.is_excluded(path) {
            debug!(path = %path.display(), "excluded");
            excluded += 1;
            continue;
        }

        let target = destination_for(source, dest, path, layout)?;
        visit(path, target)?;
    }

    Ok(excluded)
}

fn destination_for(
    source: &Path,
    dest: &Path,
    file: &Path,
    layout: DestinationLayout,
) -> Result<PathBuf> {
    let no_name = || QbotError::Walk {
        path: file.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
    };
    match layout {
        DestinationLayout::Flat => Ok(dest.join(file.file_name().ok_or_else(no_name)?)),
        DestinationLayout::PreserveStructure => match file.strip_prefix(source) {
            // A single-file source has an empty relative path.
            Ok(rel) if !rel.as_os_str().is_empty() => Ok(dest.join(rel)),
            _ => Ok(dest.join(file.file_name().ok_or_else(no_name)?)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn exclusion_is_plain_substring() {
        let ex = ExclusionSet::from_csv("sample");
        assert!(ex.is_excluded(Path::new("/dl/Show/sample/ep01.mkv")));
        assert!(!ex.is_excluded(Path::new("/dl/Show/Episode.mkv")));
        // Not a glob.
        assert!(!ExclusionSet::from_csv("*.nfo").is_excluded(Path::new("/dl/a.nfo")));
    }

    #[test]
    fn empty_patterns_exclude_nothing() {
        let ex = ExclusionSet::from_csv("");
        assert!(ex.is_empty());
        assert!(!ex.is_excluded(Path::new("/anything")));
        let ex = ExclusionSet::from_csv("extras,,");
        assert_eq!(ex.patterns(), ["extras"]);
    }

    #[test]
    fn destinations_for_both_layouts() {
        let src = Path::new("/dl/Show");
        let dst = Path::new("/stage");
        let file = Path::new("/dl/Show/Season 1/e1.mkv");
        assert_eq!(
            destination_for(src, dst, file, DestinationLayout::Flat).unwrap(),
            PathBuf::from("/stage/e1.mkv")
        );
        assert_eq!(
            destination_for(src, dst, file, DestinationLayout::PreserveStructure).unwrap(),
            PathBuf::from("/stage/Season 1/e1.mkv")
        );
        let single = Path::new("/dl/movie.mkv");
        assert_eq!(
            destination_for(single, dst, single, DestinationLayout::PreserveStructure).unwrap(),
            PathBuf::from("/stage/movie.mkv")
        );
    }

    #[test]
    fn plan_detects_flat_collisions() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("a")).unwrap();
        fs::create_dir_all(src.join("b")).unwrap();
        fs::write(src.join("a").join("e1.mkv"), b"1").unwrap();
        fs::write(src.join("b").join("e1.mkv"), b"2").unwrap();

        let err = plan_relocation(&src, &dir.path().join("stage"), &ExclusionSet::default(), DestinationLayout::Flat)
            .unwrap_err();
        assert!(matches!(err.root_cause(), QbotError::DestinationExists { .. }));

        let plan = plan_relocation(
            &src,
            &dir.path().join("stage"),
            &ExclusionSet::default(),
            DestinationLayout::PreserveStructure,
        )
        .unwrap();
        assert_eq!(plan.len(), 2);
        assert!(src.join("a").join("e1.mkv").exists(), "planning must not move anything");
    }
}

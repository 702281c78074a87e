//! Post-processing pipeline.
//!
//! Stage every file of a download into the flat staging root, pick the extension groups
//! that are both wanted and present, run filebot once per group, then remove the staging
//! root. Any error stops the pipeline; the staging root is left in place for inspection.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, MediaCategory};
use crate::errors::{QbotError, Result};
use crate::filebot::{Filebot, RenameRequest, expand_wildcard, is_hidden};
use crate::fs_ops::{
    DestinationLayout, PlannedMove, RelocationReport, file_extension, match_allowlist,
    plan_relocation, relocate_tree, scan_extensions,
};
use crate::shutdown;

/// Result of one filebot call.
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    pub extension: String,
    pub files: usize,
    pub output: String,
}

/// What a completed run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub staged: RelocationReport,
    pub groups: Vec<GroupOutcome>,
    /// False when the staging root was intentionally kept.
    pub cleaned_up: bool,
}

/// What a run would do, computed without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct DryRunPlan {
    pub moves: Vec<PlannedMove>,
    pub extensions: Vec<String>,
    pub requests: Vec<RenameRequest>,
}

fn check_shutdown() -> Result<()> {
    if shutdown::is_requested() {
        warn!("shutdown requested; stopping before next phase");
        return Err(QbotError::Interrupted);
    }
    Ok(())
}

fn rename_request(
    cfg: &Config,
    category: MediaCategory,
    inputs: Vec<PathBuf>,
) -> RenameRequest {
    RenameRequest {
        inputs,
        output: category.output_root(&cfg.destination),
        query: cfg.query.clone(),
        format: category.naming_template().to_string(),
        db: category.database(),
        action: cfg.action,
        conflict: cfg.conflict,
        language: cfg.language.clone(),
        filter: cfg.filter.clone(),
    }
}

/// Run the full pipeline for one download.
pub fn run(cfg: &Config, source: &Path, category: MediaCategory) -> Result<RunSummary> {
    cfg.validate(source)?;
    check_shutdown()?;

    info!(
        source = %source.display(),
        category = %category,
        staging = %cfg.temp_root.display(),
        "Staging files"
    );
    fs::create_dir_all(&cfg.temp_root).map_err(|e| {
        QbotError::move_failed("create staging directory", source, &cfg.temp_root, e)
    })?;
    let staged = relocate_tree(source, &cfg.temp_root, &cfg.exclusions, DestinationLayout::Flat)?;
    let mut summary = RunSummary {
        staged,
        ..RunSummary::default()
    };
    check_shutdown()?;

    let present = scan_extensions(&cfg.temp_root)?;
    let wanted = match_allowlist(&cfg.extensions, &present);
    debug!(?present, ?wanted, "extension groups");

    // Expand every group before the first filebot call. A group whose files are all
    // hidden expands to nothing and is dropped, same as in `plan`.
    let mut groups = Vec::with_capacity(wanted.len());
    for ext in wanted {
        match expand_wildcard(&cfg.temp_root, &ext) {
            Ok(inputs) => groups.push((ext, inputs)),
            Err(QbotError::NoMatchingFiles { pattern }) => {
                debug!(%pattern, "only hidden files carry this extension; group skipped");
            }
            Err(e) => return Err(e),
        }
    }
    if groups.is_empty() {
        warn!(
            staging = %cfg.temp_root.display(),
            candidates = %cfg.extensions.join(","),
            "No candidate extension found among staged files; staging directory kept"
        );
        return Ok(summary);
    }

    let filebot = Filebot::new(&cfg.filebot_bin);
    for (ext, inputs) in groups {
        check_shutdown()?;
        let files = inputs.len();
        info!(extension = %ext, files, "Processing extension group");
        let output = filebot.rename(&rename_request(cfg, category, inputs))?;
        summary.groups.push(GroupOutcome {
            extension: ext,
            files,
            output,
        });
    }

    if cfg.action.keeps_staged_files() {
        info!(
            action = %cfg.action,
            staging = %cfg.temp_root.display(),
            "Staging directory kept for this action"
        );
        return Ok(summary);
    }

    fs::remove_dir_all(&cfg.temp_root).map_err(|e| QbotError::Cleanup {
        path: cfg.temp_root.clone(),
        source: e,
    })?;
    summary.cleaned_up = true;
    info!(staging = %cfg.temp_root.display(), "Cleaned up staging directory");
    Ok(summary)
}

/// Compute the moves and filebot calls `run` would perform.
pub fn plan(cfg: &Config, source: &Path, category: MediaCategory) -> Result<DryRunPlan> {
    cfg.validate(source)?;

    let moves = plan_relocation(source, &cfg.temp_root, &cfg.exclusions, DestinationLayout::Flat)?;
    let present: BTreeSet<String> = moves.iter().filter_map(|m| file_extension(&m.dest)).collect();
    let mut extensions = Vec::new();
    let mut requests = Vec::new();
    for ext in match_allowlist(&cfg.extensions, &present) {
        let mut inputs: Vec<PathBuf> = moves
            .iter()
            .filter(|m| file_extension(&m.dest).as_deref() == Some(ext.as_str()))
            .filter(|m| !is_hidden(&m.dest))
            .map(|m| m.dest.clone())
            .collect();
        if inputs.is_empty() {
            continue;
        }
        inputs.sort();
        requests.push(rename_request(cfg, category, inputs));
        extensions.push(ext);
    }

    Ok(DryRunPlan {
        moves,
        extensions,
        requests,
    })
}

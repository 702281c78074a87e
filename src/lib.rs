//! Core library for `qbot`, a qBittorrent post-processor.
//!
//! A completed download is staged into a flat scratch directory (moving across
//! filesystems when needed), filtered down to the wanted file extensions, and handed to
//! `filebot` once per extension group for renaming into a media library.
//!
//! The binary (`src/main.rs`) adds logging and signal handling; everything that touches
//! the filesystem lives here so it can be exercised directly from tests.

pub mod cli;
pub mod config;
pub mod errors;
pub mod filebot;
pub mod fs_ops;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod shutdown;

pub use config::{
    Config, LogLevel, MediaCategory, default_config_path, filter_from_tags, load_config,
    path_has_symlink_ancestor, validate_no_whitespace, validate_staging_root,
};
pub use errors::{QbotError, Result};
pub use filebot::{Action, Conflict, Database, Filebot, RenameRequest, expand_wildcard};
pub use fs_ops::{
    DestinationLayout, ExclusionSet, MoveOutcome, RelocationReport, match_allowlist, move_file,
    plan_relocation, relocate_tree, scan_extensions,
};
pub use pipeline::{DryRunPlan, RunSummary, plan, run};

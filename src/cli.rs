//! CLI definition and parsing.
//!
//! Typical qBittorrent "run external program on torrent finished" line:
//!
//! ```text
//! qbot "%F" "%L" -d /srv/plex -n "%N" -t "%G" --temp /srv/qbot-staging --log /var/log/qbot.log
//! ```
//!
//! Flags left unset fall back to the XML config file, then to built-in defaults.

use clap::{Parser, ValueHint};
use std::path::{Path, PathBuf};

use crate::config::types::parse_extension_list;
use crate::config::{Config, LogLevel, MediaCategory, filter_from_tags};
use crate::errors::Result;
use crate::filebot::{Action, Conflict};
use crate::fs_ops::ExclusionSet;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "qbot",
    author,
    version,
    about = "qBittorrent post-processing: stage a finished download and rename it with filebot"
)]
pub struct Args {
    /// Content path of the finished torrent (directory or single file).
    #[arg(
        value_name = "SOURCE_DIR",
        value_hint = ValueHint::AnyPath,
        required_unless_present = "print_config"
    )]
    pub source_dir: Option<PathBuf>,

    /// Media category: tv_show, anime or movie.
    #[arg(value_name = "MEDIA_CATEGORY", required_unless_present = "print_config")]
    pub category: Option<String>,

    /// Media library root containing TV-Show/Real, TV-Show/Anime and Movie [default: .]
    #[arg(short = 'd', long, value_hint = ValueHint::DirPath)]
    pub destination: Option<PathBuf>,

    /// Torrent name, passed to filebot as a search hint.
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Language of the media [default: en]
    #[arg(short = 'l', long)]
    pub language: Option<String>,

    /// filebot action: move, copy, symlink, hardlink, test [default: move]
    #[arg(short = 'a', long)]
    pub action: Option<String>,

    /// filebot conflict resolution: skip, replace, auto, index, fail [default: skip]
    #[arg(short = 'c', long)]
    pub conflict: Option<String>,

    /// Extensions to process, in preference order (comma separated) [default: mkv,mp4,avi,mov,rmvb]
    #[arg(short = 'e', long = "ext")]
    pub extensions: Option<String>,

    /// Path substrings to exclude from staging (comma separated), e.g. "sample,extras".
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,

    /// Staging directory; must not contain whitespace [default: .temp]
    #[arg(long = "temp", value_hint = ValueHint::DirPath)]
    pub temp_root: Option<PathBuf>,

    /// Append logs to this file in addition to stdout.
    #[arg(long = "log", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Torrent tags (comma separated). `filter:<expr>` sets a filebot filter.
    #[arg(short = 't', long)]
    pub tags: Option<String>,

    /// filebot executable [default: filebot]
    #[arg(long, value_hint = ValueHint::ExecutablePath)]
    pub filebot_bin: Option<PathBuf>,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(long, help = "Enable debug logging (shorthand for --log-level debug)")]
    pub debug: bool,

    /// Emit logs in structured JSON.
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,

    #[arg(
        long,
        help = "Show what would be staged and which filebot commands would run, without changing anything"
    )]
    pub dry_run: bool,

    #[arg(long, help = "Print the config file location used by qbot and exit")]
    pub print_config: bool,
}

impl Args {
    /// Source path with stray surrounding quotes and one trailing separator removed.
    pub fn resolved_source(&self) -> Option<PathBuf> {
        self.source_dir.as_deref().map(sanitize_path)
    }

    /// Parse the positional category.
    pub fn media_category(&self) -> Option<Result<MediaCategory>> {
        self.category.as_deref().map(|c| c.trim().parse())
    }

    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    /// Fails on unrecognized action/conflict names and malformed tags.
    pub fn apply_overrides(&self, cfg: &mut Config) -> Result<()> {
        if let Some(d) = &self.destination {
            cfg.destination = sanitize_path(d);
        }
        if let Some(n) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            cfg.query = Some(n.to_string());
        }
        if let Some(l) = &self.language {
            cfg.language = l.trim().to_string();
        }
        if let Some(a) = &self.action {
            cfg.action = a.trim().parse::<Action>()?;
        }
        if let Some(c) = &self.conflict {
            cfg.conflict = c.trim().parse::<Conflict>()?;
        }
        if let Some(e) = &self.extensions {
            cfg.extensions = parse_extension_list(e);
        }
        if let Some(x) = &self.exclude {
            cfg.exclusions = ExclusionSet::from_csv(x);
        }
        if let Some(t) = &self.temp_root {
            cfg.temp_root = t.clone();
        }
        if let Some(f) = &self.log_file {
            cfg.log_file = Some(f.clone());
        }
        if let Some(tags) = &self.tags {
            cfg.filter = filter_from_tags(tags)?;
        }
        if let Some(bin) = &self.filebot_bin {
            cfg.filebot_bin = bin.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        Ok(())
    }
}

/// Trim surrounding matching quotes (left behind by some shells and by Windows
/// launchers) and one trailing separator. Interior characters are kept as-is.
fn sanitize_path(p: &Path) -> PathBuf {
    let s = p.to_string_lossy();
    let trimmed = s.trim();
    let mut inner = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        return p.to_path_buf();
    };
    if inner.len() > 1 && (inner.ends_with('/') || inner.ends_with('\\')) {
        inner.pop();
    }
    PathBuf::from(inner)
}

pub fn parse() -> Args {
    Args::parse()
}

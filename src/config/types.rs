//! Core configuration types.
//! - Config holds runtime settings with sensible defaults; built once at startup.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::filebot::{Action, Conflict};
use crate::fs_ops::{ExclusionSet, normalize_extension};

use super::{
    DEFAULT_DESTINATION, DEFAULT_EXTENSIONS, DEFAULT_FILEBOT_BIN, DEFAULT_LANGUAGE,
    DEFAULT_TEMP_ROOT,
};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one post-processing run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Media library root; category subroots live below it
    pub destination: PathBuf,
    /// Search hint passed to filebot (usually the torrent name)
    pub query: Option<String>,
    /// Language code for metadata lookup
    pub language: String,
    pub action: Action,
    pub conflict: Conflict,
    /// Candidate extensions in preference order
    pub extensions: Vec<String>,
    /// Substrings excluding files from staging
    pub exclusions: ExclusionSet,
    /// Scratch directory files are flattened into
    pub temp_root: PathBuf,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Advanced filebot filter (from a `filter:` tag)
    pub filter: Option<String>,
    /// filebot executable (name on PATH or absolute path)
    pub filebot_bin: PathBuf,
    /// If true, log the plan but do not modify the filesystem or run filebot
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destination: PathBuf::from(DEFAULT_DESTINATION),
            query: None,
            language: DEFAULT_LANGUAGE.to_string(),
            action: Action::default(),
            conflict: Conflict::default(),
            extensions: parse_extension_list(DEFAULT_EXTENSIONS),
            exclusions: ExclusionSet::default(),
            temp_root: PathBuf::from(DEFAULT_TEMP_ROOT),
            log_level: LogLevel::Normal,
            log_file: None,
            filter: None,
            filebot_bin: PathBuf::from(DEFAULT_FILEBOT_BIN),
            dry_run: false,
        }
    }
}

/// Split a comma-separated extension list, normalizing and dropping empty entries.
pub fn parse_extension_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(normalize_extension)
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.extensions, ["mkv", "mp4", "avi", "mov", "rmvb"]);
        assert_eq!(cfg.language, "en");
        assert_eq!(cfg.action, Action::Move);
        assert_eq!(cfg.conflict, Conflict::Skip);
        assert_eq!(cfg.temp_root, PathBuf::from(".temp"));
        assert!(cfg.exclusions.is_empty());
    }

    #[test]
    fn extension_list_is_normalized() {
        assert_eq!(parse_extension_list(" .MKV, mp4,,"), ["mkv", "mp4"]);
    }

    #[test]
    fn log_level_round_trip_names() {
        assert_eq!("verbose".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert!("loud".parse::<LogLevel>().is_err());
    }
}

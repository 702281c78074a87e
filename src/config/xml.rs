//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - `$QBOT_CONFIG` names an explicit file that must exist; a missing default file is
//!   not an error.
//!
//! Unknown XML fields fail the load so typos surface instead of being silently ignored.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::default_config_path;
use super::types::{Config, LogLevel, parse_extension_list};
use crate::filebot::{Action, Conflict};
use crate::fs_ops::{ExclusionSet, io_error_with_help};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    destination: Option<String>,
    temp_root: Option<String>,
    language: Option<String>,
    action: Option<String>,
    conflict: Option<String>,
    extensions: Option<String>,
    exclude: Option<String>,
    log_file: Option<String>,
    log_level: Option<String>,
    filebot_bin: Option<String>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// Map XmlConfig -> Config, starting from defaults.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = non_empty(parsed.destination.as_deref()) {
        cfg.destination = PathBuf::from(s);
    }
    if let Some(s) = non_empty(parsed.temp_root.as_deref()) {
        cfg.temp_root = PathBuf::from(s);
    }
    if let Some(s) = non_empty(parsed.language.as_deref()) {
        cfg.language = s.to_string();
    }
    if let Some(s) = non_empty(parsed.action.as_deref()) {
        cfg.action = s.parse::<Action>()?;
    }
    if let Some(s) = non_empty(parsed.conflict.as_deref()) {
        cfg.conflict = s.parse::<Conflict>()?;
    }
    if let Some(s) = non_empty(parsed.extensions.as_deref()) {
        cfg.extensions = parse_extension_list(s);
    }
    if let Some(s) = non_empty(parsed.exclude.as_deref()) {
        cfg.exclusions = ExclusionSet::from_csv(s);
    }
    if let Some(s) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(s));
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!("config log_level: {e}"))?;
    }
    if let Some(s) = non_empty(parsed.filebot_bin.as_deref()) {
        cfg.filebot_bin = PathBuf::from(s);
    }

    Ok(cfg)
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).map_err(io_error_with_help("read config xml", path))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in '{}'", path.display()))
}

/// Load the config file if one applies.
///
/// Returns `Ok(None)` when no explicit path is set and the default file does not exist.
pub fn load_config() -> Result<Option<(Config, PathBuf)>> {
    let Some((path, explicit)) = default_config_path() else {
        debug!("no config directory available; using defaults");
        return Ok(None);
    };
    if !explicit && !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(None);
    }
    let cfg = load_config_from_xml_path(&path)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(Some((cfg, path)))
}

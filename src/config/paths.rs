//! Default path helpers and symlink checks.

use dirs::config_dir;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

/// Config file location: `$QBOT_CONFIG` when set, else `<config dir>/qbot/config.xml`.
/// The second element is true when the path came from the environment.
pub fn default_config_path() -> Option<(PathBuf, bool)> {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some((PathBuf::from(p), true));
    }
    if let Some(mut base) = config_dir() {
        base.push("qbot");
        base.push("config.xml");
        Some((base, false))
    } else {
        env::var_os("HOME").map(|h| {
            (
                PathBuf::from(h).join(".config").join("qbot").join("config.xml"),
                false,
            )
        })
    }
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.as_os_str().is_empty() {
            break;
        }
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        p = anc.parent();
    }
    Ok(false)
}

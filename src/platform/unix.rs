//! Unix implementation of the secure log-file open.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;

/// Open the log file for appending; 0600 only when the file is created here.
/// An existing file keeps its mode (e.g. group-readable for log shipping).
/// The final component is opened with O_NOFOLLOW.
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let existed = path.exists();
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .custom_flags(libc::O_NOFOLLOW)
        .open(path)?;
    if !existed {
        // umask may have narrowed the create mode further; pin it.
        f.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    Ok(f)
}

//! Metadata preservation for the copy fallback.
//! - Permission bits (mode on Unix, readonly on Windows): failures are fatal.
//! - Timestamps (atime, mtime): best-effort, failures are logged and ignored.
//! - Extended attributes (feature "xattrs"): best-effort.

use filetime::{FileTime, set_file_times};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{trace, warn};

/// Copy the permission bits of `src_meta` onto `dest`.
pub(super) fn copy_permissions(dest: &Path, src_meta: &fs::Metadata) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let src_mode = src_meta.permissions().mode() & 0o7777;
        fs::set_permissions(dest, fs::Permissions::from_mode(src_mode))?;
        trace!(path = %dest.display(), mode = format!("{:o}", src_mode), "set permissions on destination");
    }
    #[cfg(windows)]
    {
        let ro = src_meta.permissions().readonly();
        let mut perms = fs::metadata(dest)?.permissions();
        perms.set_readonly(ro);
        fs::set_permissions(dest, perms)?;
        trace!(path = %dest.display(), readonly = ro, "set readonly attribute on destination");
    }
    Ok(())
}

/// Mirror access/modification times from `src_meta` onto `dest` (best-effort).
pub(super) fn copy_times(dest: &Path, src_meta: &fs::Metadata) {
    let at = FileTime::from_last_access_time(src_meta);
    let mt = FileTime::from_last_modification_time(src_meta);
    if let Err(e) = set_file_times(dest, at, mt) {
        warn!(path = %dest.display(), error = %e, "failed to set atime/mtime on destination");
    } else {
        trace!(path = %dest.display(), "set atime/mtime on destination");
    }
}

/// Copy extended attributes from `src` to `dest` when built with the "xattrs" feature.
pub(super) fn copy_xattrs(src: &Path, dest: &Path) {
    #[cfg(feature = "xattrs")]
    {
        let names = match xattr::list(src) {
            Ok(names) => names,
            Err(e) => {
                warn!(src = %src.display(), error = %e, "failed to list xattrs; continuing");
                return;
            }
        };
        for name in names {
            let name_disp = name.to_string_lossy().into_owned();
            match xattr::get(src, &name) {
                Ok(value) => {
                    let value = value.unwrap_or_default();
                    if let Err(e) = xattr::set(dest, &name, &value) {
                        warn!(dest = %dest.display(), xattr = %name_disp, error = %e, "failed to set xattr on destination");
                    } else {
                        trace!(dest = %dest.display(), xattr = %name_disp, size = value.len(), "preserved xattr");
                    }
                }
                Err(e) => {
                    warn!(src = %src.display(), xattr = %name_disp, error = %e, "failed to read xattr value from source");
                }
            }
        }
    }
    #[cfg(not(feature = "xattrs"))]
    {
        let _ = (src, dest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    #[test]
    fn permissions_are_mirrored() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.mkv");
        let dst = dir.path().join("b.mkv");
        fs::write(&src, b"x").unwrap();
        fs::write(&dst, b"x").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o640)).unwrap();

        copy_permissions(&dst, &fs::metadata(&src).unwrap()).unwrap();
        let mode = fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn mtime_is_mirrored() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.mkv");
        let dst = dir.path().join("b.mkv");
        fs::write(&src, b"x").unwrap();
        fs::write(&dst, b"x").unwrap();
        let ts = FileTime::from_unix_time(1_700_000_000, 0);
        filetime::set_file_mtime(&src, ts).unwrap();

        copy_times(&dst, &fs::metadata(&src).unwrap());
        let got = FileTime::from_last_modification_time(&fs::metadata(&dst).unwrap());
        assert_eq!(got.unix_seconds(), ts.unix_seconds());
    }
}

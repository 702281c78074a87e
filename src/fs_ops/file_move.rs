//! Single-file move.
//! Attempts an atomic rename; only a cross-device failure falls back to a durable
//! copy (open, create, stream, fsync, chmod) followed by removal of the source.
//!
//! The source is never removed unless the destination holds a complete, synced copy.
//! Any failure before that point leaves the source untouched and discards the partial
//! destination (best-effort).

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::errors::{QbotError, Result};

use super::io_copy::copy_streaming;
use super::metadata::{copy_permissions, copy_times, copy_xattrs};
use super::space::ensure_space_for_copy;
use super::util::{fsync_dir, is_cross_device};

/// How a successful move was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Same-volume atomic rename.
    Renamed,
    /// Cross-volume copy + fsync + remove.
    Copied { bytes: u64 },
}

/// Move `src` to `dest`, creating the destination's parent directories as needed.
///
/// Refuses to overwrite an existing destination (`QbotError::DestinationExists`).
pub fn move_file(src: &Path, dest: &Path) -> Result<MoveOutcome> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| QbotError::move_failed("create destination directory", src, parent, e))?;
    }

    if fs::symlink_metadata(dest).is_ok() {
        return Err(QbotError::DestinationExists {
            path: dest.to_path_buf(),
        });
    }

    match fs::rename(src, dest) {
        Ok(()) => {
            if let Some(parent) = dest.parent() {
                // The rename already happened; a failed dir fsync must not turn it into an error.
                let _ = fsync_dir(parent);
            }
            debug!(src = %src.display(), dest = %dest.display(), "Renamed file atomically");
            Ok(MoveOutcome::Renamed)
        }
        Err(e) if is_cross_device(&e) => {
            debug!(src = %src.display(), dest = %dest.display(), "cross-device rename; copying instead");
            let bytes = copy_then_remove(src, dest)?;
            Ok(MoveOutcome::Copied { bytes })
        }
        Err(e) => Err(QbotError::move_failed("rename", src, dest, e)),
    }
}

/// Cross-volume fallback: durable copy of `src` to a new `dest`, then remove `src`.
/// Returns the number of bytes copied.
pub fn copy_then_remove(src: &Path, dest: &Path) -> Result<u64> {
    copy_then_remove_with(src, dest, write_durable_copy)
}

/// Signature of the step that fills, syncs and chmods a freshly created destination.
type WriteCopy = fn(&Path, &Path, fs::File, fs::File, &fs::Metadata) -> Result<u64>;

fn copy_then_remove_with(src: &Path, dest: &Path, write: WriteCopy) -> Result<u64> {
    let src_meta =
        fs::metadata(src).map_err(|e| QbotError::move_failed("stat source file", src, dest, e))?;
    if !src_meta.is_file() {
        return Err(QbotError::move_failed(
            "copy",
            src,
            dest,
            io::Error::new(io::ErrorKind::InvalidInput, "source is not a regular file"),
        ));
    }
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_space_for_copy(parent, src_meta.len())?;
    }

    let input =
        fs::File::open(src).map_err(|e| QbotError::move_failed("open source file", src, dest, e))?;
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| QbotError::move_failed("create destination file", src, dest, e))?;

    // From here on `dest` is ours; discard it on any failure.
    let bytes = match write(src, dest, input, output, &src_meta) {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(dest) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(dest = %dest.display(), error = %cleanup, "failed to discard partial destination");
                }
            }
            return Err(e);
        }
    };

    copy_times(dest, &src_meta);
    copy_xattrs(src, dest);
    if let Some(parent) = dest.parent() {
        let _ = fsync_dir(parent);
    }

    fs::remove_file(src).map_err(|e| QbotError::move_failed("remove source file", src, dest, e))?;
    info!(src = %src.display(), dest = %dest.display(), bytes, "Copied file across devices and removed source");
    Ok(bytes)
}

/// Stream, fsync and chmod. Both handles are dropped before the chmod.
fn write_durable_copy(
    src: &Path,
    dest: &Path,
    mut input: fs::File,
    mut output: fs::File,
    src_meta: &fs::Metadata,
) -> Result<u64> {
    let bytes = copy_streaming(&mut input, &mut output)
        .map_err(|e| QbotError::move_failed("copy file contents", src, dest, e))?;
    output
        .sync_all()
        .map_err(|e| QbotError::move_failed("sync destination file", src, dest, e))?;
    drop(output);
    drop(input);

    if bytes != src_meta.len() {
        return Err(QbotError::move_failed(
            "copy file contents",
            src,
            dest,
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("copied {} of {} bytes; source changed during copy", bytes, src_meta.len()),
            ),
        ));
    }

    copy_permissions(dest, src_meta)
        .map_err(|e| QbotError::move_failed("set permissions on destination", src, dest, e))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rename_within_volume() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("ep01.mkv");
        let dest = dir.path().join("staging").join("ep01.mkv");
        fs::write(&src, b"frames").unwrap();

        let outcome = move_file(&src, &dest).unwrap();
        assert_eq!(outcome, MoveOutcome::Renamed);
        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"frames");
    }

    #[test]
    fn refuses_to_overwrite_existing_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.mkv");
        let dest = dir.path().join("b.mkv");
        fs::write(&src, b"new").unwrap();
        fs::write(&dest, b"old").unwrap();

        let err = move_file(&src, &dest).unwrap_err();
        assert!(matches!(err, QbotError::DestinationExists { .. }));
        assert_eq!(fs::read(&src).unwrap(), b"new");
        assert_eq!(fs::read(&dest).unwrap(), b"old");
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("gone.mkv");
        let dest = dir.path().join("out").join("gone.mkv");
        let err = move_file(&src, &dest).unwrap_err();
        assert!(matches!(err, QbotError::Move { op: "rename", .. }), "got {err:?}");
    }

    #[test]
    fn copy_fallback_round_trips_zero_bytes() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("empty.nfo");
        let dest = dir.path().join("out").join("empty.nfo");
        fs::write(&src, b"").unwrap();
        fs::create_dir_all(dest.parent().unwrap()).unwrap();

        let n = copy_then_remove(&src, &dest).unwrap();
        assert_eq!(n, 0);
        assert!(!src.exists());
        assert_eq!(fs::metadata(&dest).unwrap().len(), 0);
    }

    #[test]
    fn copy_fallback_leaves_source_when_create_fails() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("keep.mkv");
        fs::write(&src, b"precious").unwrap();
        // Parent is a regular file, so creating the destination cannot succeed.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let dest = blocker.join("keep.mkv");

        let err = copy_then_remove(&src, &dest).unwrap_err();
        assert!(matches!(err, QbotError::Move { .. }), "got {err:?}");
        assert_eq!(fs::read(&src).unwrap(), b"precious");
    }

    /// Writes half the source, then fails as a full disk would.
    fn fail_mid_copy(
        src: &Path,
        dest: &Path,
        mut input: fs::File,
        mut output: fs::File,
        src_meta: &fs::Metadata,
    ) -> Result<u64> {
        use std::io::{Read, Write};
        let mut half = vec![0u8; (src_meta.len() / 2) as usize];
        input.read_exact(&mut half).unwrap();
        output.write_all(&half).unwrap();
        Err(QbotError::move_failed(
            "copy file contents",
            src,
            dest,
            io::Error::new(io::ErrorKind::StorageFull, "no space left on device"),
        ))
    }

    /// Copies everything, then fails the durability flush.
    fn fail_at_sync(
        src: &Path,
        dest: &Path,
        mut input: fs::File,
        mut output: fs::File,
        _src_meta: &fs::Metadata,
    ) -> Result<u64> {
        io::copy(&mut input, &mut output).unwrap();
        Err(QbotError::move_failed(
            "sync destination file",
            src,
            dest,
            io::Error::other("input/output error"),
        ))
    }

    fn assert_failed_copy_keeps_source(write: WriteCopy, op: &str) {
        let dir = tempdir().unwrap();
        let src = dir.path().join("episode.mkv");
        let dest = dir.path().join("out").join("episode.mkv");
        fs::write(&src, b"0123456789abcdef").unwrap();
        fs::create_dir_all(dest.parent().unwrap()).unwrap();

        let err = copy_then_remove_with(&src, &dest, write).unwrap_err();
        match &err {
            QbotError::Move { op: failed, .. } => assert_eq!(*failed, op),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read(&src).unwrap(), b"0123456789abcdef");
        assert!(!dest.exists(), "partial destination should be discarded");
    }

    #[test]
    fn copy_failure_midway_keeps_source_and_discards_partial_dest() {
        assert_failed_copy_keeps_source(fail_mid_copy, "copy file contents");
    }

    #[test]
    fn sync_failure_keeps_source_and_discards_dest() {
        assert_failed_copy_keeps_source(fail_at_sync, "sync destination file");
    }
}

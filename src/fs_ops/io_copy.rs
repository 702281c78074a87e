//! Streaming copy between two open file handles.
//!
//! - Buffered I/O with large (1 MiB) buffers to reduce syscall count.
//! - On Linux, tries `copy_file_range` first for an in-kernel copy and falls back to
//!   buffered streaming when the kernel or filesystem does not support it.
//! - Does NOT fsync; the caller owns the durability step so it can report it separately.
//!
//! Snapshot semantics: the source is read once from its current offset to EOF; if it
//! grows concurrently the additional bytes are not included.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

pub(super) const BUF_SIZE: usize = 1024 * 1024; // 1 MiB buffers

/// Copy every remaining byte of `src` into `dst`. Returns the number of bytes written.
pub(super) fn copy_streaming(src: &mut File, dst: &mut File) -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        if let Some(bytes) = copy_in_kernel(src, dst)? {
            return Ok(bytes);
        }
    }

    let mut reader = BufReader::with_capacity(BUF_SIZE, src);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(bytes)
}

/// Returns Ok(None) when copy_file_range is unsupported and nothing was copied yet.
#[cfg(target_os = "linux")]
fn copy_in_kernel(src: &File, dst: &File) -> io::Result<Option<u64>> {
    use std::os::unix::io::AsRawFd;

    let chunk: usize = 16 * 1024 * 1024; // 16 MiB per call
    let mut total: u64 = 0;
    loop {
        let rc = unsafe {
            libc::copy_file_range(
                src.as_raw_fd(),
                std::ptr::null_mut(),
                dst.as_raw_fd(),
                std::ptr::null_mut(),
                chunk,
                0,
            )
        };
        if rc > 0 {
            total += rc as u64;
            continue;
        }
        if rc == 0 {
            return Ok(Some(total));
        }

        let err = io::Error::last_os_error();
        let unsupported = matches!(
            err.raw_os_error(),
            Some(code) if code == libc::EXDEV
                || code == libc::ENOSYS
                || code == libc::EINVAL
                || code == libc::EPERM
                || code == libc::EOPNOTSUPP
        );
        if total == 0 && unsupported {
            return Ok(None);
        }
        // Partial copy then error: the caller discards the destination.
        return Err(err);
    }
}

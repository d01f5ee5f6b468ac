//! Filesystem helpers: free-space queries and temp artifact naming

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Ensure at least `min_free` bytes are available under `dir`
///
/// If `dir` does not exist yet its parent is checked instead.
///
/// # Errors
///
/// [`Error::InsufficientStorage`] when less than `min_free` bytes are free,
/// [`Error::DiskSpaceCheckFailed`] when the filesystem cannot be queried.
pub fn check_free_space(dir: &Path, min_free: u64) -> Result<u64> {
    let check_path = if dir.exists() {
        dir
    } else {
        dir.parent().ok_or_else(|| {
            Error::DiskSpaceCheckFailed(format!(
                "Cannot determine parent directory of '{}'",
                dir.display()
            ))
        })?
    };

    let available = get_available_space(check_path).map_err(|e| {
        Error::DiskSpaceCheckFailed(format!(
            "Failed to query free space for '{}': {}",
            check_path.display(),
            e
        ))
    })?;

    if available < min_free {
        return Err(Error::InsufficientStorage {
            required: min_free,
            available,
        });
    }
    Ok(available)
}

/// Fresh, unpredictable temp artifact path inside `dir`
pub fn temp_artifact_path(dir: &Path) -> PathBuf {
    dir.join(format!("download_{:016x}.part", rand::random::<u64>()))
}

/// Bytes available to unprivileged users on the filesystem holding `path`
///
/// `statvfs` on Unix, `GetDiskFreeSpaceExW` on Windows.
pub fn get_available_space(path: &Path) -> std::io::Result<u64> {
    #[cfg(unix)]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        // SAFETY: c_path is NUL-terminated and stat is only read after a
        // successful call
        unsafe {
            let mut stat: libc::statvfs = std::mem::zeroed();
            if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
                return Err(std::io::Error::last_os_error());
            }

            // f_frsize, not f_bsize, is the unit of f_bavail
            Ok(stat.f_bavail.saturating_mul(stat.f_frsize))
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        use winapi::um::fileapi::GetDiskFreeSpaceExW;

        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        // SAFETY: wide_path is NUL-terminated and the outputs are only read
        // after a successful call
        unsafe {
            let mut available: u64 = 0;
            let mut total: u64 = 0;
            let mut free: u64 = 0;

            if GetDiskFreeSpaceExW(
                wide_path.as_ptr(),
                &mut available as *mut u64 as *mut _,
                &mut total as *mut u64 as *mut _,
                &mut free as *mut u64 as *mut _,
            ) == 0
            {
                return Err(std::io::Error::last_os_error());
            }

            Ok(available)
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = path;
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "free space query not supported on this platform",
        ))
    }
}

//! Machine-wide single-instance gate.
//!
//! Every invocation locks the same well-known file with an exclusive advisory
//! lock (`flock` on Unix, `LockFileEx` on Windows). The operating system drops
//! the lock when the holding process exits for any reason, so a crashed or
//! killed holder never leaves waiters stuck. Which waiter gets the lock next
//! is up to the OS.
//!
//! The lock file itself is never deleted: removing it while another process
//! waits on the old inode would let two holders run at once.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("cannot open instance lock file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot lock instance lock file {}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ownership of the instance gate. Dropping it releases the lock as well.
#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
    path: PathBuf,
}

impl InstanceGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Explicit release at the end of a run.
    pub fn release(self) -> Result<(), GateError> {
        let res = FileExt::unlock(&self.file).map_err(|source| GateError::Lock {
            path: self.path.clone(),
            source,
        });
        tracing::debug!(path = %self.path.display(), "instance gate released");
        res
    }
}

/// Opens the lock file for locking. Another user may own it, so fall back to
/// read-only access; an advisory lock does not need write permission on Unix.
fn open_lock_file(path: &Path) -> Result<File, GateError> {
    let opened = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path);
    let opened = match opened {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => File::open(path),
        other => other,
    };
    opened.map_err(|source| GateError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Takes the gate without blocking. `Ok(None)` means another holder has it.
pub fn try_acquire(path: &Path) -> Result<Option<InstanceGuard>, GateError> {
    let file = open_lock_file(path)?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(InstanceGuard {
            file,
            path: path.to_path_buf(),
        })),
        Err(e) if is_contended(&e) => Ok(None),
        Err(source) => Err(GateError::Lock {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Blocks until this process is the sole holder of the gate at `path`.
///
/// Acquisition is immediate when nobody holds the gate. Otherwise `on_wait` is
/// called once and the call blocks with no timeout until the holder releases
/// the lock or exits.
pub fn acquire<W>(path: &Path, on_wait: W) -> Result<InstanceGuard, GateError>
where
    W: FnOnce(),
{
    if let Some(guard) = try_acquire(path)? {
        tracing::debug!(path = %path.display(), "instance gate acquired");
        return Ok(guard);
    }

    tracing::info!(path = %path.display(), "another instance is running, waiting");
    on_wait();

    let file = open_lock_file(path)?;
    file.lock_exclusive().map_err(|source| GateError::Lock {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "instance gate acquired after wait");
    Ok(InstanceGuard {
        file,
        path: path.to_path_buf(),
    })
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

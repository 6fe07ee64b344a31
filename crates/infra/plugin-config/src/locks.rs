//! Write lock spanning both config files.
//!
//! A [`ConfigLock`] serialises threads of one process through a mutex, then
//! takes an advisory fs4 lock on each data file's sibling `.lock` file. The
//! two file locks are acquired primary first and behave as one unit: if the
//! secondary cannot be locked the primary is released again.
//!
//! The returned [`LockGuard`] is the capability every persist call requires.
//! Dropping it releases the secondary lock, then the primary lock, then the
//! mutex.

use fs4::fs_std::FileExt;
use parking_lot::{Mutex, MutexGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{ConfigError, Result};
use crate::paths::ConfigPaths;

/// Default bound on the time spent waiting for the lock pair.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const POLL_START: Duration = Duration::from_millis(5);
const POLL_MAX: Duration = Duration::from_millis(100);

/// In-process mutex plus the cross-process lock file pair.
#[derive(Debug)]
pub struct ConfigLock {
    primary: PathBuf,
    secondary: PathBuf,
    timeout: Duration,
    mutex: Mutex<()>,
}

impl ConfigLock {
    pub fn new(paths: &ConfigPaths, timeout: Duration) -> Self {
        Self {
            primary: paths.main_lock(),
            secondary: paths.next_gen_lock(),
            timeout,
            mutex: Mutex::new(()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether some thread of this process currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }

    /// Block until both files are locked or the timeout elapses.
    ///
    /// Both failure modes are fatal (see [`ConfigError::is_fatal`]).
    pub fn acquire(&self) -> Result<LockGuard<'_>> {
        let deadline = Instant::now() + self.timeout;

        let Some(mutex) = self.mutex.try_lock_for(self.timeout) else {
            return Err(self.timed_out(&self.primary));
        };
        tracing::debug!("acquiring config lock {}", self.primary.display());

        let primary = FileLock::acquire(&self.primary, deadline)?
            .ok_or_else(|| self.timed_out(&self.primary))?;

        let secondary = if self.secondary == self.primary {
            None
        } else {
            match FileLock::acquire(&self.secondary, deadline) {
                Ok(Some(lock)) => Some(lock),
                Ok(None) => {
                    tracing::debug!("rolling back {}", self.primary.display());
                    return Err(self.timed_out(&self.secondary));
                }
                Err(e) => {
                    tracing::debug!("rolling back {}", self.primary.display());
                    return Err(e);
                }
            }
        };

        tracing::debug!("config lock acquired");
        Ok(LockGuard {
            secondary,
            primary,
            _mutex: mutex,
        })
    }

    fn timed_out(&self, path: &Path) -> ConfigError {
        ConfigError::LockTimeout {
            path: path.to_path_buf(),
            timeout_secs: self.timeout.as_secs(),
        }
    }
}

/// Held lock pair. Field order is release order.
#[must_use = "the config lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    secondary: Option<FileLock>,
    primary: FileLock,
    _mutex: MutexGuard<'a, ()>,
}

impl LockGuard<'_> {
    /// Release explicitly. Equivalent to dropping the guard.
    pub fn release(self) {}

    pub fn primary_path(&self) -> &Path {
        &self.primary.path
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        tracing::debug!("releasing config lock {}", self.primary.path.display());
    }
}

impl std::fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("primary", &self.primary.path)
            .field("secondary", &self.secondary.as_ref().map(|l| &l.path))
            .finish()
    }
}

/// RAII advisory lock on a single file. Closing the handle releases it.
struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    /// Poll for an exclusive lock until `deadline`. `Ok(None)` on timeout.
    fn acquire(path: &Path, deadline: Instant) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| lock_error(path, e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| lock_error(path, e))?;

        let mut delay = POLL_START;
        loop {
            match file.try_lock_exclusive() {
                Ok(true) => {
                    return Ok(Some(Self {
                        _file: file,
                        path: path.to_path_buf(),
                    }));
                }
                Ok(false) => {}
                Err(e) => return Err(lock_error(path, e)),
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            std::thread::sleep(delay.min(deadline - now));
            delay = (delay * 2).min(POLL_MAX);
        }
    }
}

fn lock_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::Lock {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn lock_in(dir: &TempDir, timeout: Duration) -> ConfigLock {
        ConfigLock::new(&ConfigPaths::in_dir(dir.path()), timeout)
    }

    #[test]
    fn test_acquire_creates_both_lock_files() {
        let dir = TempDir::new().unwrap();
        let lock = lock_in(&dir, Duration::from_secs(1));
        let guard = lock.acquire().unwrap();
        assert!(dir.path().join("config.yaml.lock").exists());
        assert!(dir.path().join("config-ng.yaml.lock").exists());
        assert!(lock.is_locked());
        guard.release();
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_lock_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("dirs");
        let lock = ConfigLock::new(&ConfigPaths::in_dir(&nested), Duration::from_secs(1));
        let _guard = lock.acquire().unwrap();
        assert!(nested.join("config.yaml.lock").exists());
    }

    #[test]
    fn test_second_instance_times_out_while_held() {
        let dir = TempDir::new().unwrap();
        let holder = lock_in(&dir, Duration::from_secs(5));
        let _guard = holder.acquire().unwrap();

        // A separate instance opens its own file handles, like another process.
        let other = lock_in(&dir, Duration::from_millis(150));
        let err = other.acquire().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, ConfigError::LockTimeout { .. }));
    }

    #[test]
    fn test_secondary_failure_rolls_back_primary() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(dir.path());

        let blocker = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(paths.next_gen_lock())
            .unwrap();
        assert!(blocker.try_lock_exclusive().unwrap());

        let lock = ConfigLock::new(&paths, Duration::from_millis(100));
        let err = lock.acquire().unwrap_err();
        assert!(matches!(err, ConfigError::LockTimeout { ref path, .. } if *path == paths.next_gen_lock()));

        let probe = File::open(paths.main_lock()).unwrap();
        assert!(probe.try_lock_exclusive().unwrap(), "primary lock was not rolled back");
    }

    #[test]
    fn test_same_file_for_both_documents() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("only.yaml");
        let paths = ConfigPaths {
            main: file.clone(),
            next_gen: file,
            metadata: dir.path().join("meta.yaml"),
        };
        let lock = ConfigLock::new(&paths, Duration::from_millis(200));
        let _guard = lock.acquire().unwrap();
    }

    #[test]
    fn test_concurrent_writers_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let lock = Arc::new(lock_in(&dir, Duration::from_secs(30)));
        let data = dir.path().join("data.txt");
        std::fs::write(&data, "0").unwrap();
        let inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let lock = Arc::clone(&lock);
                let data = data.clone();
                let inside = Arc::clone(&inside);
                std::thread::spawn(move || {
                    let _guard = lock.acquire().unwrap();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);

                    let before = std::fs::read_to_string(&data).unwrap();
                    let marker = format!("{before}-{i}");
                    std::fs::write(&data, &marker).unwrap();
                    std::thread::sleep(Duration::from_millis(30));
                    assert_eq!(std::fs::read_to_string(&data).unwrap(), marker);

                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let last = std::fs::read_to_string(&data).unwrap();
        assert_eq!(last.split('-').count(), 5);
    }
}

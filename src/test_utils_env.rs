//! Environment helpers for tests that exercise `SQI_*` layering.
//!
//! Every mutation takes one process-wide lock. Callers still mark their
//! tests `#[serial]`, since configuration loading reads the environment
//! without it.

use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn locked<T>(op: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    op()
}

/// Set `key` to `value` for the rest of the test.
pub fn set_var(key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) {
    // SAFETY: writers are serialised by `ENV_LOCK` and tests using this are
    // `#[serial]`.
    locked(|| unsafe { std::env::set_var(key, value) });
}

/// Unset `key` for the rest of the test.
pub fn remove_var(key: impl AsRef<OsStr>) {
    // SAFETY: as for `set_var`.
    locked(|| unsafe { std::env::remove_var(key) });
}

/// Clears a set of variables and puts their old values back on drop.
///
/// # Examples
///
/// ```
/// use sqi::test_utils::{EnvGuard, set_var};
///
/// {
///     let _guard = EnvGuard::new(&["SQI_DOC_EXAMPLE"]);
///     set_var("SQI_DOC_EXAMPLE", "temporary");
/// }
/// assert!(std::env::var("SQI_DOC_EXAMPLE").is_err());
/// ```
pub struct EnvGuard {
    saved: Vec<(OsString, Option<OsString>)>,
}

impl EnvGuard {
    #[must_use]
    pub fn new(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| {
                let previous = locked(|| std::env::var_os(key));
                remove_var(key);
                (OsString::from(key), previous)
            })
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..) {
            match previous {
                Some(value) => set_var(&key, value),
                None => remove_var(&key),
            }
        }
    }
}

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::types::Cleanup;
use crate::types::CleanupFn;
use crate::types::Logger;
use crate::types::Terminator;

/// A named test scope: the handle the helpers in this crate hang off.
///
/// Registered cleanups run in reverse order when the scope is dropped,
/// including while unwinding from a failed assertion.
///
/// ```
/// use testthings::TestScope;
///
/// let t = TestScope::new("outer");
/// t.run("inner", |t| {
///     assert_eq!(t.name(), "outer/inner");
/// });
/// ```
pub struct TestScope {
    name: String,
    cleanups: Mutex<Vec<CleanupFn>>,
    failed: AtomicBool,
}

impl TestScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cleanups: Mutex::new(Vec::new()),
            failed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`Terminator::fatal`] was called on this scope or one of its
    /// completed children.
    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Run `f` in a child scope named `{parent}/{name}`.
    ///
    /// The child's cleanups have run by the time this returns. A failure or
    /// panic in the child marks this scope failed before unwinding further.
    pub fn run<R>(&self, name: &str, f: impl FnOnce(&TestScope) -> R) -> R {
        let child = TestScope::new(format!("{}/{name}", self.name));
        let out = std::panic::catch_unwind(AssertUnwindSafe(|| f(&child)));
        if out.is_err() || child.failed() {
            self.failed.store(true, Ordering::SeqCst);
        }
        drop(child);
        match out {
            Ok(out) => out,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    /// Create a temporary directory that is removed when the scope ends.
    #[track_caller]
    pub fn temp_dir(&self) -> PathBuf {
        let dir = match tempfile::Builder::new().prefix("testthings-").tempdir() {
            Ok(dir) => dir,
            Err(err) => self.fatal(&format!("temp dir: {err}")),
        };
        let path = dir.path().to_path_buf();
        self.cleanup(Box::new(move || {
            if let Err(err) = dir.close() {
                tracing::warn!("failed to remove temp dir: {err}");
            }
        }));
        path
    }

    fn run_cleanups(&self) {
        let pending = std::mem::take(
            &mut *self
                .cleanups
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        tracing::debug!(scope = %self.name, count = pending.len(), "running cleanups");
        for f in pending.into_iter().rev() {
            // A panicking cleanup must not abort the process mid-unwind.
            if std::panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
                tracing::error!(scope = %self.name, "cleanup panicked");
            }
        }
    }
}

impl Cleanup for TestScope {
    fn cleanup(&self, f: CleanupFn) {
        self.cleanups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(f);
    }
}

impl Logger for TestScope {
    fn log(&self, msg: &str) {
        tracing::info!(scope = %self.name, "{msg}");
    }
}

impl Terminator for TestScope {
    #[track_caller]
    fn fatal(&self, msg: &str) -> ! {
        self.failed.store(true, Ordering::SeqCst);
        let caller = std::panic::Location::caller();
        tracing::error!(scope = %self.name, %caller, "{msg}");
        panic!("{msg}");
    }
}

impl Drop for TestScope {
    fn drop(&mut self) {
        self.run_cleanups();
    }
}

//! Capabilities of a test handle, split so helpers ask only for what they use.
//!
//! [`TestScope`](crate::TestScope) implements all three. Callers with their
//! own harness can implement whichever subset the helpers they use require.

/// Function registered to run when a scope ends.
pub type CleanupFn = Box<dyn FnOnce() + Send + 'static>;

/// Types that run registered functions when they are torn down.
///
/// Functions run in reverse registration order.
pub trait Cleanup {
    fn cleanup(&self, f: CleanupFn);
}

/// Types that can emit log messages.
pub trait Logger {
    fn log(&self, msg: &str);
}

/// Types that can fail the running test.
pub trait Terminator {
    /// Fail the test with `msg`. Never returns.
    ///
    /// Failures are attributed to the caller of the helper that gave up.
    #[track_caller]
    fn fatal(&self, msg: &str) -> !;
}

impl<T: Cleanup + ?Sized> Cleanup for &T {
    fn cleanup(&self, f: CleanupFn) {
        (**self).cleanup(f);
    }
}

impl<T: Logger + ?Sized> Logger for &T {
    fn log(&self, msg: &str) {
        (**self).log(msg);
    }
}

impl<T: Terminator + ?Sized> Terminator for &T {
    #[track_caller]
    fn fatal(&self, msg: &str) -> ! {
        (**self).fatal(msg)
    }
}

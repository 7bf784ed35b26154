//! Small helpers that take the boilerplate out of test code.
//!
//! - [`TestScope`]: a named test handle with cleanups, logging and failure.
//! - [`context`]: cancellation tokens that end with the scope.
//! - [`kv`]: key/value context formatting and logging.
//! - [`skeleton`]: install template directory trees into test directories.
//! - [`logging`]: tracing setup and log capture for tests.
//!
//! The "must succeed" helpers live in `testthings-must` and sentinel error
//! values in `testthings-testerr`.

pub mod context;
pub mod kv;
pub mod logging;
mod scope;
#[cfg(unix)]
pub mod skeleton;
mod types;

pub use context::CancelFunc;
pub use context::c;
pub use context::new_context;
pub use kv::Kv;
pub use kv::format_kv;
pub use kv::log_kv;
pub use scope::TestScope;
pub use types::Cleanup;
pub use types::CleanupFn;
pub use types::Logger;
pub use types::Terminator;

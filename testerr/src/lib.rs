//! Sentinel error values for tests.
//!
//! Tests frequently need "some error" to feed into code under test. These
//! named values make the intent visible at the call site and compare equal
//! to themselves, so assertions can check the exact error that came back.
//!
//! ```
//! use testthings_testerr::{EXPECTED, TestingError};
//!
//! fn fallible() -> Result<(), TestingError> {
//!     Err(EXPECTED)
//! }
//!
//! assert_eq!(fallible(), Err(EXPECTED));
//! assert_eq!(EXPECTED.to_string(), "this error is expected!");
//! ```

use std::borrow::Cow;

use thiserror::Error;

/// Message used when a [`TestingError`] carries no text of its own.
const FALLBACK_MESSAGE: &str = "testing error value";

/// A string-backed error value for tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("{}", self.message())]
pub struct TestingError(Cow<'static, str>);

impl TestingError {
    /// Create a sentinel from a static message.
    pub const fn new(message: &'static str) -> Self {
        Self(Cow::Borrowed(message))
    }

    /// The message this error displays.
    pub fn message(&self) -> &str {
        if self.0.is_empty() {
            FALLBACK_MESSAGE
        } else {
            &self.0
        }
    }
}

impl From<String> for TestingError {
    fn from(message: String) -> Self {
        Self(Cow::Owned(message))
    }
}

impl From<&'static str> for TestingError {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

/// An error the test should not care about.
pub const IGNORE: TestingError = TestingError::new("IGNORE THIS ERROR!");

/// An error the test deliberately provokes.
pub const EXPECTED: TestingError = TestingError::new("this error is expected!");

/// Placeholder for an error path that has not been written yet.
pub const TODO: TestingError = TestingError::new("TODO: an error");

/// Marks a workaround inside a test.
pub const HACK: TestingError = TestingError::new("HACK: this is a hack");

/// Any error at all.
pub const ANY: TestingError = TestingError::new("");

/// Reported when a value was required but none was produced.
pub const NIL_POINTER: TestingError = TestingError::new("unexpected nil pointer");

//! "Must succeed" helpers: unwrap an outcome or fail the running test.
//!
//! Every helper takes a [`Terminator`](testthings::Terminator), usually a
//! [`TestScope`](testthings::TestScope). The `_or_panic` variants are for
//! code that runs outside any test scope and panic instead.

mod from_json;
mod must;

pub use from_json::from_json;
pub use from_json::from_json_file;
pub use from_json::from_json_or_panic;
pub use must::Mustable;
pub use must::must;
pub use must::must_or_panic;
pub use must::must_value;
pub use must::must_with;

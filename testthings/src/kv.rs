//! Key/value context for test output.
//!
//! [`Kv`] holds the interesting values of a test case so they can be logged
//! line by line or folded into a single assertion message:
//!
//! ```
//! use testthings::kv;
//!
//! let ctx = kv! { "user" => "alice", "attempt" => 3 };
//! assert_eq!(ctx.format(""), r#"attempt="3" user="alice""#);
//! assert_eq!(ctx.format("%v=%v, "), "attempt=3, user=alice");
//! ```

mod format;

use std::collections::BTreeMap;

use serde_json::Value;

pub use format::Interceptor;

use crate::types::Logger;

/// Pair format used when none is given.
pub const DEFAULT_PAIR_FORMAT: &str = "%[1]v=%[2]q";

/// Build a [`Kv`] from `key => value` pairs.
#[macro_export]
macro_rules! kv {
    () => {
        $crate::Kv::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Kv::new()$(.with($key, $value))+
    };
}

/// Contextual key/value data, always iterated in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kv(BTreeMap<String, Value>);

impl Kv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a pair, returning the previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Log one line per pair using [`DEFAULT_PAIR_FORMAT`].
    pub fn log<L: Logger + ?Sized>(&self, logger: &L) {
        log_kv(logger, self);
    }

    /// Log one line per pair using `format`.
    pub fn logf<L: Logger + ?Sized>(&self, logger: &L, format: &str) {
        for line in self.strings(format) {
            logger.log(&line);
        }
    }

    /// See [`format_kv`].
    pub fn format(&self, format: &str) -> String {
        format_kv(format, self)
    }

    /// Like [`Kv::format`], rendering keys and values through `intercept`.
    pub fn format_with(&self, format: &str, intercept: &Interceptor) -> String {
        let (pair_format, sep) = split_separator(format);
        self.render(pair_format, intercept).join(sep)
    }

    /// Each pair formatted with `format`, sorted by key.
    pub fn strings(&self, format: &str) -> Vec<String> {
        self.render(format, &Interceptor::default())
    }

    fn render(&self, format: &str, intercept: &Interceptor) -> Vec<String> {
        self.0
            .iter()
            .map(|(k, v)| {
                let key = Value::String(k.clone());
                format::sprintf(format, &[&key, v], intercept)
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Kv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Kv {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Log one line per pair of `kv`.
pub fn log_kv<L: Logger + ?Sized>(logger: &L, kv: &Kv) {
    kv.logf(logger, DEFAULT_PAIR_FORMAT);
}

/// Format every pair of `kv` and join them into one string.
///
/// Trailing whitespace and commas in `format` are not part of the per-pair
/// format; they are the separator placed between pairs. An empty format uses
/// [`DEFAULT_PAIR_FORMAT`] joined by a single space.
pub fn format_kv(format: &str, kv: &Kv) -> String {
    kv.format_with(format, &Interceptor::default())
}

fn split_separator(format: &str) -> (&str, &str) {
    if format.is_empty() {
        return (DEFAULT_PAIR_FORMAT, " ");
    }
    let trimmed = format.trim_end_matches(|c: char| c.is_whitespace() || c == ',');
    (trimmed, &format[trimmed.len()..])
}

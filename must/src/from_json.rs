use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use testthings::Terminator;

/// Parse `text` into a `T`, failing the test if it does not decode.
///
/// ```
/// use testthings::TestScope;
/// use testthings_must::from_json;
///
/// let t = TestScope::new("doc");
/// let ports: Vec<u16> = from_json(&t, "[80, 443]");
/// assert_eq!(ports, vec![80, 443]);
/// ```
#[track_caller]
pub fn from_json<T: DeserializeOwned>(scope: &impl Terminator, text: impl AsRef<[u8]>) -> T {
    match decode(text.as_ref()) {
        Ok(value) => value,
        Err(msg) => scope.fatal(&msg),
    }
}

/// [`from_json`] for initialization contexts: panics instead of failing a
/// test.
#[track_caller]
pub fn from_json_or_panic<T: DeserializeOwned>(text: impl AsRef<[u8]>) -> T {
    match decode(text.as_ref()) {
        Ok(value) => value,
        Err(msg) => panic!("{msg}"),
    }
}

/// Read the JSON fixture at `path` and parse it into a `T`.
#[track_caller]
pub fn from_json_file<T: DeserializeOwned>(scope: &impl Terminator, path: impl AsRef<Path>) -> T {
    let path = path.as_ref();
    let text = match fs::read(path) {
        Ok(text) => text,
        Err(err) => scope.fatal(&format!(
            "cannot read json fixture {}: {err}",
            path.display()
        )),
    };
    tracing::debug!(path = %path.display(), bytes = text.len(), "loaded json fixture");
    from_json(scope, text)
}

fn decode<T: DeserializeOwned>(text: &[u8]) -> Result<T, String> {
    serde_json::from_slice(text).map_err(|err| {
        format!(
            "cannot unmarshal json into {}: {err}",
            std::any::type_name::<T>()
        )
    })
}

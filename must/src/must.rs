use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;

use testthings::Terminator;
use testthings_testerr::NIL_POINTER;

/// Outcomes [`must`] knows how to unwrap.
///
/// - `Result<T, E>` fails on `Err`, reporting the error.
/// - `Option<T>` fails on `None`, reporting [`NIL_POINTER`].
pub trait Mustable<T> {
    fn into_outcome(self) -> Result<T, String>;
}

impl<T, E: fmt::Display> Mustable<T> for Result<T, E> {
    fn into_outcome(self) -> Result<T, String> {
        self.map_err(|err| err.to_string())
    }
}

impl<T> Mustable<T> for Option<T> {
    fn into_outcome(self) -> Result<T, String> {
        self.ok_or_else(|| NIL_POINTER.to_string())
    }
}

/// Run `f` and return its success value, or fail the test.
///
/// A panic inside `f` is caught and reported through `scope` as well.
///
/// ```
/// use testthings::TestScope;
/// use testthings_must::must;
///
/// let t = TestScope::new("doc");
/// let port: u16 = must(&t, || "8080".parse::<u16>());
/// assert_eq!(port, 8080);
/// ```
#[track_caller]
pub fn must<T, R, F>(scope: &impl Terminator, f: F) -> T
where
    F: FnOnce() -> R,
    R: Mustable<T>,
{
    run(scope, Recover::Fatal, f)
}

/// Run a constructor that cannot report errors; only panics fail the test.
#[track_caller]
pub fn must_value<T, F>(scope: &impl Terminator, f: F) -> T
where
    F: FnOnce() -> T,
{
    must(scope, || Ok::<T, Infallible>(f()))
}

/// Hand `f` a default value to fill in and return the result.
#[track_caller]
pub fn must_with<T, F>(scope: &impl Terminator, f: F) -> T
where
    T: Default,
    F: FnOnce(&mut T),
{
    must_value(scope, || {
        let mut value = T::default();
        f(&mut value);
        value
    })
}

/// [`must`] for contexts without a test scope, such as static
/// initialization. Failures panic and panics inside `f` propagate as-is.
#[track_caller]
pub fn must_or_panic<T, R, F>(f: F) -> T
where
    F: FnOnce() -> R,
    R: Mustable<T>,
{
    run(&Unscoped, Recover::Propagate, f)
}

/// What happens to a panic raised inside the wrapped closure.
#[derive(Clone, Copy)]
enum Recover {
    Fatal,
    Propagate,
}

/// Terminator used when no scope is available.
struct Unscoped;

impl Terminator for Unscoped {
    #[track_caller]
    fn fatal(&self, msg: &str) -> ! {
        panic!("{msg}")
    }
}

#[track_caller]
fn run<S, T, R, F>(scope: &S, recover: Recover, f: F) -> T
where
    S: Terminator + ?Sized,
    F: FnOnce() -> R,
    R: Mustable<T>,
{
    let outcome = match recover {
        Recover::Fatal => match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(outcome) => outcome,
            Err(payload) => {
                scope.fatal(&format!("must! but:\n{}", panic_message(payload.as_ref())))
            }
        },
        Recover::Propagate => f(),
    };

    match outcome.into_outcome() {
        Ok(value) => value,
        Err(err) => scope.fatal(&format!("must! but: {err}")),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

//! Cancellation contexts bound to the lifetime of a test scope.
//!
//! A context is a [`CancellationToken`] that is cancelled when the scope that
//! created it runs its cleanups. Background work spawned by a test can watch
//! the token and stop once the test is over.

use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::types::Cleanup;

/// Cancels the context returned alongside it by [`new_context`].
///
/// Cancelling more than once is a no-op.
#[derive(Debug, Clone)]
pub struct CancelFunc(CancellationToken);

impl CancelFunc {
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

/// Create a context that is cancelled when `scope` ends.
///
/// The returned token is a child of the token held by the [`CancelFunc`], so
/// holders of the context cannot cancel it for everyone else.
pub fn new_context<S: Cleanup + ?Sized>(scope: &S) -> (CancellationToken, CancelFunc) {
    let root = CancellationToken::new();
    let on_cleanup = root.clone();
    scope.cleanup(Box::new(move || on_cleanup.cancel()));
    (root.child_token(), CancelFunc(root))
}

/// Short form of [`new_context`] for callers that never cancel early.
pub fn c<S: Cleanup + ?Sized>(scope: &S) -> CancellationToken {
    let (ctx, _cancel) = new_context(scope);
    ctx
}

/// The scope context ended before the raced future finished, either because
/// its scope ran cleanups or because [`CancelFunc::cancel`] was called.
#[derive(Debug, PartialEq, Eq)]
pub enum CancelErr {
    Cancelled,
}

/// Bounds async work in a test by the lifetime of a scope context.
///
/// ```
/// use testthings::TestScope;
/// use testthings::c;
/// use testthings::context::{CancelErr, OrCancelExt};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let ctx = {
///     let t = TestScope::new("ended");
///     c(&t)
/// };
/// let waited = std::future::pending::<()>().or_cancel(&ctx).await;
/// assert_eq!(waited, Err(CancelErr::Cancelled));
/// # });
/// ```
#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    /// Await `self` unless the scope context ends first.
    async fn or_cancel(self, ctx: &CancellationToken) -> Result<Self::Output, CancelErr>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, ctx: &CancellationToken) -> Result<Self::Output, CancelErr> {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(CancelErr::Cancelled),
            output = self => Ok(output),
        }
    }
}

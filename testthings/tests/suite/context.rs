use std::time::Duration;

use pretty_assertions::assert_eq;
use testthings::TestScope;
use testthings::c;
use testthings::context::CancelErr;
use testthings::context::OrCancelExt;
use testthings::new_context;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_task_stops_when_scope_ends() {
    let scope = TestScope::new("worker");
    let ctx = c(&scope);

    let worker = tokio::spawn({
        let ctx = ctx.clone();
        async move {
            let mut ticks = 0u32;
            while tokio::time::sleep(Duration::from_millis(5))
                .or_cancel(&ctx)
                .await
                .is_ok()
            {
                ticks += 1;
            }
            ticks
        }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(scope);

    let ticks = tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("worker did not observe cancellation")
        .expect("worker panicked");
    assert!(ctx.is_cancelled());
    assert!(ticks > 0);
}

#[tokio::test]
async fn early_cancel_ends_pending_work() {
    let scope = TestScope::new("early");
    let (ctx, cancel) = new_context(&scope);

    cancel.cancel();
    let result = std::future::pending::<()>().or_cancel(&ctx).await;

    assert_eq!(result, Err(CancelErr::Cancelled));
}

#[test]
fn nested_scopes_cancel_innermost_first() {
    let top = TestScope::new("top");
    let top_ctx = c(&top);

    top.run("middle", |middle| {
        let middle_ctx = c(middle);
        let inner_ctx = middle.run("inner", c);

        assert!(inner_ctx.is_cancelled());
        assert!(!middle_ctx.is_cancelled());
        assert!(!top_ctx.is_cancelled());
    });

    assert!(!top_ctx.is_cancelled());
}

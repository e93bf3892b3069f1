use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Yields execution back to the event loop once.
///
/// The task is pushed to the tail of the ready queue, so every other
/// already-ready task gets to run before it is resumed. Useful to cede the
/// thread in the middle of a long computation without waiting on any event.
///
/// ```
/// # horus::block_on(async {
/// horus::task::yield_now().await;
/// # }).unwrap();
/// ```
pub async fn yield_now() {
    struct YieldNow {
        yielded: bool,
    }

    impl Future for YieldNow {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.yielded {
                return Poll::Ready(());
            }
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    YieldNow { yielded: false }.await;
}

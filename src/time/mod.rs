//! Timers.
//!
//! Sleeps are managed by the reactor itself: each sleeping task is an
//! entry in a deadline-ordered list, and the event loop bounds its kernel
//! wait by the earliest deadline. No submission-queue entry is spent on a
//! timer, so sleeps cannot be starved by I/O backpressure.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

pub use std::time::Duration;

use crate::reactor;

/// Waits until `duration` has elapsed. An asynchronous analog to
/// `std::thread::sleep`.
///
/// The task resumes no earlier than the deadline; how much later is
/// bounded by the granularity of the event loop's kernel wait. Two sleeps
/// with distinct deadlines always fire in deadline order.
///
/// Dropping the future cancels the sleep; no cleanup is needed.
///
/// ```
/// # horus::block_on(async {
/// use horus::time::{sleep, Duration};
/// use std::time::Instant;
///
/// let start = Instant::now();
/// sleep(Duration::from_millis(20)).await;
/// assert!(start.elapsed() >= Duration::from_millis(20));
/// # }).unwrap();
/// ```
///
/// # Panics
/// The returned future panics if polled outside a runtime context.
pub fn sleep(duration: Duration) -> Sleep {
    sleep_until(Instant::now() + duration)
}

/// Waits until `deadline`. Completes immediately if it already passed.
///
/// # Panics
/// The returned future panics if polled outside a runtime context.
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep {
        deadline,
        registered: false,
    }
}

/// Future returned by [`sleep`] and [`sleep_until`].
#[must_use = "futures do nothing unless awaited"]
pub struct Sleep {
    deadline: Instant,
    registered: bool,
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if Instant::now() >= self.deadline {
            return Poll::Ready(());
        }
        if !self.registered {
            self.registered = true;
            reactor::current().add_sleep(self.deadline, cx.waker().clone());
        }
        Poll::Pending
    }
}

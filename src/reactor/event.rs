use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use io_uring::{cqueue, squeue};

use super::Reactor;

/// A one-shot io_uring operation in flight.
///
/// The resources the submission entry points into (buffers, paths,
/// socket addresses) travel in `data`, so they stay alive for as long as
/// the kernel may touch them. That includes the case where this future is
/// dropped before its completion arrives: the driver adopts the resources
/// and a best-effort cancel is submitted.
pub(crate) struct Event<T: 'static> {
    /// the entry to submit; taken out on the first successful push
    entry: Option<squeue::Entry>,
    reactor: Reactor,
    id: Option<u64>,
    data: Option<T>,
}

type Completed<T> = (io::Result<cqueue::Entry>, T);

impl<T: 'static> Unpin for Event<T> {}

impl<T: 'static> Future for Event<T> {
    type Output = Completed<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(entry) = self.entry.take() {
            if !self.reactor.has_sq_space() {
                // submission ring full: park until the loop frees a slot
                self.reactor.park_sqe_waiter(cx.waker().clone());
                self.entry = Some(entry);
                return Poll::Pending;
            }
            // Safety: the entry's resources live in `self.data` until the
            // completion is observed (or adopted by the driver on drop).
            match unsafe { self.reactor.push(entry) } {
                Ok(id) => self.id = Some(id),
                Err(err) => return Poll::Ready((Err(err), self.data.take().unwrap())),
            }
        }
        let id = self.id.expect("event polled before construction finished");
        let Poll::Ready(cqe) = self.reactor.poll_completion(id, cx.waker()) else {
            return Poll::Pending;
        };
        Poll::Ready((Ok(cqe), self.data.take().unwrap()))
    }
}

impl<T: 'static> Drop for Event<T> {
    fn drop(&mut self) {
        let (Some(id), Some(data)) = (self.id, self.data.take()) else {
            // never submitted, or already completed: nothing in flight
            return;
        };
        // the kernel still owns the operation; hand it the resources and
        // try to cut it short
        self.reactor.ignore(id, Box::new(data));
        self.reactor.cancel(id);
    }
}

/// Submits a one-shot operation, resolving when its completion arrives.
///
/// # Safety
/// Every pointer in `entry` must point into `data` (or into memory that
/// outlives the runtime), so that moving `data` into the event keeps the
/// operation's memory valid for its whole lifetime.
pub(crate) unsafe fn submit<T: 'static>(entry: squeue::Entry, data: T) -> Event<T> {
    Event {
        entry: Some(entry),
        reactor: super::current(),
        id: None,
        data: Some(data),
    }
}

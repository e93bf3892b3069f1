//! The io_uring reactor.
//!
//! One [`Reactor`] exists per runtime. It owns the io_uring instance, the
//! table of in-flight operations, the deadline-ordered timer list, and the
//! queue of tasks parked because the submission queue was full. The event
//! loop in [`Runtime::block_on`](crate::runtime::Runtime::block_on) drives
//! it: submit, wait (bounded by the earliest timer), dispatch completions,
//! fire timers, unpark submission waiters.
//!
//! The syscall wrappers in [`op`] are the reactor's user-facing surface:
//! every one of them follows the same path of awaiting submission-queue
//! space, pushing a one-shot entry, and suspending until the matching
//! completion arrives.

use std::cell::RefCell;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Instant;

use io_uring::{cqueue, squeue};

use self::driver::Driver;
use crate::runtime::Config;

pub(crate) use event::submit;

pub mod op;

mod driver;
mod event;

/// Shared handle to one thread's I/O driver.
#[derive(Clone)]
pub(crate) struct Reactor(Rc<RefCell<Driver>>);

impl Reactor {
    pub fn new(config: &Config) -> io::Result<Reactor> {
        let driver = Driver::new(config)?;
        Ok(Reactor(Rc::new(RefCell::new(driver))))
    }

    /// Submits pending entries to the kernel without blocking.
    pub fn submit_and_yield(&self) -> io::Result<()> {
        self.0.borrow_mut().submit_and_yield()
    }

    /// Submits pending entries and blocks until a completion arrives, or
    /// until `deadline` passes when one is given.
    pub fn wait(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.0.borrow_mut().wait(deadline)
    }

    /// Dispatches every completion available without blocking: each one
    /// resolves the operation holding its event id and wakes its waiter.
    pub fn process_completions(&self) {
        self.0.borrow_mut().process_completions();
    }

    /// Moves every elapsed timer's waiter onto the ready queue, earliest
    /// deadline first.
    pub fn fire_elapsed_timers(&self) {
        self.0.borrow_mut().fire_elapsed_timers();
    }

    /// Resumes parked submitters, one per free submission-queue slot.
    pub fn wake_sqe_waiters(&self) {
        self.0.borrow_mut().wake_sqe_waiters();
    }

    /// Registers a sleeper. `wake` is called once `deadline` has passed.
    pub fn add_sleep(&self, deadline: Instant, waker: Waker) {
        self.0.borrow_mut().add_sleep(deadline, waker);
    }

    pub fn first_deadline(&self) -> Option<Instant> {
        self.0.borrow().first_deadline()
    }

    /// True when no operation is in flight and no timer or parked
    /// submitter remains. The event loop cannot go to sleep on an
    /// unbounded wait while this is false.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn has_sq_space(&self) -> bool {
        self.0.borrow_mut().sq_space_left() > 0
    }

    pub fn park_sqe_waiter(&self, waker: Waker) {
        self.0.borrow_mut().park_sqe_waiter(waker);
    }

    /// Pushes an entry, assigning it a fresh event id stored in the
    /// entry's user data.
    ///
    /// # Safety
    /// The buffers referenced by the entry must stay valid until the
    /// matching completion has been observed.
    pub unsafe fn push(&self, entry: squeue::Entry) -> io::Result<u64> {
        // Safety: forwarded to the caller.
        unsafe { self.0.borrow_mut().push(entry) }
    }

    pub fn poll_completion(&self, id: u64, waker: &Waker) -> Poll<cqueue::Entry> {
        self.0.borrow_mut().poll_completion(id, waker)
    }

    /// Disowns an in-flight operation: its resources are kept alive by the
    /// driver until the completion arrives and are dropped there.
    pub fn ignore(&self, id: u64, keepalive: Box<dyn std::any::Any>) {
        self.0.borrow_mut().ignore(id, keepalive);
    }

    /// Best-effort cancellation of the operation holding `id`.
    pub fn cancel(&self, id: u64) {
        self.0.borrow_mut().cancel(id);
    }
}

/// Returns the reactor of the runtime entered on this thread.
///
/// # Panics
/// Panics when no runtime is entered.
pub(crate) fn current() -> Reactor {
    const ERR_MSG: &str =
        "attempted to perform async I/O from the outside of a runtime context";
    crate::runtime::current().expect(ERR_MSG).reactor
}

/// Waits until the submission queue has at least one free slot.
///
/// The syscall wrappers await this internally before building their
/// entries; it is public for code that wants to apply its own submission
/// backpressure.
pub fn wait_for_sqe() -> impl Future<Output = ()> {
    WaitForSqe {
        reactor: current(),
    }
}

struct WaitForSqe {
    reactor: Reactor,
}

impl Future for WaitForSqe {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.reactor.has_sq_space() {
            return Poll::Ready(());
        }
        self.reactor.park_sqe_waiter(cx.waker().clone());
        Poll::Pending
    }
}

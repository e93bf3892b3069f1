use std::any::Any;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::hint::unreachable_unchecked;
use std::marker::PhantomPinned;
use std::mem::replace;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use super::RawTask;

/// The spawned representation of a future.
pub(crate) struct TaskRepr<F: Future> {
    /// Cells do not pin-project, strictly speaking; the payload is treated
    /// as pinned regardless, and nothing here moves it.
    payload: RefCell<Payload<F>>,
    /// waker registered by the task's `JoinHandle`, if any
    join_waker: Cell<Option<Waker>>,
    detached: Cell<bool>,
    _ph: PhantomPinned,
}

pub(crate) enum Payload<F: Future> {
    Pending { fut: F },
    Ready { output: F::Output },
    Panicked { payload: Box<dyn Any + Send> },
    Taken,
    Aborted,
}

impl<F: Future> TaskRepr<F> {
    pub fn new(fut: F) -> TaskRepr<F> {
        TaskRepr {
            payload: RefCell::new(Payload::Pending { fut }),
            join_waker: Cell::default(),
            detached: Cell::new(false),
            _ph: PhantomPinned,
        }
    }

    fn wake_join(&self) {
        let Some(waker) = self.join_waker.take() else {
            return;
        };
        waker.wake_by_ref();
        self.join_waker.set(Some(waker));
    }
}

impl<F: Future> RawTask for TaskRepr<F>
where
    F::Output: 'static,
{
    fn poll(self: Pin<&Self>, cx: &mut Context) -> Poll<()> {
        let mut payload = self.payload.borrow_mut();
        let Payload::Pending { fut } = &mut *payload else {
            // nothing left to drive; the executor drops its arena entry
            return Poll::Ready(());
        };
        // Safety: the payload future is never moved: `TaskRepr` is !Unpin,
        // its contents are private, and no method moves the future out
        // while it is pending.
        let fut = unsafe { Pin::new_unchecked(fut) };

        match catch_unwind(AssertUnwindSafe(|| fut.poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(output)) => {
                *payload = Payload::Ready { output };
                drop(payload);
                self.wake_join();
                Poll::Ready(())
            }
            Err(panic) => {
                if self.detached.get() {
                    // A detached task has no joiner to rethrow into.
                    let reason = panic_message(&*panic);
                    eprintln!("fatal: a detached task panicked: {reason}");
                    eprintln!("{}", std::backtrace::Backtrace::force_capture());
                    std::process::abort();
                }
                *payload = Payload::Panicked { payload: panic };
                drop(payload);
                self.wake_join();
                Poll::Ready(())
            }
        }
    }

    fn poll_join(self: Pin<&Self>, cx: &mut Context) -> Poll<()> {
        self.join_waker.set(Some(cx.waker().clone()));
        if matches!(&*self.payload.borrow(), Payload::Pending { .. }) {
            return Poll::Pending;
        }
        Poll::Ready(())
    }

    /// # Safety
    /// The caller must uphold that `out` points at uninitialized storage
    /// for an `F::Output`, and that `poll_join` returned `Ready`.
    #[track_caller]
    unsafe fn take_output(self: Pin<&Self>, out: *mut ()) {
        // careful not to move the payload while the future may be pinned
        let mut payload = self.payload.borrow_mut();
        match replace(&mut *payload, Payload::Taken) {
            Payload::Ready { output } => {
                // Safety: the caller upholds that the pointee type matches
                // and that the storage is uninitialized.
                unsafe { out.cast::<F::Output>().write(output) };
            }
            Payload::Panicked { payload } => std::panic::resume_unwind(payload),
            Payload::Taken => panic!("the task's output was already taken"),
            Payload::Aborted => panic!("attempted to join an aborted task"),
            // Safety: the caller upholds that `poll_join` returned Ready,
            // which rules the pending state out.
            Payload::Pending { .. } => unsafe { unreachable_unchecked() },
        }
    }

    fn abort(self: Pin<&Self>) {
        // May fail when the task tries to abort itself mid-poll; aborting
        // a running task from within is a no-op.
        let Ok(mut payload) = self.payload.try_borrow_mut() else {
            return;
        };
        if let Payload::Pending { .. } = &*payload {
            *payload = Payload::Aborted;
            drop(payload);
            self.wake_join();
        }
    }

    fn detach(&self) {
        self.detached.set(true);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "Box<dyn Any>"
    }
}

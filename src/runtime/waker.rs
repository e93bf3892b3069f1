//! Wakers used by the scheduler.
//!
//! A task waker carries no allocation at all: the waker's data word is the
//! task id itself, and waking resolves the executor through the thread
//! local before pushing the id onto the ready queue. This is also why
//! wakeups from foreign threads are unsupported, the runtime is strictly
//! thread local.

use std::ptr;
use std::task::{RawWaker, RawWakerVTable, Waker};

use crate::runtime::current_unwrap;

const TASK_VTABLE: RawWakerVTable =
    RawWakerVTable::new(clone_task, wake_task, wake_task, discard);

const MAIN_VTABLE: RawWakerVTable =
    RawWakerVTable::new(clone_main, wake_main, wake_main, discard);

const NOOP_VTABLE: RawWakerVTable = RawWakerVTable::new(clone_noop, discard, discard, discard);

fn clone_task(data: *const ()) -> RawWaker {
    RawWaker::new(data, &TASK_VTABLE)
}

fn wake_task(data: *const ()) {
    current_unwrap("wake").executor.wake(data as usize);
}

fn clone_main(_: *const ()) -> RawWaker {
    RawWaker::new(ptr::null(), &MAIN_VTABLE)
}

fn wake_main(_: *const ()) {
    current_unwrap("wake").executor.main_awoken.set(true);
}

fn clone_noop(_: *const ()) -> RawWaker {
    RawWaker::new(ptr::null(), &NOOP_VTABLE)
}

/// There is nothing to release: the data word is an integer, not a pointer
/// to anything.
fn discard(_: *const ()) {}

/// The waker for the task with the given id. Waking enqueues the id.
pub(crate) fn task_waker(task_id: usize) -> Waker {
    // keep the integer out of pointer provenance by offsetting a null
    // pointer rather than casting
    let data = ptr::null::<()>().wrapping_byte_add(task_id);
    // Safety: none of the vtable functions dereference the data word.
    unsafe { Waker::from_raw(RawWaker::new(data, &TASK_VTABLE)) }
}

/// The waker for the future driven directly by `block_on`. Waking raises a
/// flag the event loop checks once per pass.
pub(crate) fn main_waker() -> Waker {
    // Safety: none of the vtable functions dereference the data word.
    unsafe { Waker::from_raw(RawWaker::new(ptr::null(), &MAIN_VTABLE)) }
}

/// A waker that drops wakeups on the floor. Used to build probe values for
/// structures ordered by keys that happen to carry a waker along.
pub(crate) fn noop_waker() -> Waker {
    // Safety: every vtable function is a no-op.
    unsafe { Waker::from_raw(RawWaker::new(ptr::null(), &NOOP_VTABLE)) }
}

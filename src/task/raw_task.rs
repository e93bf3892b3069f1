use std::pin::Pin;
use std::task::{Context, Poll};

/// Object-safe surface of a spawned task, as stored in the executor's
/// arena and in [`JoinHandle`](crate::task::JoinHandle)s.
///
/// Joining is split in two steps so the trait stays object safe even
/// though every concrete task has its own output type:
/// [`poll_join`](RawTask::poll_join) reports *whether* an outcome exists,
/// and [`take_output`](RawTask::take_output) moves it out through a typed
/// pointer the join handle provides.
pub(crate) trait RawTask {
    /// Advances the task. `Ready` means the task needs no further polls
    /// (it completed, panicked, or was aborted).
    fn poll(self: Pin<&Self>, cx: &mut Context) -> Poll<()>;

    /// Registers the joiner's waker and reports whether the task already
    /// has an outcome to hand over.
    fn poll_join(self: Pin<&Self>, cx: &mut Context) -> Poll<()>;

    /// Moves the task's output into `out`, or re-raises the panic the
    /// task died from. Panics when the task was aborted or its output was
    /// already taken.
    ///
    /// # Safety
    /// `out` must point at valid, uninitialized storage for the output
    /// type of the future this task was spawned from, and
    /// [`poll_join`](RawTask::poll_join) must have returned `Ready`.
    unsafe fn take_output(self: Pin<&Self>, out: *mut ());

    /// Cancels the task, dropping its future if it has not completed.
    fn abort(self: Pin<&Self>);

    /// Marks the task as detached: nobody will join it, and a panic inside
    /// it becomes fatal.
    fn detach(&self);
}

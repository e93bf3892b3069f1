use std::future::Future;

use super::JoinHandle;
use crate::runtime::current_unwrap;

/// Spawns a task onto the current runtime, returning a [`JoinHandle`] for
/// its output.
///
/// The task starts running at the next turn of the event loop; two tasks
/// spawned back to back run in spawn order.
///
/// # Panics
/// Panics when called outside a runtime context.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    current_unwrap("spawn").spawn(future)
}

/// Spawns a task nobody will join: it keeps running after the handle from
/// [`spawn`] would have been dropped.
///
/// Errors cannot be returned from a detached task, and a panic unwinding
/// out of one is fatal: the process prints a backtrace and aborts.
///
/// # Panics
/// Panics when called outside a runtime context.
pub fn detach<F>(future: F)
where
    F: Future + 'static,
    F::Output: 'static,
{
    current_unwrap("detach").spawn(future).detach();
}

//! Lightweight cooperative tasks.
//!
//! A task is a unit of execution scheduled by the thread's [`Runtime`]
//! rather than the OS: creating one does not allocate a stack, and
//! switching between tasks is a function call. Tasks are polled on the
//! thread they were spawned on and run until they yield at an `.await`
//! point; there is no preemption and no work stealing.
//!
//! [`spawn`] returns a [`JoinHandle`] that can be awaited for the task's
//! output:
//!
//! ```
//! # horus::block_on(async {
//! use horus::task;
//!
//! let join = task::spawn(async { "hello world!" });
//! assert_eq!(join.await, "hello world!");
//! # }).unwrap();
//! ```
//!
//! Dropping a `JoinHandle` cancels its task; use [`detach`] (or
//! [`JoinHandle::detach`]) for fire-and-forget work. A panic inside a
//! joined task is propagated to the awaiter on resume; a panic inside a
//! detached task has nowhere to go and aborts the process after printing a
//! backtrace.
//!
//! [`Runtime`]: crate::runtime::Runtime

pub use fns::{detach, spawn};
pub use join_handle::JoinHandle;
pub use yield_now::yield_now;

pub(crate) use raw_task::RawTask;
pub(crate) use task_repr::TaskRepr;

mod fns;
mod join_handle;
mod raw_task;
mod task_repr;
mod yield_now;

//! Synchronization primitives.
//!
//! [`Semaphore`] synchronizes *tasks* on the single-threaded runtime; like
//! the rest of the task-level API it is neither `Send` nor `Sync`. Waking a
//! waiter goes through the thread's ready queue, which is much cheaper than
//! synchronizing threads. [`SpinLock`] is the one thread-level primitive,
//! guarding the short critical sections of containers that may be shared
//! between independently running reactors.

pub use semaphore::{Acquire, Permit, Semaphore};
pub use spinlock::{SpinGuard, SpinLock};

mod semaphore;
mod spinlock;

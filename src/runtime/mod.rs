//! The runtime: an event loop driving tasks and io_uring completions.
//!
//! An asynchronous application needs two runtime services: a **reactor**
//! that fields I/O completion events from the kernel and routes them to the
//! tasks waiting on them, and a **scheduler** that resumes runnable tasks.
//! [`Runtime`] bundles both for a single thread. Most programs never build
//! one explicitly and just call [`block_on`]:
//!
//! ```
//! use horus::task::yield_now;
//!
//! horus::block_on(async {
//!     yield_now().await;
//!     println!("hello");
//! }).unwrap();
//! ```
//!
//! Exactly one runtime can be entered per thread at a time; entering a
//! second one panics. Threads are otherwise fully independent: runtimes
//! share nothing, and nothing in the task-level API is `Send`.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use crate::reactor::Reactor;
use crate::runtime::waker::main_waker;
use crate::task::JoinHandle;
use executor::Executor;

pub use config::{Config, Mode};
pub(crate) use globals::RUNTIME;

mod config;
mod executor;
mod globals;
pub(crate) mod waker;

/// The per-thread runtime. Cheap to clone; all clones refer to the same
/// executor and reactor.
#[derive(Clone)]
pub struct Runtime {
    pub(crate) executor: Rc<Executor>,
    pub(crate) reactor: Reactor,
}

impl Runtime {
    /// Creates a runtime with the default [`Config`].
    ///
    /// # Errors
    /// Errors if the io_uring instance could not be allocated.
    pub fn new() -> io::Result<Runtime> {
        Config::default().build()
    }

    pub(crate) fn with_config(config: Config) -> io::Result<Runtime> {
        Ok(Runtime {
            executor: Rc::new(Executor::new()),
            reactor: Reactor::new(&config)?,
        })
    }

    /// Runs a future to completion on this runtime, blocking the thread
    /// until it resolves. Tasks and timers spawned by the future run on
    /// the same thread; any still pending when the main future finishes
    /// are suspended (and resumed by a later `block_on`).
    ///
    /// # Panics
    /// Panics if the blocked-on future panics, or when called from inside
    /// another runtime. Runtimes cannot be nested.
    pub fn block_on<F>(&self, mut future: F) -> io::Result<F::Output>
    where
        F: Future,
    {
        assert!(
            current().is_none(),
            "called `block_on` from the inside of another runtime"
        );
        let _enter = self.enter();

        // Safety: the future is shadowed and never moved again.
        let mut future = unsafe { Pin::new_unchecked(&mut future) };
        let main_waker = main_waker();
        let cx = &mut Context::from_waker(&main_waker);

        let executor = &self.executor;
        let reactor = &self.reactor;
        executor.main_awoken.set(true);

        loop {
            // The main future is polled ahead of spawned tasks so the
            // wakers it registers are in place before anything can fire.
            if executor.main_awoken.replace(false) {
                if let Poll::Ready(output) = future.as_mut().poll(cx) {
                    return Ok(output);
                }
            }
            executor.poll_ready();

            if executor.has_ready() || executor.main_awoken.get() {
                // more work is already queued: flush submissions, don't block
                reactor.submit_and_yield()?;
            } else {
                // idle: wait on the completion queue, bounded by the
                // earliest timer deadline
                reactor.wait(reactor.first_deadline())?;
            }
            reactor.process_completions();
            reactor.fire_elapsed_timers();
            reactor.wake_sqe_waiters();
        }
    }

    /// Spawns a task onto this runtime.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let task = self.executor.spawn(future);
        // Safety: the task was spawned from a future with output F::Output.
        unsafe { JoinHandle::new(task) }
    }

    /// Whether the runtime has nothing left to do: no ready tasks, no
    /// timers, no parked submissions, and no operation in flight in the
    /// kernel.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.executor.has_ready() && self.reactor.is_empty()
    }

    /// Enters the runtime context: while the guard lives, runtime
    /// dependent functions such as `spawn` resolve to this runtime.
    #[must_use]
    pub fn enter(&self) -> impl Drop + '_ {
        struct Enter<'a>(Option<Runtime>, &'a ());
        impl Drop for Enter<'_> {
            fn drop(&mut self) {
                RUNTIME.with(|cell| cell.replace(self.0.take()));
            }
        }
        let previous = RUNTIME.with(|cell| cell.replace(Some(self.clone())));
        Enter(previous, &())
    }
}

/// Returns a handle to the runtime entered on this thread, if any.
#[must_use]
pub fn current() -> Option<Runtime> {
    RUNTIME.with(|cell| cell.borrow().clone())
}

/// Runs a future to completion on a fresh runtime. See
/// [`Runtime::block_on`].
///
/// # Errors
/// Errors if the io_uring instance could not be allocated.
///
/// # Panics
/// Panics if called from inside another runtime.
pub fn block_on<F: Future>(future: F) -> io::Result<F::Output> {
    Runtime::new()?.block_on(future)
}

#[track_caller]
#[inline]
pub(crate) fn current_unwrap(fun: &str) -> Runtime {
    let Some(rt) = current() else {
        panic!("called `{fun}` from the outside of a runtime context")
    };
    rt
}

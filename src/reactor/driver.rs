use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::task::{Poll, Waker};
use std::time::Instant;

use io_uring::types::{SubmitArgs, Timespec};
use io_uring::{cqueue, opcode, squeue, IoUring};

use crate::collections::{Ring, SortedList};
use crate::hasher::NoopHasher;
use crate::runtime::waker::noop_waker;
use crate::runtime::Config;

/// What the driver knows about one event id.
enum Lifecycle {
    /// submitted; no task has polled for the completion yet
    Submitted,
    /// a task is suspended waiting for the completion
    Waiting(Waker),
    /// the submitter is gone; the boxed resources are dropped when the
    /// completion arrives
    Ignored(Box<dyn Any>),
    /// the completion arrived before the waiter consumed it
    Completed(cqueue::Entry),
}

/// A registered sleeper. Ordered by deadline; the sequence number keeps
/// equal deadlines in registration order.
pub(crate) struct TimerEntry {
    deadline: Instant,
    seq: u64,
    waker: Waker,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &TimerEntry) -> bool {
        (self.deadline, self.seq) == (other.deadline, other.seq)
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &TimerEntry) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &TimerEntry) -> std::cmp::Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

pub(crate) struct Driver {
    // Declared first: the ring must be torn down (quiescing in-flight
    // kernel operations) before the `Ignored` buffers in `completions`
    // are freed.
    uring: IoUring,
    /// in-flight operations keyed by the event id in their user data
    completions: HashMap<u64, Lifecycle, NoopHasher>,
    /// the last event id handed out
    event_id: u64,
    /// submitted operations whose completions have not been processed yet
    live_ops: u64,
    /// tasks parked because the submission queue was full, FIFO
    sqe_waiters: Ring<Waker>,
    /// sleepers, ordered by deadline then registration
    timers: SortedList<TimerEntry>,
    timer_seq: u64,
}

impl Driver {
    pub fn new(config: &Config) -> io::Result<Driver> {
        let uring = config.io_uring()?;
        Ok(Driver {
            uring,
            completions: HashMap::with_capacity_and_hasher(128, NoopHasher::default()),
            event_id: 0,
            live_ops: 0,
            sqe_waiters: Ring::new(),
            timers: SortedList::new(),
            timer_seq: 0,
        })
    }

    pub fn submit_and_yield(&mut self) -> io::Result<()> {
        match self.uring.submit() {
            Ok(_) => Ok(()),
            Err(err) if err.raw_os_error() == Some(libc::EINTR) => Ok(()),
            Err(err) if err.raw_os_error() == Some(libc::EBUSY) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Submits pending entries, then blocks until at least one completion
    /// is available, or, with a deadline, until it passes.
    pub fn wait(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        let Some(deadline) = deadline else {
            return match self.uring.submit_and_wait(1) {
                Ok(_) => Ok(()),
                Err(err) if err.raw_os_error() == Some(libc::EINTR) => Ok(()),
                Err(err) if err.raw_os_error() == Some(libc::EBUSY) => Ok(()),
                Err(err) => Err(err),
            };
        };

        let timeout = deadline.saturating_duration_since(Instant::now());
        if timeout.is_zero() {
            // the earliest timer already elapsed; just flush submissions
            return self.submit_and_yield();
        }
        let timespec = Timespec::new()
            .sec(timeout.as_secs())
            .nsec(timeout.subsec_nanos());
        let args = SubmitArgs::new().timespec(&timespec);
        match self.uring.submitter().submit_with_args(1, &args) {
            Ok(_) => Ok(()),
            // the deadline passed without a completion
            Err(err) if err.raw_os_error() == Some(libc::ETIME) => Ok(()),
            Err(err) if err.raw_os_error() == Some(libc::EINTR) => Ok(()),
            Err(err) if err.raw_os_error() == Some(libc::EBUSY) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Dispatches every completion sitting in the queue. Each one resolves
    /// the lifecycle entry holding its event id and wakes the waiter.
    pub fn process_completions(&mut self) {
        let Driver {
            uring,
            completions,
            live_ops,
            ..
        } = self;
        let mut queue = uring.completion();
        queue.sync();
        for cqe in &mut queue {
            *live_ops = live_ops
                .checked_sub(1)
                .expect("completion arrived with no operation in flight");
            match completions.entry(cqe.user_data()) {
                Entry::Occupied(mut entry) => match entry.get_mut() {
                    Lifecycle::Waiting(_) => {
                        let Lifecycle::Waiting(waker) = entry.insert(Lifecycle::Completed(cqe))
                        else {
                            unreachable!()
                        };
                        waker.wake();
                    }
                    Lifecycle::Submitted => {
                        entry.insert(Lifecycle::Completed(cqe));
                    }
                    Lifecycle::Ignored(_) => {
                        entry.remove();
                    }
                    Lifecycle::Completed(_) => unreachable!(
                        "a one-shot operation received more than one completion"
                    ),
                },
                Entry::Vacant(_) => unreachable!(
                    "a completion arrived for an unknown operation: a waker has been lost"
                ),
            }
        }
    }

    /// Moves elapsed sleepers out of the timer list and wakes them in
    /// deadline order.
    pub fn fire_elapsed_timers(&mut self) {
        if self.timers.is_empty() {
            return;
        }
        let probe = TimerEntry {
            deadline: Instant::now(),
            seq: u64::MAX,
            waker: noop_waker(),
        };
        for timer in self.timers.drain_to(&probe) {
            timer.waker.wake();
        }
    }

    pub fn add_sleep(&mut self, deadline: Instant, waker: Waker) {
        let seq = self.timer_seq;
        self.timer_seq += 1;
        self.timers.insert(TimerEntry {
            deadline,
            seq,
            waker,
        });
    }

    pub fn first_deadline(&self) -> Option<Instant> {
        self.timers.first().map(|timer| timer.deadline)
    }

    pub fn sq_space_left(&mut self) -> usize {
        let queue = self.uring.submission();
        queue.capacity() - queue.len()
    }

    pub fn park_sqe_waiter(&mut self, waker: Waker) {
        self.sqe_waiters.push_back(waker);
    }

    /// Wakes one parked submitter per free submission-queue slot. The
    /// woken tasks retry their push from the ready queue.
    pub fn wake_sqe_waiters(&mut self) {
        let mut free = self.sq_space_left();
        while free > 0 {
            let Some(waker) = self.sqe_waiters.pop_front() else {
                return;
            };
            waker.wake();
            free -= 1;
        }
    }

    /// Pushes `entry` with a fresh event id in its user data and records
    /// the operation as in flight.
    ///
    /// # Safety
    /// The buffers referenced by `entry` must stay valid until the
    /// matching completion has been observed.
    pub unsafe fn push(&mut self, entry: squeue::Entry) -> io::Result<u64> {
        self.event_id += 1;
        let id = self.event_id;
        let entry = entry.user_data(id);

        if self.uring.submission().is_full() {
            // make room by handing the pending entries to the kernel
            self.submit_and_yield()?;
        }
        let mut queue = self.uring.submission();
        // Safety: entry validity is upheld by the caller.
        if unsafe { queue.push(&entry) }.is_err() {
            drop(queue);
            return Err(io::Error::other("submission queue full"));
        }
        drop(queue);

        self.completions.insert(id, Lifecycle::Submitted);
        self.live_ops += 1;
        Ok(id)
    }

    /// Polls the completion for `id`, registering `waker` while it is
    /// still pending.
    pub fn poll_completion(&mut self, id: u64, waker: &Waker) -> Poll<cqueue::Entry> {
        match self.completions.entry(id) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Lifecycle::Completed(_) => {
                    let Lifecycle::Completed(cqe) = entry.remove() else {
                        unreachable!()
                    };
                    Poll::Ready(cqe)
                }
                lifecycle @ (Lifecycle::Submitted | Lifecycle::Waiting(_)) => {
                    *lifecycle = Lifecycle::Waiting(waker.clone());
                    Poll::Pending
                }
                Lifecycle::Ignored(_) => {
                    unreachable!("polled an operation that was disowned")
                }
            },
            Entry::Vacant(_) => {
                unreachable!("polled an operation that was never submitted")
            }
        }
    }

    /// Disowns the in-flight operation `id`. Its resources are parked in
    /// the lifecycle table and dropped when the completion arrives, so the
    /// kernel never writes through freed memory.
    pub fn ignore(&mut self, id: u64, keepalive: Box<dyn Any>) {
        match self.completions.entry(id) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                // completion already seen; nothing outstanding
                Lifecycle::Completed(_) => {
                    entry.remove();
                }
                _ => {
                    entry.insert(Lifecycle::Ignored(keepalive));
                }
            },
            Entry::Vacant(_) => {}
        }
    }

    /// Pushes an `AsyncCancel` for `id` when there is room for one. Losing
    /// the race is fine: the operation then completes normally and its
    /// `Ignored` resources are reclaimed all the same.
    pub fn cancel(&mut self, id: u64) {
        if self.sq_space_left() == 0 {
            return;
        }
        let entry = opcode::AsyncCancel::new(id).build();
        // Safety: the cancel entry borrows no memory.
        if let Ok(cancel_id) = unsafe { self.push(entry) } {
            self.ignore(cancel_id, Box::new(()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.live_ops == 0 && self.timers.is_empty() && self.sqe_waiters.is_empty()
    }
}

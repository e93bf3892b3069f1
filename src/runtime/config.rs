use std::io;

use io_uring::IoUring;

use crate::runtime::Runtime;

/// Runtime configuration.
///
/// ```no_run
/// use horus::runtime::{Config, Mode};
///
/// let rt = Config { ring_entries: 32, mode: Mode::Notify }
///     .build()
///     .unwrap();
/// # drop(rt);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// The number of entries in the io_uring submission queue. This bounds
    /// how many operations can be handed to the kernel per submit; tasks
    /// that find the queue full park until space frees up. Defaults to 128.
    pub ring_entries: u32,
    /// How the kernel learns about new submissions. Defaults to `Notify`.
    pub mode: Mode,
}

/// Determines whether the kernel is notified of submissions by a syscall
/// or polls the submission queue on its own.
#[derive(Clone, Debug, Default)]
pub enum Mode {
    /// Each submit is a `io_uring_enter` call. The right choice for all
    /// but the most I/O-heavy workloads.
    #[default]
    Notify,
    /// A kernel thread polls the submission queue, skipping the syscall.
    /// Requires a 5.11+ kernel to work unprivileged.
    Polling {
        /// Milliseconds the kernel thread keeps polling an idle queue
        /// before it goes to sleep.
        idle_timeout: u32,
    },
}

impl Default for Config {
    fn default() -> Config {
        Config {
            ring_entries: 128,
            mode: Mode::default(),
        }
    }
}

impl Config {
    /// Builds a runtime from this configuration.
    ///
    /// # Errors
    /// Errors if the io_uring instance could not be allocated. There is
    /// no fallback engine.
    pub fn build(self) -> io::Result<Runtime> {
        Runtime::with_config(self)
    }

    pub(crate) fn io_uring(&self) -> io::Result<IoUring> {
        let mut builder = IoUring::builder();
        if let Mode::Polling { idle_timeout } = self.mode {
            builder.setup_sqpoll(idle_timeout);
        }
        builder.build(self.ring_entries)
    }
}

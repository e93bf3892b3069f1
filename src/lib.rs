//! A single-threaded, completion-based async runtime for Linux, built
//! directly on io_uring, together with the containers it is made of.
//!
//! The runtime is cooperative: exactly one [`Runtime`] runs per thread, and
//! every task spawned onto it is polled on that thread. I/O is submitted to
//! the kernel as one-shot io_uring operations; the event loop waits on the
//! completion queue, bounded by the earliest sleep deadline, and resumes the
//! task waiting for each completion.
//!
//! ```no_run
//! use horus::net::Socket;
//!
//! fn main() -> std::io::Result<()> {
//!     horus::block_on(async {
//!         let mut socket = Socket::tcp()?;
//!         socket.connect([127, 0, 0, 1].into(), 8080).await?;
//!         let (sent, _) = socket.send(b"ping".to_vec()).await;
//!         sent?;
//!         Ok(())
//!     })?
//! }
//! ```
#![warn(clippy::undocumented_unsafe_blocks)]

pub mod buf;
pub mod collections;
pub mod fs;
pub mod net;
pub mod pool;
pub mod reactor;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

mod hasher;

pub use runtime::{block_on, Runtime};
pub use task::{detach, spawn, JoinHandle};

//! Containers the runtime is built out of.
//!
//! [`Ring`] is the workhorse: it backs the executor's ready queue, the
//! reactor's SQE-waiter queue, semaphore wait queues and [`MemBuf`]'s byte
//! storage. [`SortedList`] keeps the timer list in deadline order, and
//! [`MemBuf`] is the endian-aware byte stream the buffered I/O wrappers
//! read and write through.

pub use membuf::{MemBuf, Refill};
pub use ring::Ring;
pub use sorted_list::SortedList;

mod membuf;
mod ring;
mod sorted_list;

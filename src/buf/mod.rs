//! Buffer ownership traits for completion-based I/O.
//!
//! io_uring operations hand buffers to the kernel and only learn about
//! their completion later, so the runtime must *own* every buffer for the
//! full duration of an operation. Read and write calls therefore take their
//! buffer by value and give it back alongside the result.

pub use io_buf::IoBuf;
pub use io_buf_mut::IoBufMut;
pub use slice::Slice;

mod io_buf;
mod io_buf_mut;
mod slice;

pub(crate) fn deref(buf: &impl IoBuf) -> &[u8] {
    // Safety: the `IoBuf` trait is unsafe and expected to be implemented
    // correctly.
    unsafe { std::slice::from_raw_parts(buf.stable_ptr(), buf.bytes_init()) }
}

use crate::buf::Slice;

use std::ops;

/// An io_uring compatible read-side buffer.
///
/// Because buffers are passed to the runtime by ownership, Rust's borrowed
/// slice API (`&buf[..]`) cannot describe a sub-range of one; use the owned
/// [`slice`](IoBuf::slice) method instead.
///
/// # Safety
///
/// Buffers handed to io_uring operations must reference a stable memory
/// region: while the runtime owns the value, the pointer returned by
/// [`stable_ptr`](IoBuf::stable_ptr) must not change, even if the value is
/// moved.
pub unsafe trait IoBuf: Unpin + 'static {
    /// Raw pointer to the buffer's memory.
    fn stable_ptr(&self) -> *const u8;

    /// Number of initialized bytes. For `Vec<u8>` this is `len()`.
    fn bytes_init(&self) -> usize;

    /// Total buffer size, including uninitialized memory. For `Vec<u8>`
    /// this is `capacity()`.
    fn bytes_total(&self) -> usize;

    /// Returns an owned view of the given range of the buffer.
    fn slice(self, range: impl ops::RangeBounds<usize>) -> Slice<Self>
    where
        Self: Sized,
    {
        use core::ops::Bound;

        let begin = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&n) => n.checked_add(1).expect("range end out of bounds"),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => self.bytes_total(),
        };
        assert!(begin <= self.bytes_init());
        assert!(end <= self.bytes_total());
        assert!(begin <= end);

        Slice::new(self, begin, end)
    }
}

// Safety: Vec's allocation is stable while the value is not resized.
unsafe impl IoBuf for Vec<u8> {
    fn stable_ptr(&self) -> *const u8 {
        self.as_ptr()
    }
    fn bytes_init(&self) -> usize {
        self.len()
    }
    fn bytes_total(&self) -> usize {
        self.capacity()
    }
}

// Safety: boxed slices are stable pointers.
unsafe impl IoBuf for Box<[u8]> {
    fn stable_ptr(&self) -> *const u8 {
        self.as_ptr()
    }
    fn bytes_init(&self) -> usize {
        self.len()
    }
    fn bytes_total(&self) -> usize {
        self.len()
    }
}

// Safety: static references are stable.
unsafe impl IoBuf for &'static [u8] {
    fn stable_ptr(&self) -> *const u8 {
        self.as_ptr()
    }
    fn bytes_init(&self) -> usize {
        <[u8]>::len(self)
    }
    fn bytes_total(&self) -> usize {
        self.bytes_init()
    }
}

// Safety: static references are stable.
unsafe impl<const N: usize> IoBuf for &'static [u8; N] {
    fn stable_ptr(&self) -> *const u8 {
        self.as_ptr()
    }
    fn bytes_init(&self) -> usize {
        N
    }
    fn bytes_total(&self) -> usize {
        N
    }
}

// Safety: static references are stable.
unsafe impl IoBuf for &'static str {
    fn stable_ptr(&self) -> *const u8 {
        self.as_ptr()
    }
    fn bytes_init(&self) -> usize {
        <str>::len(self)
    }
    fn bytes_total(&self) -> usize {
        self.bytes_init()
    }
}

// Safety: String's allocation is stable while the value is not resized.
unsafe impl IoBuf for String {
    fn stable_ptr(&self) -> *const u8 {
        self.as_ptr()
    }
    fn bytes_init(&self) -> usize {
        self.len()
    }
    fn bytes_total(&self) -> usize {
        self.capacity()
    }
}

use crate::buf::{IoBuf, IoBufMut};

use std::ops::{Deref, DerefMut};

/// An owned view into an [`IoBuf`], created by [`IoBuf::slice`].
pub struct Slice<B> {
    buf: B,
    begin: usize,
    end: usize,
}

impl<B> Slice<B> {
    pub(crate) fn new(buf: B, begin: usize, end: usize) -> Slice<B> {
        Slice { buf, begin, end }
    }

    /// Offset of the start of the view in the underlying buffer.
    #[must_use]
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Offset of the end of the view in the underlying buffer.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Gives the underlying buffer back.
    pub fn into_inner(self) -> B {
        self.buf
    }
}

impl<B: IoBuf> Deref for Slice<B> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        let bytes = crate::buf::deref(&self.buf);
        let end = self.end.min(bytes.len());
        &bytes[self.begin..end]
    }
}

impl<B: IoBufMut> DerefMut for Slice<B> {
    fn deref_mut(&mut self) -> &mut [u8] {
        let begin = self.begin;
        let end = self.end.min(self.buf.bytes_init());
        // Safety: the IoBufMut contract guarantees a stable, valid buffer
        // of at least `bytes_init` bytes.
        unsafe {
            std::slice::from_raw_parts_mut(
                self.buf.stable_mut_ptr().add(begin),
                end.saturating_sub(begin),
            )
        }
    }
}

// Safety: forwards to the underlying buffer's stable pointer.
unsafe impl<B: IoBuf> IoBuf for Slice<B> {
    fn stable_ptr(&self) -> *const u8 {
        // Safety: `begin` is within the allocation per the constructor.
        unsafe { self.buf.stable_ptr().add(self.begin) }
    }

    fn bytes_init(&self) -> usize {
        self.buf.bytes_init().saturating_sub(self.begin)
    }

    fn bytes_total(&self) -> usize {
        self.end - self.begin
    }
}

// Safety: forwards to the underlying buffer's stable pointer.
unsafe impl<B: IoBufMut> IoBufMut for Slice<B> {
    fn stable_mut_ptr(&mut self) -> *mut u8 {
        // Safety: `begin` is within the allocation per the constructor.
        unsafe { self.buf.stable_mut_ptr().add(self.begin) }
    }

    unsafe fn set_init(&mut self, init: usize) {
        // Safety: upheld by the caller, shifted to the parent's offsets.
        unsafe { self.buf.set_init(self.begin + init) };
    }
}

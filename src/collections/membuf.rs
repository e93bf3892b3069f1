use std::future::Future;
use std::io;

use crate::collections::Ring;
use crate::sync::{SpinGuard, SpinLock};

/// An endian-aware byte stream over a [`Ring`] of bytes.
///
/// Reads consume from the front, writes append at the back, and the
/// `peek_*` family inspects without consuming. Multi-byte integers honour
/// the buffer's endianness flag (little-endian unless switched).
///
/// The buffer itself is not internally serialised (the runtime is
/// single-threaded), but [`lock`](MemBuf::lock) offers an explicit lock
/// scope for buffers shared with other threads.
///
/// ```
/// use horus::collections::MemBuf;
///
/// let mut buf = MemBuf::new();
/// buf.set_big_endian(true);
/// buf.write_u16(0xCAFE);
/// assert_eq!(buf.peek_u8(0), 0xCA);
/// assert_eq!(buf.read_u16(), 0xCAFE);
/// assert!(buf.is_empty());
/// ```
#[derive(Debug)]
pub struct MemBuf {
    buffer: Ring<u8>,
    lock: SpinLock,
    big_endian: bool,
}

/// Transport hook for topping a [`MemBuf`] up when it runs dry.
///
/// Buffered transports (a socket-backed stream, a chunked decoder) implement
/// this to pull the next chunk from wherever their bytes come from. The
/// default implementation has no data source and reports zero bytes.
pub trait Refill {
    /// Appends more bytes to `buf`, returning how many were added. Zero
    /// means the source is exhausted.
    fn refill(&mut self, buf: &mut MemBuf) -> impl Future<Output = io::Result<usize>>;
}

impl MemBuf {
    /// Creates an empty buffer with the default 1024-byte capacity.
    #[must_use]
    pub fn new() -> MemBuf {
        MemBuf::with_capacity(1024)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> MemBuf {
        MemBuf {
            buffer: Ring::with_capacity(capacity),
            lock: SpinLock::new(),
            big_endian: false,
        }
    }

    /// Creates a buffer holding a copy of `data`.
    #[must_use]
    pub fn from_slice(data: &[u8]) -> MemBuf {
        let mut buffer = Ring::with_capacity(data.len().max(2));
        for (slot, byte) in buffer.storage_mut().iter_mut().zip(data) {
            slot.write(*byte);
        }
        // Safety: the first `data.len()` slots were just written.
        unsafe { buffer.set_used(data.len()) };
        MemBuf {
            buffer,
            lock: SpinLock::new(),
            big_endian: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    #[must_use]
    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    /// Switches the endianness used by the multi-byte reads and writes.
    pub fn set_big_endian(&mut self, big_endian: bool) {
        self.big_endian = big_endian;
    }

    /// Holds the buffer's spinlock for the lifetime of the guard.
    pub fn lock(&self) -> SpinGuard<'_> {
        self.lock.lock()
    }

    /// Consumes and returns the next byte.
    ///
    /// # Panics
    /// Panics if the buffer is empty; the same goes for the rest of the
    /// `read_*`/`peek_*` family when fewer bytes are buffered than asked.
    pub fn read_u8(&mut self) -> u8 {
        self.buffer.pop_front().expect("read past the end of the buffer")
    }

    pub fn read_u16(&mut self) -> u16 {
        let bytes = [self.read_u8(), self.read_u8()];
        if self.big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        }
    }

    pub fn read_u32(&mut self) -> u32 {
        let mut bytes = [0; 4];
        bytes.fill_with(|| self.read_u8());
        if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        }
    }

    pub fn read_u64(&mut self) -> u64 {
        let mut bytes = [0; 8];
        bytes.fill_with(|| self.read_u8());
        if self.big_endian {
            u64::from_be_bytes(bytes)
        } else {
            u64::from_le_bytes(bytes)
        }
    }

    /// Consumes and returns the next `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Vec<u8> {
        assert!(count <= self.len(), "read past the end of the buffer");
        let mut bytes = Vec::with_capacity(count);
        for _ in 0..count {
            bytes.push(self.read_u8());
        }
        bytes
    }

    /// Discards the next `count` bytes.
    pub fn skip(&mut self, count: usize) {
        assert!(count <= self.len(), "skipped past the end of the buffer");
        for _ in 0..count {
            self.buffer.pop_front();
        }
    }

    /// Returns the byte at logical offset `at` without consuming it.
    #[must_use]
    pub fn peek_u8(&self, at: usize) -> u8 {
        self.buffer[at]
    }

    #[must_use]
    pub fn peek_u16(&self, at: usize) -> u16 {
        let bytes = [self.peek_u8(at), self.peek_u8(at + 1)];
        if self.big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        }
    }

    #[must_use]
    pub fn peek_u32(&self, at: usize) -> u32 {
        let mut bytes = [0; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.peek_u8(at + i);
        }
        if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        }
    }

    #[must_use]
    pub fn peek_u64(&self, at: usize) -> u64 {
        let mut bytes = [0; 8];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.peek_u8(at + i);
        }
        if self.big_endian {
            u64::from_be_bytes(bytes)
        } else {
            u64::from_le_bytes(bytes)
        }
    }

    /// Copies `count` bytes starting at logical offset `at` without
    /// consuming them.
    #[must_use]
    pub fn peek_bytes(&self, count: usize, at: usize) -> Vec<u8> {
        (at..at + count).map(|i| self.peek_u8(i)).collect()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push_back(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.write_slice(&bytes);
    }

    pub fn write_u32(&mut self, value: u32) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.write_slice(&bytes);
    }

    pub fn write_u64(&mut self, value: u64) {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.write_slice(&bytes);
    }

    /// Appends a byte slice verbatim.
    pub fn write_slice(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Appends the UTF-8 bytes of `data` verbatim.
    pub fn write_str(&mut self, data: &str) {
        self.write_slice(data.as_bytes());
    }

    /// Puts bytes back at the *front* of the buffer, so the next read
    /// returns them first. Used by writers that flushed only part of the
    /// buffered data.
    pub fn unread(&mut self, data: &[u8]) {
        for &byte in data.iter().rev() {
            self.buffer.push_front(byte);
        }
    }

    /// Direct access to the backing ring, e.g. to linearise it before a
    /// raw write.
    pub fn ring(&mut self) -> &mut Ring<u8> {
        &mut self.buffer
    }
}

impl Default for MemBuf {
    fn default() -> MemBuf {
        MemBuf::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{MemBuf, Refill};
    use crate::runtime::block_on;
    use std::io;

    #[test]
    fn little_endian_round_trip() {
        let mut buf = MemBuf::new();
        buf.write_u8(0x01);
        buf.write_u16(0x2345);
        buf.write_u32(0x6789_ABCD);
        buf.write_u64(0x0011_2233_4455_6677);
        assert_eq!(buf.len(), 15);
        assert_eq!(buf.read_u8(), 0x01);
        assert_eq!(buf.read_u16(), 0x2345);
        assert_eq!(buf.read_u32(), 0x6789_ABCD);
        assert_eq!(buf.read_u64(), 0x0011_2233_4455_6677);
        assert!(buf.is_empty());
    }

    #[test]
    fn big_endian_byte_order_on_the_wire() {
        let mut buf = MemBuf::new();
        buf.set_big_endian(true);
        buf.write_u32(0xDEAD_BEEF);
        assert_eq!(buf.peek_bytes(4, 0), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(buf.read_u32(), 0xDEAD_BEEF);
    }

    #[test]
    fn endianness_switch_changes_decoding() {
        let mut buf = MemBuf::from_slice(&[0x12, 0x34]);
        assert_eq!(buf.peek_u16(0), 0x3412);
        buf.set_big_endian(true);
        assert_eq!(buf.read_u16(), 0x1234);
    }

    #[test]
    fn peek_does_not_consume() {
        let buf = MemBuf::from_slice(b"abcd");
        assert_eq!(buf.peek_u8(0), b'a');
        assert_eq!(buf.peek_u8(3), b'd');
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn skip_and_unread() {
        let mut buf = MemBuf::from_slice(b"hello world");
        buf.skip(6);
        assert_eq!(buf.read_bytes(5), b"world");
        buf.unread(b"again");
        assert_eq!(buf.read_bytes(5), b"again");
    }

    #[test]
    fn strings_are_copied_byte_for_byte() {
        let mut buf = MemBuf::new();
        buf.write_str("ping");
        assert_eq!(buf.read_bytes(4), b"ping");
    }

    #[test]
    #[should_panic(expected = "read past the end")]
    fn reading_an_empty_buffer_panics() {
        let mut buf = MemBuf::new();
        let _ = buf.read_u8();
    }

    #[test]
    fn lock_scopes_release_on_drop() {
        let buf = MemBuf::new();
        let guard = buf.lock();
        drop(guard);
        let _guard = buf.lock();
    }

    #[test]
    fn refill_hook_tops_the_buffer_up() {
        struct Chunks(Vec<&'static [u8]>);

        impl Refill for Chunks {
            async fn refill(&mut self, buf: &mut MemBuf) -> io::Result<usize> {
                let Some(chunk) = self.0.pop() else { return Ok(0) };
                buf.write_slice(chunk);
                Ok(chunk.len())
            }
        }

        block_on(async {
            let mut source = Chunks(vec![b"defg", b"abc"]);
            let mut buf = MemBuf::new();
            assert_eq!(source.refill(&mut buf).await.unwrap(), 3);
            assert_eq!(buf.read_bytes(3), b"abc");
            assert_eq!(source.refill(&mut buf).await.unwrap(), 4);
            assert_eq!(source.refill(&mut buf).await.unwrap(), 0);
            assert_eq!(buf.read_bytes(4), b"defg");
        })
        .unwrap();
    }
}

use std::io;
use std::path::Path;

use super::OpenOptions;
use crate::buf::IoBuf;
use crate::collections::MemBuf;
use crate::reactor::op;

/// How many bytes a buffered read pulls from the kernel at a time.
const BATCH_READ: usize = 64 * 1024;

/// A buffered asynchronous file.
///
/// Reading and writing go through independent heads and buffers: reads are
/// batched into up-to-64 KiB kernel reads with the surplus kept for later,
/// and writes that the kernel takes only partially are buffered and
/// flushed by [`drain`](File::drain) (or the next write).
///
/// [`close`](File::close) drains outstanding writes before closing the
/// descriptor. Dropping a file with unflushed writes logs a warning and
/// closes the descriptor synchronously, best effort.
///
/// ```no_run
/// use horus::fs::File;
///
/// # horus::block_on(async {
/// let mut file = File::open("foo.txt").await?;
/// let contents = file.read_to_end().await?;
/// file.close().await?;
/// # std::io::Result::Ok(()) }).unwrap();
/// ```
#[derive(Debug)]
pub struct File {
    fd: i32,
    read_head: u64,
    write_head: u64,
    eof: bool,
    rdbuf: MemBuf,
    wrbuf: MemBuf,
}

impl File {
    /// Opens a file in read-only mode.
    pub async fn open<P: AsRef<Path>>(path: P) -> io::Result<File> {
        OpenOptions::new().read(true).open(path.as_ref()).await
    }

    /// Opens a file in write-only mode, creating it if needed and
    /// truncating it if not.
    pub async fn create<P: AsRef<Path>>(path: P) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())
            .await
    }

    /// Returns a fresh [`OpenOptions`] builder.
    pub fn options() -> OpenOptions {
        OpenOptions::new()
    }

    pub(crate) fn from_fd(fd: i32) -> File {
        File {
            fd,
            read_head: 0,
            write_head: 0,
            eof: false,
            rdbuf: MemBuf::new(),
            wrbuf: MemBuf::new(),
        }
    }

    fn ensure_open(&self, what: &str) -> io::Result<()> {
        if self.fd < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{what} a closed file"),
            ));
        }
        Ok(())
    }

    /// Reads up to `n` bytes from the current read position.
    ///
    /// Buffered bytes are served first; at most one kernel read tops the
    /// result up, so fewer than `n` bytes is a short read, not an error.
    /// An empty result past the end of the file just means EOF.
    pub async fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        self.ensure_open("reading from")?;
        if self.rdbuf.len() >= n {
            return Ok(self.rdbuf.read_bytes(n));
        }
        let mut result = self.rdbuf.read_bytes(self.rdbuf.len());
        if self.eof {
            return Ok(result);
        }
        let have = result.len();
        let want = n - have;

        if want > BATCH_READ {
            // large read: skip the buffer, read straight into the result
            result.reserve(want);
            let (res, slice) = op::read_at(self.fd, result.slice(have..n), self.read_head).await;
            let result = slice.into_inner();
            let read = res?;
            self.read_head += read as u64;
            if read == 0 {
                self.eof = true;
            }
            return Ok(result);
        }

        let (res, batch) =
            op::read_at(self.fd, Vec::with_capacity(BATCH_READ), self.read_head).await;
        let read = res?;
        self.read_head += read as u64;
        if read == 0 {
            self.eof = true;
        }
        if read <= want {
            result.extend_from_slice(&batch[..read]);
        } else {
            // keep the surplus of the batched read for the next call
            result.extend_from_slice(&batch[..want]);
            self.rdbuf.write_slice(&batch[want..read]);
        }
        Ok(result)
    }

    /// Reads until end of file.
    pub async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        self.ensure_open("reading from")?;
        let mut result = self.rdbuf.read_bytes(self.rdbuf.len());
        while !self.eof {
            let (res, batch) =
                op::read_at(self.fd, Vec::with_capacity(BATCH_READ), self.read_head).await;
            let read = res?;
            if read == 0 {
                self.eof = true;
                break;
            }
            self.read_head += read as u64;
            result.extend_from_slice(&batch[..read]);
        }
        Ok(result)
    }

    /// Reads exactly `n` bytes, or fails.
    ///
    /// # Errors
    /// Fails with [`UnexpectedEof`](io::ErrorKind::UnexpectedEof) when the
    /// file ends first. The bytes that did arrive stay buffered, so the
    /// logical read position is unchanged by a failed call.
    pub async fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        self.ensure_open("reading from")?;
        if self.rdbuf.len() >= n {
            return Ok(self.rdbuf.read_bytes(n));
        }
        if self.eof {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file reached eof before finishing the read",
            ));
        }
        let mut result = self.rdbuf.read_bytes(self.rdbuf.len());
        let have = result.len();
        result.reserve(n - have);
        let (res, slice) = op::read_at(self.fd, result.slice(have..n), self.read_head).await;
        let result = slice.into_inner();
        let read = res?;
        self.read_head += read as u64;
        if read < n - have {
            self.eof = true;
            self.rdbuf.unread(&result[..have + read]);
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file reached eof before finishing the read",
            ));
        }
        Ok(result)
    }

    /// Reads up to `n` bytes and decodes them as UTF-8.
    ///
    /// # Errors
    /// Fails with [`InvalidData`](io::ErrorKind::InvalidData) on invalid
    /// UTF-8.
    pub async fn read_str(&mut self, n: usize) -> io::Result<String> {
        let bytes = self.read(n).await?;
        String::from_utf8(bytes)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    /// Tries to flush the write buffer once. `Ok(true)` means it is empty.
    async fn try_flush(&mut self) -> io::Result<bool> {
        if self.wrbuf.is_empty() {
            return Ok(true);
        }
        let pending = self.wrbuf.read_bytes(self.wrbuf.len());
        let (res, pending) = op::write_at(self.fd, pending, self.write_head).await;
        match res {
            Ok(wrote) => {
                self.write_head += wrote as u64;
                if wrote < pending.len() {
                    self.wrbuf.unread(&pending[wrote..]);
                }
                Ok(self.wrbuf.is_empty())
            }
            Err(err) => {
                self.wrbuf.unread(&pending);
                Err(err)
            }
        }
    }

    /// Writes `data` at the current write position.
    ///
    /// Previously buffered bytes are flushed first; whatever the kernel
    /// does not take immediately is buffered and left for
    /// [`drain`](File::drain).
    pub async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.ensure_open("writing to")?;
        if !self.try_flush().await? {
            self.wrbuf.write_slice(data);
            return Ok(());
        }
        let (res, data) = op::write_at(self.fd, data.to_vec(), self.write_head).await;
        let wrote = res?;
        self.write_head += wrote as u64;
        if wrote < data.len() {
            self.wrbuf.write_slice(&data[wrote..]);
        }
        Ok(())
    }

    /// Flushes the write buffer until it is empty, polling the descriptor
    /// for writability after every short write.
    pub async fn drain(&mut self) -> io::Result<()> {
        self.ensure_open("writing to")?;
        loop {
            if self.try_flush().await? {
                return Ok(());
            }
            op::poll_add(self.fd, libc::POLLOUT as u32).await?;
        }
    }

    /// Drains buffered writes, then closes the descriptor. The value
    /// stays around with [`is_open`](File::is_open) false; further reads
    /// and writes fail.
    pub async fn close(&mut self) -> io::Result<()> {
        self.ensure_open("closing")?;
        self.drain().await?;
        let fd = self.fd;
        self.fd = -1;
        op::close(fd).await
    }

    /// Size of the file in bytes, by asking the kernel.
    pub async fn size(&self) -> io::Result<u64> {
        self.ensure_open("statting")?;
        let statx = op::statx(self.fd, None).await?;
        Ok(statx.stx_size)
    }

    /// Moves the read head. Bytes already buffered from the old position
    /// are *not* discarded; they are served before the new position takes
    /// effect.
    pub fn seek_read(&mut self, pos: u64) {
        self.read_head = pos;
    }

    /// Moves the write head. Buffered writes flush to the new position.
    pub fn seek_write(&mut self, pos: u64) {
        self.write_head = pos;
    }

    /// Whether a read has hit the end of the file.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.fd >= 0
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if self.fd < 0 {
            return;
        }
        if !self.wrbuf.is_empty() {
            log::warn!(
                "file (fd {}) dropped with {} unflushed buffered bytes",
                self.fd,
                self.wrbuf.len()
            );
        }
        // Safety: the descriptor is owned by this file and closed once.
        unsafe { libc::close(self.fd) };
    }
}

use std::io;
use std::path::Path;

use super::File;
use crate::reactor::op;

/// Options controlling how a [`File`] is opened.
///
/// ```no_run
/// use horus::fs::OpenOptions;
///
/// # horus::block_on(async {
/// let file = OpenOptions::new()
///     .write(true)
///     .create(true)
///     .open("example.log")
///     .await?;
/// # std::io::Result::Ok(()) }).unwrap();
/// ```
#[derive(Clone, Debug)]
#[must_use]
pub struct OpenOptions {
    read: bool,
    write: bool,
    create: bool,
    truncate: bool,
    append: bool,
    mode: u32,
}

impl OpenOptions {
    pub fn new() -> OpenOptions {
        OpenOptions {
            read: false,
            write: false,
            create: false,
            truncate: false,
            append: false,
            mode: 0o666,
        }
    }

    pub fn read(mut self, read: bool) -> OpenOptions {
        self.read = read;
        self
    }

    pub fn write(mut self, write: bool) -> OpenOptions {
        self.write = write;
        self
    }

    /// Creates the file if it does not exist yet.
    pub fn create(mut self, create: bool) -> OpenOptions {
        self.create = create;
        self
    }

    /// Truncates an existing file to zero length.
    pub fn truncate(mut self, truncate: bool) -> OpenOptions {
        self.truncate = truncate;
        self
    }

    pub fn append(mut self, append: bool) -> OpenOptions {
        self.append = append;
        self
    }

    /// Permission bits applied when a file is created.
    pub fn mode(mut self, mode: u32) -> OpenOptions {
        self.mode = mode;
        self
    }

    fn flags(&self) -> io::Result<i32> {
        let mut flags = match (self.read, self.write) {
            (true, true) => libc::O_RDWR,
            (true, false) => libc::O_RDONLY,
            (false, true) => libc::O_WRONLY,
            (false, false) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "at least one of read/write must be specified",
                ))
            }
        };
        if self.create {
            flags |= libc::O_CREAT;
        }
        if self.truncate {
            flags |= libc::O_TRUNC;
        }
        if self.append {
            flags |= libc::O_APPEND;
        }
        Ok(flags)
    }

    /// Opens the file at `path` with these options.
    ///
    /// # Errors
    /// Errors if the combination of options is invalid or the kernel
    /// refuses the open.
    pub async fn open<P: AsRef<Path>>(self, path: P) -> io::Result<File> {
        let flags = self.flags()?;
        let fd = op::open(path.as_ref(), flags, self.mode).await?;
        Ok(File::from_fd(fd))
    }
}

impl Default for OpenOptions {
    fn default() -> OpenOptions {
        OpenOptions::new()
    }
}

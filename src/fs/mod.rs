//! Buffered asynchronous file I/O.

pub use file::File;
pub use open_options::OpenOptions;

mod file;
mod open_options;

//! Asynchronous IPv4 sockets and the socket pool.

pub use manager::{PooledSocket, SocketManager};
pub use socket::{build_ipv4, Mode, Socket};

mod manager;
mod socket;

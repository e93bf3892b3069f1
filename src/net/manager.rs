use std::io;
use std::net::Ipv4Addr;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::rc::Rc;

use super::{Mode, Socket};
use crate::pool::Pool;

/// A pool of IPv4 sockets.
///
/// Hands out [`PooledSocket`]s backed by an object-pool slot. When a
/// handle drops, the socket is shut down and its slot returned, so a
/// manager that is used in a steady state stops allocating entirely.
///
/// Cloning the manager is cheap; all clones share the pool.
#[derive(Clone)]
pub struct SocketManager {
    pool: Rc<Pool<Socket>>,
}

impl SocketManager {
    #[must_use]
    pub fn new() -> SocketManager {
        SocketManager {
            pool: Rc::new(Pool::new()),
        }
    }

    /// A fresh TCP socket, not yet connected.
    pub fn tcp(&self) -> io::Result<PooledSocket> {
        Ok(self.wrap(Socket::tcp()?))
    }

    /// A fresh UDP socket.
    pub fn udp(&self) -> io::Result<PooledSocket> {
        Ok(self.wrap(Socket::udp()?))
    }

    /// A TCP socket already connected to `addr:port`.
    pub async fn connect_tcp(&self, addr: Ipv4Addr, port: u16) -> io::Result<PooledSocket> {
        let mut socket = self.tcp()?;
        socket.connect(addr, port).await?;
        Ok(socket)
    }

    /// The number of sockets currently handed out.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.pool.used_size()
    }

    fn wrap(&self, socket: Socket) -> PooledSocket {
        let ptr = self.pool.acquire(socket).disown();
        PooledSocket {
            pool: self.pool.clone(),
            // Safety: pool slots are never null.
            ptr: unsafe { NonNull::new_unchecked(ptr) },
        }
    }
}

impl Default for SocketManager {
    fn default() -> SocketManager {
        SocketManager::new()
    }
}

/// An owning handle to a pooled [`Socket`].
///
/// Dropping the handle shuts the connection down (when one exists), closes
/// the descriptor and returns the slot to the pool.
pub struct PooledSocket {
    pool: Rc<Pool<Socket>>,
    ptr: NonNull<Socket>,
}

impl Deref for PooledSocket {
    type Target = Socket;
    fn deref(&self) -> &Socket {
        // Safety: the handle owns the slot until it is offered back.
        unsafe { self.ptr.as_ref() }
    }
}

impl DerefMut for PooledSocket {
    fn deref_mut(&mut self) -> &mut Socket {
        // Safety: the handle owns the slot until it is offered back.
        unsafe { self.ptr.as_mut() }
    }
}

impl Drop for PooledSocket {
    fn drop(&mut self) {
        if self.mode() != Mode::None {
            let _ = self.shutdown();
        }
        // offering destroys the socket, which closes the descriptor
        self.pool.offer(self.ptr.as_ptr());
    }
}

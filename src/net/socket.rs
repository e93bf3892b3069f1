use std::io;
use std::mem::size_of;
use std::net::{Ipv4Addr, SocketAddrV4};

use crate::buf::{IoBuf, IoBufMut};
use crate::reactor::op;

/// Builds a network-order IPv4 literal, `a` being the high octet:
/// `build_ipv4(127, 0, 0, 1)` is localhost.
#[must_use]
pub const fn build_ipv4(a: u8, b: u8, c: u8, d: u8) -> u32 {
    u32::from_ne_bytes([a, b, c, d])
}

/// What a socket is currently doing. Gates the teardown path: closing is
/// idempotent because only a socket that is not `None` still owns work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// no mode set
    #[default]
    None,
    /// bound and accepting connections
    Listening,
    /// connected to a remote peer
    Connected,
}

/// An asynchronous IPv4 socket.
///
/// All I/O goes through the runtime's io_uring: `connect`, `send`, `recv`,
/// `read` and `accept` submit one-shot operations and suspend until their
/// completions arrive. Buffers are passed by value and handed back, as
/// everywhere else in the runtime.
pub struct Socket {
    fd: i32,
    mode: Mode,
}

impl Socket {
    /// Creates a TCP socket.
    ///
    /// # Errors
    /// Errors if the kernel refuses the descriptor.
    pub fn tcp() -> io::Result<Socket> {
        Socket::new(libc::SOCK_STREAM)
    }

    /// Creates a UDP socket.
    ///
    /// # Errors
    /// Errors if the kernel refuses the descriptor.
    pub fn udp() -> io::Result<Socket> {
        Socket::new(libc::SOCK_DGRAM)
    }

    fn new(kind: i32) -> io::Result<Socket> {
        // Safety: plain socket(2) call, no memory involved.
        let fd = unsafe { libc::socket(libc::AF_INET, kind | libc::SOCK_CLOEXEC, 0) };
        if fd == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(Socket { fd, mode: Mode::None })
    }

    /// The raw file descriptor.
    #[must_use]
    pub fn fd(&self) -> i32 {
        self.fd
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Connects to `addr:port`.
    pub async fn connect(&mut self, addr: Ipv4Addr, port: u16) -> io::Result<()> {
        op::connect(self.fd, SocketAddrV4::new(addr, port)).await?;
        self.mode = Mode::Connected;
        Ok(())
    }

    /// Binds to `addr:port` and starts listening with a backlog of 64.
    /// Binding port 0 lets the kernel pick one; see
    /// [`local_addr`](Socket::local_addr).
    pub fn bind_listen(&mut self, addr: Ipv4Addr, port: u16) -> io::Result<()> {
        let sockaddr = libc::sockaddr_in {
            sin_family: libc::AF_INET as libc::sa_family_t,
            sin_port: port.to_be(),
            sin_addr: libc::in_addr {
                s_addr: u32::from_ne_bytes(addr.octets()),
            },
            sin_zero: [0; 8],
        };
        // Safety: the address struct lives across the calls; bind and
        // listen do not retain the pointer.
        let res = unsafe {
            libc::bind(
                self.fd,
                (&sockaddr as *const libc::sockaddr_in).cast::<libc::sockaddr>(),
                size_of::<libc::sockaddr_in>() as libc::socklen_t,
            )
        };
        if res == -1 {
            return Err(io::Error::last_os_error());
        }
        // Safety: plain listen(2) call.
        if unsafe { libc::listen(self.fd, 64) } == -1 {
            return Err(io::Error::last_os_error());
        }
        self.mode = Mode::Listening;
        Ok(())
    }

    /// Accepts one connection, returning the connected peer socket.
    pub async fn accept(&self) -> io::Result<Socket> {
        let (fd, _peer) = op::accept(self.fd).await?;
        Ok(Socket {
            fd,
            mode: Mode::Connected,
        })
    }

    /// Sends the buffer's bytes, returning how many the kernel took.
    pub async fn send<B: IoBuf>(&self, buf: B) -> (io::Result<usize>, B) {
        op::send(self.fd, buf, libc::MSG_NOSIGNAL).await
    }

    /// Receives into the buffer, returning how many bytes arrived. Zero
    /// means the peer shut the connection down.
    pub async fn recv<B: IoBufMut>(&self, buf: B) -> (io::Result<usize>, B) {
        op::recv(self.fd, buf, 0).await
    }

    /// Reads into the buffer through the generic read path; equivalent to
    /// [`recv`](Socket::recv) for connected stream sockets.
    pub async fn read<B: IoBufMut>(&self, buf: B) -> (io::Result<usize>, B) {
        op::read_at(self.fd, buf, 0).await
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddrV4> {
        // Safety: sockaddr_in is valid when zeroed.
        let mut sockaddr: libc::sockaddr_in = unsafe { std::mem::zeroed() };
        let mut len = size_of::<libc::sockaddr_in>() as libc::socklen_t;
        // Safety: the out-pointers outlive the call.
        let res = unsafe {
            libc::getsockname(
                self.fd,
                (&mut sockaddr as *mut libc::sockaddr_in).cast::<libc::sockaddr>(),
                &mut len,
            )
        };
        if res == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(SocketAddrV4::new(
            Ipv4Addr::from(sockaddr.sin_addr.s_addr.to_ne_bytes()),
            u16::from_be(sockaddr.sin_port),
        ))
    }

    /// Shuts both directions of the connection down.
    pub fn shutdown(&self) -> io::Result<()> {
        // Safety: plain shutdown(2) call.
        if unsafe { libc::shutdown(self.fd, libc::SHUT_RDWR) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Closes the socket. Idempotent: a second close is a no-op.
    pub async fn close(&mut self) -> io::Result<()> {
        if self.fd < 0 {
            return Ok(());
        }
        let fd = self.fd;
        self.fd = -1;
        self.mode = Mode::None;
        op::close(fd).await
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        if self.fd < 0 {
            return;
        }
        self.mode = Mode::None;
        // Safety: the descriptor is owned by this socket and closed once.
        unsafe { libc::close(self.fd) };
    }
}

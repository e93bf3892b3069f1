//! One-shot syscall wrappers.
//!
//! Every wrapper follows the same skeleton: build the submission entry,
//! hand its resources to [`submit`](super::submit) for the duration of the
//! operation, await the completion, and translate a negative result into
//! an [`io::Error`] naming the operation and file descriptor. Buffers are
//! taken by value and returned alongside the result.

use std::ffi::CString;
use std::io;
use std::mem::{size_of, MaybeUninit};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use io_uring::opcode::{
    Accept, Close, Connect, Nop, OpenAt, PollAdd, Read, Recv, Send, Statx, Write,
};
use io_uring::types::Fd;
use libc::AT_FDCWD;

use super::submit;
use crate::buf::{IoBuf, IoBufMut};

/// Translates a negative CQE result into an error with context.
fn check(res: i32, context: impl FnOnce(&io::Error) -> String) -> io::Result<i32> {
    if res >= 0 {
        return Ok(res);
    }
    let err = io::Error::from_raw_os_error(-res);
    Err(io::Error::new(err.kind(), context(&err)))
}

/// Submits a no-op operation. Completes with no effect; useful to measure
/// round trips and exercise submission backpressure.
pub async fn nop() -> io::Result<()> {
    let sqe = Nop::new().build();
    // Safety: the entry references no memory.
    let (cqe, ()) = unsafe { submit(sqe, ()) }.await;
    check(cqe?.result(), |err| format!("nop failed ({err})"))?;
    Ok(())
}

/// Opens `path` with the given `open(2)` flags and mode, returning the
/// file descriptor.
pub async fn open(path: &Path, flags: i32, mode: u32) -> io::Result<i32> {
    let path = CString::new(path.as_os_str().as_bytes())?;
    let sqe = OpenAt::new(Fd(AT_FDCWD), path.as_ptr())
        .flags(flags)
        .mode(mode)
        .build();
    // Safety: the path string is kept alive by submit.
    let (cqe, path) = unsafe { submit(sqe, path) }.await;
    check(cqe?.result(), |err| {
        format!("opening {path:?} failed ({err})")
    })
}

/// Closes a file descriptor.
pub async fn close(fd: i32) -> io::Result<()> {
    let sqe = Close::new(Fd(fd)).build();
    // Safety: the entry references no memory.
    let (cqe, ()) = unsafe { submit(sqe, ()) }.await;
    check(cqe?.result(), |err| format!("closing fd {fd} failed ({err})"))?;
    Ok(())
}

/// Reads from `fd` at `pos` into the buffer, returning the number of
/// bytes read and the buffer.
pub async fn read_at<B: IoBufMut>(fd: i32, mut buf: B, pos: u64) -> (io::Result<usize>, B) {
    let sqe = Read::new(Fd(fd), buf.stable_mut_ptr(), buf.bytes_total() as u32)
        .offset(pos)
        .build();
    // Safety: the buffer is kept alive by submit.
    let (cqe, mut buf) = unsafe { submit(sqe, buf) }.await;
    let res = cqe.and_then(|cqe| {
        check(cqe.result(), |err| {
            format!("reading fd {fd} failed ({err})")
        })
    });
    match res {
        Ok(read) => {
            // Safety: the kernel initialized `read` bytes.
            unsafe { buf.set_init(read as usize) };
            (Ok(read as usize), buf)
        }
        Err(err) => (Err(err), buf),
    }
}

/// Writes the buffer's initialized bytes to `fd` at `pos`, returning the
/// number of bytes written and the buffer.
pub async fn write_at<B: IoBuf>(fd: i32, buf: B, pos: u64) -> (io::Result<usize>, B) {
    let sqe = Write::new(Fd(fd), buf.stable_ptr(), buf.bytes_init() as u32)
        .offset(pos)
        .build();
    // Safety: the buffer is kept alive by submit.
    let (cqe, buf) = unsafe { submit(sqe, buf) }.await;
    let res = cqe.and_then(|cqe| {
        check(cqe.result(), |err| {
            format!("writing fd {fd} failed ({err})")
        })
    });
    (res.map(|wrote| wrote as usize), buf)
}

/// Waits for `fd` to satisfy `poll_mask` (a `poll(2)` event mask),
/// returning the ready events.
pub async fn poll_add(fd: i32, poll_mask: u32) -> io::Result<u32> {
    let sqe = PollAdd::new(Fd(fd), poll_mask).build();
    // Safety: the entry references no memory.
    let (cqe, ()) = unsafe { submit(sqe, ()) }.await;
    let revents = check(cqe?.result(), |err| {
        format!("polling fd {fd} failed ({err})")
    })?;
    Ok(revents as u32)
}

/// Connects `fd` to an IPv4 address.
pub async fn connect(fd: i32, addr: SocketAddrV4) -> io::Result<()> {
    let sockaddr = Box::new(libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: addr.port().to_be(),
        sin_addr: libc::in_addr {
            s_addr: u32::from_ne_bytes(addr.ip().octets()),
        },
        sin_zero: [0; 8],
    });
    let sqe = Connect::new(
        Fd(fd),
        (&*sockaddr as *const libc::sockaddr_in).cast::<libc::sockaddr>(),
        size_of::<libc::sockaddr_in>() as libc::socklen_t,
    )
    .build();
    // Safety: the socket address is kept alive by submit.
    let (cqe, _sockaddr) = unsafe { submit(sqe, sockaddr) }.await;
    check(cqe?.result(), |err| {
        format!("connecting fd {fd} to {addr} failed ({err})")
    })?;
    Ok(())
}

/// Sends the buffer's initialized bytes on a connected socket.
pub async fn send<B: IoBuf>(fd: i32, buf: B, flags: i32) -> (io::Result<usize>, B) {
    let sqe = Send::new(Fd(fd), buf.stable_ptr(), buf.bytes_init() as u32)
        .flags(flags)
        .build();
    // Safety: the buffer is kept alive by submit.
    let (cqe, buf) = unsafe { submit(sqe, buf) }.await;
    let res = cqe.and_then(|cqe| {
        check(cqe.result(), |err| {
            format!("sending on fd {fd} failed ({err})")
        })
    });
    (res.map(|sent| sent as usize), buf)
}

/// Receives into the buffer from a connected socket.
pub async fn recv<B: IoBufMut>(fd: i32, mut buf: B, flags: i32) -> (io::Result<usize>, B) {
    let sqe = Recv::new(Fd(fd), buf.stable_mut_ptr(), buf.bytes_total() as u32)
        .flags(flags)
        .build();
    // Safety: the buffer is kept alive by submit.
    let (cqe, mut buf) = unsafe { submit(sqe, buf) }.await;
    let res = cqe.and_then(|cqe| {
        check(cqe.result(), |err| {
            format!("receiving on fd {fd} failed ({err})")
        })
    });
    match res {
        Ok(received) => {
            // Safety: the kernel initialized `received` bytes.
            unsafe { buf.set_init(received as usize) };
            (Ok(received as usize), buf)
        }
        Err(err) => (Err(err), buf),
    }
}

/// Accepts a connection on a listening socket, returning the new file
/// descriptor and the peer address.
pub async fn accept(fd: i32) -> io::Result<(i32, SocketAddrV4)> {
    // Safety: sockaddr_in is valid when zeroed.
    let sockaddr: libc::sockaddr_in = unsafe { std::mem::zeroed() };
    let mut storage = Box::new((sockaddr, size_of::<libc::sockaddr_in>() as libc::socklen_t));
    let sqe = Accept::new(
        Fd(fd),
        (&mut storage.0 as *mut libc::sockaddr_in).cast::<libc::sockaddr>(),
        &mut storage.1,
    )
    .flags(libc::SOCK_CLOEXEC)
    .build();
    // Safety: the address storage is kept alive by submit.
    let (cqe, storage) = unsafe { submit(sqe, storage) }.await;
    let conn_fd = check(cqe?.result(), |err| {
        format!("accepting on fd {fd} failed ({err})")
    })?;
    let peer = SocketAddrV4::new(
        Ipv4Addr::from(storage.0.sin_addr.s_addr.to_ne_bytes()),
        u16::from_be(storage.0.sin_port),
    );
    Ok((conn_fd, peer))
}

/// Stats a file or path. With `path` unset, `fd` itself is statted.
pub async fn statx(fd: i32, path: Option<CString>) -> io::Result<libc::statx> {
    let pathname = path.as_ref().map_or(b"\0".as_ptr(), |p| p.as_ptr().cast());
    let mut statx = Box::new(MaybeUninit::<libc::statx>::uninit());
    let flags = if path.is_none() { libc::AT_EMPTY_PATH } else { 0 };
    let sqe = Statx::new(Fd(fd), pathname.cast(), statx.as_mut_ptr().cast())
        .mask(libc::STATX_ALL)
        .flags(flags)
        .build();
    // Safety: the path and output buffer are kept alive by submit.
    let (cqe, (path, statx)) = unsafe { submit(sqe, (path, statx)) }.await;
    check(cqe?.result(), |err| {
        format!("statx on fd {fd} ({path:?}) failed ({err})")
    })?;
    // Safety: a successful statx initialized the buffer.
    Ok(unsafe { statx.assume_init_read() })
}

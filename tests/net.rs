use std::io;
use std::net::Ipv4Addr;

use horus::net::{build_ipv4, Mode, Socket, SocketManager};
use horus::runtime::{block_on, Runtime};
use horus::task::spawn;

async fn recv_exactly(socket: &Socket, n: usize) -> io::Result<Vec<u8>> {
    let mut received = Vec::new();
    while received.len() < n {
        let (count, buf) = socket.recv(vec![0u8; n]).await;
        let count = count?;
        if count == 0 {
            break;
        }
        received.extend_from_slice(&buf[..count]);
    }
    Ok(received)
}

// A listener and a client on loopback: the client sends "ping", the
// server echoes it back, both sides close, and the runtime winds down
// with nothing in flight.
#[test]
fn echo_pair() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let mut listener = Socket::tcp().unwrap();
        listener.bind_listen(Ipv4Addr::LOCALHOST, 0).unwrap();
        assert_eq!(listener.mode(), Mode::Listening);
        let port = listener.local_addr().unwrap().port();

        let server = spawn(async move {
            let mut conn = listener.accept().await.unwrap();
            let request = recv_exactly(&conn, 4).await.unwrap();
            let (sent, _) = conn.send(request).await;
            assert_eq!(sent.unwrap(), 4);
            conn.close().await.unwrap();
        });

        let client = spawn(async move {
            let mut socket = Socket::tcp().unwrap();
            socket.connect(Ipv4Addr::LOCALHOST, port).await.unwrap();
            assert_eq!(socket.mode(), Mode::Connected);
            let (sent, _) = socket.send(b"ping".to_vec()).await;
            assert_eq!(sent.unwrap(), 4);
            let reply = recv_exactly(&socket, 4).await.unwrap();
            socket.close().await.unwrap();
            reply
        });

        server.await;
        assert_eq!(client.await, b"ping");
    })
    .unwrap();
    assert!(rt.is_idle(), "all operations completed before exit");
}

#[test]
fn socket_close_is_idempotent() {
    block_on(async {
        let mut socket = Socket::tcp().unwrap();
        socket.close().await.unwrap();
        assert_eq!(socket.mode(), Mode::None);
        socket.close().await.unwrap();
    })
    .unwrap();
}

#[test]
fn manager_returns_slots_on_drop() {
    block_on(async {
        let manager = SocketManager::new();
        {
            let tcp = manager.tcp().unwrap();
            let udp = manager.udp().unwrap();
            assert_eq!(tcp.mode(), Mode::None);
            assert_eq!(udp.mode(), Mode::None);
            assert_eq!(manager.in_use(), 2);
        }
        assert_eq!(manager.in_use(), 0);
    })
    .unwrap();
}

#[test]
fn manager_sockets_speak_tcp() {
    block_on(async {
        let mut listener = Socket::tcp().unwrap();
        listener.bind_listen(Ipv4Addr::LOCALHOST, 0).unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = spawn(async move {
            let conn = listener.accept().await.unwrap();
            let request = recv_exactly(&conn, 5).await.unwrap();
            let (sent, _) = conn.send(request).await;
            sent.unwrap();
        });

        let manager = SocketManager::new();
        let client = manager
            .connect_tcp(Ipv4Addr::LOCALHOST, port)
            .await
            .unwrap();
        assert_eq!(client.mode(), Mode::Connected);
        let (sent, _) = client.send(b"hello".to_vec()).await;
        assert_eq!(sent.unwrap(), 5);
        assert_eq!(recv_exactly(&client, 5).await.unwrap(), b"hello");

        server.await;
        assert_eq!(manager.in_use(), 1);
        drop(client);
        assert_eq!(manager.in_use(), 0);
    })
    .unwrap();
}

#[test]
fn build_ipv4_is_network_ordered() {
    assert_eq!(
        build_ipv4(127, 0, 0, 1),
        u32::from_ne_bytes(Ipv4Addr::LOCALHOST.octets())
    );
    assert_eq!(
        Ipv4Addr::from(build_ipv4(10, 1, 2, 3).to_ne_bytes()),
        Ipv4Addr::new(10, 1, 2, 3)
    );
}

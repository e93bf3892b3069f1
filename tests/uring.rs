use std::io::Write;

use horus::reactor::{op, wait_for_sqe};
use horus::runtime::{block_on, Config, Mode, Runtime};
use horus::task::spawn;

#[test]
fn nop_round_trip() {
    block_on(async {
        op::nop().await.unwrap();
    })
    .unwrap();
}

// Eight concurrent submissions through a two-entry submission queue: every
// task beyond the queue depth parks and is resumed as space frees up, and
// all of them complete.
#[test]
fn submission_queue_backpressure() {
    let rt = Config {
        ring_entries: 2,
        mode: Mode::Notify,
    }
    .build()
    .unwrap();
    rt.block_on(async {
        let handles: Vec<_> = (0..8).map(|_| spawn(async { op::nop().await })).collect();
        for handle in handles {
            handle.await.unwrap();
        }
    })
    .unwrap();
    assert!(rt.is_idle(), "no operation is left in flight");
}

#[test]
fn wait_for_sqe_is_ready_when_space_exists() {
    block_on(async {
        wait_for_sqe().await;
        op::nop().await.unwrap();
    })
    .unwrap();
}

// Each completion must resolve exactly the operation that submitted it:
// four reads at distinct offsets land in four distinct buffers.
#[test]
fn completions_match_their_submissions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slots.bin");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"aaaabbbbccccdddd").unwrap();
    drop(file);

    block_on(async move {
        let fd = op::open(&path, libc::O_RDONLY, 0).await.unwrap();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                spawn(async move {
                    let (n, buf) = op::read_at(fd, vec![0u8; 4], i * 4).await;
                    assert_eq!(n.unwrap(), 4);
                    buf
                })
            })
            .collect();
        let expected: [&[u8]; 4] = [b"aaaa", b"bbbb", b"cccc", b"dddd"];
        for (handle, expected) in handles.into_iter().zip(expected) {
            assert_eq!(handle.await, expected);
        }
        op::close(fd).await.unwrap();
    })
    .unwrap();
}

#[test]
fn failed_operations_carry_context() {
    block_on(async {
        let err = op::close(-5).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("closing fd -5"), "{message}");
    })
    .unwrap();
}

#[test]
fn statx_reports_the_file_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sized.bin");
    std::fs::write(&path, vec![7u8; 1234]).unwrap();

    block_on(async move {
        let fd = op::open(&path, libc::O_RDONLY, 0).await.unwrap();
        let statx = op::statx(fd, None).await.unwrap();
        assert_eq!(statx.stx_size, 1234);
        op::close(fd).await.unwrap();
    })
    .unwrap();
}

#[test]
fn runtime_is_idle_after_block_on() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let write = spawn(async { op::nop().await });
        write.await.unwrap();
    })
    .unwrap();
    assert!(rt.is_idle());
}

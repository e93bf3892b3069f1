use std::io::ErrorKind;

use horus::fs::File;
use horus::runtime::block_on;

#[test]
fn write_then_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");

    block_on(async move {
        let mut file = File::create(&path).await.unwrap();
        file.write(b"hello from the ring").await.unwrap();
        file.drain().await.unwrap();
        file.close().await.unwrap();

        let mut file = File::open(&path).await.unwrap();
        let contents = file.read_to_end().await.unwrap();
        assert_eq!(contents, b"hello from the ring");
        assert!(file.is_eof());
        file.close().await.unwrap();
    })
    .unwrap();
}

#[test]
fn short_reads_come_from_the_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("buffered.bin");
    std::fs::write(&path, b"0123456789").unwrap();

    block_on(async move {
        let mut file = File::open(&path).await.unwrap();
        // the first read pulls one batch; the rest is served buffered
        assert_eq!(file.read(3).await.unwrap(), b"012");
        assert_eq!(file.read(3).await.unwrap(), b"345");
        assert_eq!(file.read(10).await.unwrap(), b"6789");
        assert!(file.read(1).await.unwrap().is_empty());
        assert!(file.is_eof());
        file.close().await.unwrap();
    })
    .unwrap();
}

#[test]
fn read_exact_fails_on_short_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.bin");
    std::fs::write(&path, b"hello").unwrap();

    block_on(async move {
        let mut file = File::open(&path).await.unwrap();
        let err = file.read_exact(10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert!(file.is_eof());
        // the failed call did not consume anything
        assert_eq!(file.read(5).await.unwrap(), b"hello");
        file.close().await.unwrap();
    })
    .unwrap();
}

#[test]
fn read_exact_succeeds_within_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exact.bin");
    std::fs::write(&path, b"abcdefgh").unwrap();

    block_on(async move {
        let mut file = File::open(&path).await.unwrap();
        assert_eq!(file.read_exact(4).await.unwrap(), b"abcd");
        assert_eq!(file.read_exact(4).await.unwrap(), b"efgh");
        file.close().await.unwrap();
    })
    .unwrap();
}

#[test]
fn read_str_decodes_utf8() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.txt");
    std::fs::write(&path, "grüße".as_bytes()).unwrap();

    block_on(async move {
        let mut file = File::open(&path).await.unwrap();
        let text = file.read_str(64).await.unwrap();
        assert_eq!(text, "grüße");
        file.close().await.unwrap();
    })
    .unwrap();
}

#[test]
fn seek_read_repositions_the_head() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seek.bin");
    std::fs::write(&path, b"0123456789").unwrap();

    block_on(async move {
        let mut file = File::open(&path).await.unwrap();
        file.seek_read(6);
        assert_eq!(file.read(4).await.unwrap(), b"6789");
        file.close().await.unwrap();
    })
    .unwrap();
}

#[test]
fn size_matches_the_written_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sized.bin");
    std::fs::write(&path, vec![0u8; 4096]).unwrap();

    block_on(async move {
        let mut file = File::open(&path).await.unwrap();
        assert_eq!(file.size().await.unwrap(), 4096);
        file.close().await.unwrap();
    })
    .unwrap();
}

#[test]
fn operations_on_a_closed_file_fail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closed.bin");
    std::fs::write(&path, b"x").unwrap();

    block_on(async move {
        let mut file = File::open(&path).await.unwrap();
        assert!(file.is_open());
        file.close().await.unwrap();
        assert!(!file.is_open());
        assert!(file.read(1).await.is_err());
        assert!(file.write(b"y").await.is_err());
        assert!(file.close().await.is_err());
    })
    .unwrap();
}

#[test]
fn missing_files_error_with_context() {
    block_on(async {
        let err = File::open("/definitely/not/here").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("opening"), "{err}");
    })
    .unwrap();
}

/*!
 * Control Channel Tests
 * Registration contract, diagnostic reads and the socket front end
 */

use pretty_assertions::assert_eq;
use rr_sched::api::handle_request;
use rr_sched::{
    ControlChannel, ControlServer, ProcessRegistry, ReadMode, SchedulerError, SimulatedController,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

fn channel(mode: ReadMode, live: &[i32]) -> (Arc<ProcessRegistry>, ControlChannel) {
    let ctrl = Arc::new(SimulatedController::with_live(live.iter().copied()));
    let registry = Arc::new(ProcessRegistry::new(ctrl));
    let channel = ControlChannel::new(Arc::clone(&registry), mode);
    (registry, channel)
}

#[test]
fn test_write_returns_bytes_consumed() {
    let (registry, ch) = channel(ReadMode::Queue, &[1234]);
    assert_eq!(ch.write(b"1234\n").unwrap(), 5);
    assert_eq!(registry.snapshot().unwrap(), vec![1234]);
}

#[test]
fn test_malformed_payloads_rejected() {
    let (registry, ch) = channel(ReadMode::Queue, &[]);
    for payload in [&b"abc"[..], b"", b"12 34", b"1.5", b"99999999999"] {
        let err = ch.write(payload).unwrap_err();
        assert!(
            matches!(err, SchedulerError::InvalidInput(_)),
            "{:?} -> {:?}",
            payload,
            err
        );
    }
    assert!(registry.is_empty().unwrap());
}

#[test]
fn test_repeated_registration_is_harmless() {
    let (registry, ch) = channel(ReadMode::Queue, &[8]);
    ch.write(b"8").unwrap();
    ch.write(b"8").unwrap();
    assert_eq!(registry.snapshot().unwrap(), vec![8]);
}

#[test]
fn test_read_modes() {
    let (registry, queue_ch) = channel(ReadMode::Queue, &[2, 3]);
    let head_ch = ControlChannel::new(Arc::clone(&registry), ReadMode::Head);

    assert_eq!(queue_ch.read().unwrap(), "");
    assert_eq!(head_ch.read().unwrap(), "");

    for pid in [b"1", b"2", b"3"] {
        queue_ch.write(pid).unwrap();
    }
    assert_eq!(queue_ch.read().unwrap(), "1\n2\n3");
    // pid 1 has no live process behind it
    assert_eq!(head_ch.read().unwrap(), "2");
}

#[test]
fn test_error_replies_carry_distinct_errno() {
    let (registry, ch) = channel(ReadMode::Queue, &[]);
    let invalid = handle_request(&ch, "nope");
    registry.interrupt();
    let interrupted = handle_request(&ch, "5");

    assert!(invalid.starts_with("err 22 "), "{}", invalid);
    assert!(interrupted.starts_with("err 4 "), "{}", interrupted);
}

#[tokio::test]
async fn test_socket_registration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rr-sched.sock");
    let (registry, ch) = channel(ReadMode::Queue, &[41, 42]);
    let server = ControlServer::bind(&path, ch).unwrap();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let serving = tokio::spawn(server.serve(async {
        let _ = stop_rx.await;
    }));

    let stream = UnixStream::connect(&path).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(b"41\n42\nbogus\nread\n").await.unwrap();
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "ok 2");
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "ok 2");
    assert!(lines
        .next_line()
        .await
        .unwrap()
        .unwrap()
        .starts_with("err 22 "));
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "ok 41 42");
    assert_eq!(registry.snapshot().unwrap(), vec![41, 42]);

    stop_tx.send(()).unwrap();
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_bind_replaces_stale_socket_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stale.sock");
    std::fs::write(&path, b"").unwrap();

    let (_, ch) = channel(ReadMode::Queue, &[]);
    let server = ControlServer::bind(&path, ch).unwrap();
    assert_eq!(server.path(), path.as_path());
}

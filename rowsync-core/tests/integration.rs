//! Integration tests — greeting exchange, fragmented frames, and the
//! outgoing row throttle over a real TCP connection on localhost.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Encoder;

use rowsync_core::{
    CLIENT_GREETING, Command, ConnectionInfo, EditorConnection, Interpolation, SERVER_GREETING,
    SyncSession, TrackerCodec,
};

// ── Helpers ──────────────────────────────────────────────────────

/// Spin up a listener on an OS-assigned port and return the connection
/// info. The listener is returned so the caller can accept on it.
async fn ephemeral_listener() -> (TcpListener, ConnectionInfo) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let info = ConnectionInfo::new(addr.ip().to_string(), addr.port());
    (listener, info)
}

/// Editor side of the greeting exchange: verify the client greeting and
/// answer with the server one.
async fn accept_and_greet(listener: &TcpListener) -> TcpStream {
    let (mut stream, _) = listener.accept().await.unwrap();
    let mut greeting = vec![0u8; CLIENT_GREETING.len()];
    stream.read_exact(&mut greeting).await.unwrap();
    assert_eq!(greeting, CLIENT_GREETING);
    stream.write_all(SERVER_GREETING).await.unwrap();
    stream
}

/// Encode one opcode frame the way the editor would.
fn editor_frame(cmd: Command) -> BytesMut {
    let mut codec = TrackerCodec::greeted();
    let mut buf = BytesMut::new();
    codec.encode(cmd, &mut buf).unwrap();
    buf
}

async fn recv_timeout(conn: &mut EditorConnection) -> Option<Command> {
    tokio::time::timeout(Duration::from_secs(5), conn.recv())
        .await
        .expect("timeout waiting for frame")
}

// ── Greeting / handshake ─────────────────────────────────────────

#[tokio::test]
async fn greeting_exchange_yields_handshake() {
    let (listener, info) = ephemeral_listener().await;

    let client = tokio::spawn(async move { EditorConnection::connect(&info).await.unwrap() });
    let _editor = accept_and_greet(&listener).await;
    let mut conn = client.await.unwrap();

    assert_eq!(recv_timeout(&mut conn).await, Some(Command::Handshake));
}

#[tokio::test]
async fn wrong_greeting_closes_the_connection() {
    let (listener, info) = ephemeral_listener().await;

    let client = tokio::spawn(async move { EditorConnection::connect(&info).await.unwrap() });
    let (mut editor, _) = listener.accept().await.unwrap();
    let mut greeting = vec![0u8; CLIENT_GREETING.len()];
    editor.read_exact(&mut greeting).await.unwrap();
    editor.write_all(b"howdy, buddy").await.unwrap();

    let mut conn = client.await.unwrap();
    // the decode error kills the reader task, so the channel just closes
    assert_eq!(recv_timeout(&mut conn).await, None);
}

// ── Fragmentation over a real socket ─────────────────────────────

#[tokio::test]
async fn set_key_survives_byte_at_a_time_delivery() {
    let (listener, info) = ephemeral_listener().await;

    let client = tokio::spawn(async move { EditorConnection::connect(&info).await.unwrap() });
    let mut editor = accept_and_greet(&listener).await;
    let mut conn = client.await.unwrap();
    assert_eq!(recv_timeout(&mut conn).await, Some(Command::Handshake));

    let expected = Command::SetKey {
        track: 3,
        row: 64,
        value: 0.75,
        interpolation: Interpolation::Smooth,
    };
    for byte in editor_frame(expected.clone()) {
        editor.write_all(&[byte]).await.unwrap();
        editor.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    assert_eq!(recv_timeout(&mut conn).await, Some(expected));
}

#[tokio::test]
async fn coalesced_frames_arrive_separately() {
    let (listener, info) = ephemeral_listener().await;

    let client = tokio::spawn(async move { EditorConnection::connect(&info).await.unwrap() });
    let mut editor = accept_and_greet(&listener).await;
    let mut conn = client.await.unwrap();
    assert_eq!(recv_timeout(&mut conn).await, Some(Command::Handshake));

    // one write, three frames
    let mut burst = BytesMut::new();
    burst.extend_from_slice(&editor_frame(Command::SetRow { row: 32 }));
    burst.extend_from_slice(&editor_frame(Command::Pause { paused: true }));
    burst.extend_from_slice(&editor_frame(Command::SaveTracks));
    editor.write_all(&burst).await.unwrap();

    assert_eq!(recv_timeout(&mut conn).await, Some(Command::SetRow { row: 32 }));
    assert_eq!(
        recv_timeout(&mut conn).await,
        Some(Command::Pause { paused: true })
    );
    assert_eq!(recv_timeout(&mut conn).await, Some(Command::SaveTracks));
}

// ── Full session over the wire ───────────────────────────────────

#[tokio::test]
async fn session_populates_track_from_editor_frames() {
    let (listener, info) = ephemeral_listener().await;

    let client = tokio::spawn(async move { EditorConnection::connect(&info).await.unwrap() });
    let mut editor = accept_and_greet(&listener).await;
    let mut conn = client.await.unwrap();

    let mut session = SyncSession::new(conn.sender(), ());
    session.handle_open().unwrap();

    let cmd = recv_timeout(&mut conn).await.unwrap();
    session.handle_command(cmd); // handshake -> Live

    let track = session.get_or_create_track("clear.r").unwrap();

    // the editor should see GET_TRACK {"clear.r"}
    let mut frame = vec![0u8; 1 + 4 + "clear.r".len()];
    editor.read_exact(&mut frame).await.unwrap();
    assert_eq!(frame[0], 2);
    assert_eq!(&frame[1..5], &[0, 0, 0, 7]);
    assert_eq!(&frame[5..], b"clear.r");

    // editor answers with the track contents
    editor
        .write_all(&editor_frame(Command::SetKey {
            track: 0,
            row: 0,
            value: 1.0,
            interpolation: Interpolation::Linear,
        }))
        .await
        .unwrap();
    editor
        .write_all(&editor_frame(Command::SetKey {
            track: 0,
            row: 16,
            value: 0.0,
            interpolation: Interpolation::Linear,
        }))
        .await
        .unwrap();

    for _ in 0..2 {
        let cmd = recv_timeout(&mut conn).await.unwrap();
        session.handle_command(cmd);
    }

    assert_eq!(track.value_at(8.0), 0.5);
}

#[tokio::test]
async fn advance_emits_one_set_row_per_integer_transition() {
    let (listener, info) = ephemeral_listener().await;

    let client = tokio::spawn(async move { EditorConnection::connect(&info).await.unwrap() });
    let mut editor = accept_and_greet(&listener).await;
    let mut conn = client.await.unwrap();

    let mut session = SyncSession::new(conn.sender(), ());
    session.handle_open().unwrap();
    let cmd = recv_timeout(&mut conn).await.unwrap();
    session.handle_command(cmd);

    for row in [2.0f32, 2.25, 2.5, 2.99] {
        session.advance(row).unwrap();
    }

    let mut frame = [0u8; 5];
    editor.read_exact(&mut frame).await.unwrap();
    assert_eq!(frame, [3, 0, 0, 0, 2]);

    // nothing else is in flight while the row stays at 2
    let quiet = tokio::time::timeout(Duration::from_millis(200), editor.read_exact(&mut frame)).await;
    assert!(quiet.is_err(), "unexpected extra frame after throttle");

    session.advance(3.01).unwrap();
    editor.read_exact(&mut frame).await.unwrap();
    assert_eq!(frame, [3, 0, 0, 0, 3]);
}

// ── Disconnect ───────────────────────────────────────────────────

#[tokio::test]
async fn editor_drop_is_observed_as_channel_close() {
    let (listener, info) = ephemeral_listener().await;

    let client = tokio::spawn(async move { EditorConnection::connect(&info).await.unwrap() });
    let editor = accept_and_greet(&listener).await;
    let mut conn = client.await.unwrap();
    assert_eq!(recv_timeout(&mut conn).await, Some(Command::Handshake));

    drop(editor);

    assert_eq!(recv_timeout(&mut conn).await, None);

    let mut session = SyncSession::new(conn.sender(), ());
    session.handle_open().unwrap();
    session.handle_command(Command::Handshake);
    session.handle_close();
    assert!(session.state().is_disconnected());
}

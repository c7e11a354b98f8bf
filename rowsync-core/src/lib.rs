//! # rowsync-core
//!
//! Client library for synchronizing application parameters to playback
//! time, driven live by a Rocket-style sync editor over TCP or populated
//! directly by the host.
//!
//! This crate contains:
//! - **Curve engine**: `Track`, `Key`, `Interpolation` — keyframe storage
//!   and pure value evaluation at arbitrary rows
//! - **Registry**: `TrackRegistry` / `TrackHandle` — name- and
//!   index-addressed shared tracks
//! - **Protocol**: `Opcode`, `Command` — the big-endian wire vocabulary
//! - **Codec**: `TrackerCodec` for framed TCP I/O via `tokio_util`,
//!   tolerant of arbitrary fragmentation and coalescing
//! - **Session**: `SyncSession` — connection state machine, frame
//!   dispatch, and the outgoing row throttle
//! - **Network**: `EditorConnection` for managed TCP connections
//! - **Error**: `SyncError` — typed, `thiserror`-based error hierarchy

pub mod codec;
pub mod error;
pub mod message;
pub mod network;
pub mod registry;
pub mod session;
pub mod state;
pub mod track;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{MAX_NAME_LEN, TrackerCodec};
pub use error::SyncError;
pub use message::{CLIENT_GREETING, Command, Opcode, SERVER_GREETING};
pub use network::{CommandSender, ConnectionInfo, EditorConnection};
pub use registry::{TrackHandle, TrackRegistry};
pub use session::{CommandSink, SessionHandler, SyncSession};
pub use state::SessionState;
pub use track::{Interpolation, Key, Track};

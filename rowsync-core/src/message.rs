//! Wire vocabulary of the sync protocol.
//!
//! One opcode byte followed by a fixed (or, for GET_TRACK,
//! length-prefixed) payload. All multi-byte integers are big-endian.

use std::fmt;

use crate::error::SyncError;
use crate::track::Interpolation;

/// Greeting the client sends immediately after the TCP connect.
pub const CLIENT_GREETING: &[u8] = b"hello, synctracker!";

/// Greeting the editor answers with. Its first byte is `'h'` (104),
/// which doubles as the HANDSHAKE opcode.
pub const SERVER_GREETING: &[u8] = b"hello, demo!";

// ── Opcode ───────────────────────────────────────────────────────

/// Wire opcodes, one byte each.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Insert or replace a key on a track (editor → client).
    SetKey = 0,
    /// Delete a key from a track (editor → client).
    DeleteKey = 1,
    /// Announce interest in a named track (client → editor).
    GetTrack = 2,
    /// Playback position changed (both directions).
    SetRow = 3,
    /// Play/pause toggle (editor → client).
    Pause = 4,
    /// Editor asks the client to persist its tracks (editor → client).
    SaveTracks = 5,
    /// First byte of the server greeting.
    Handshake = 104,
}

impl TryFrom<u8> for Opcode {
    type Error = SyncError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Opcode::SetKey),
            1 => Ok(Opcode::DeleteKey),
            2 => Ok(Opcode::GetTrack),
            3 => Ok(Opcode::SetRow),
            4 => Ok(Opcode::Pause),
            5 => Ok(Opcode::SaveTracks),
            104 => Ok(Opcode::Handshake),
            _ => Err(SyncError::UnknownVariant {
                type_name: "Opcode",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Opcode {
    /// Payload size in bytes after the opcode, for fixed-size frames.
    ///
    /// `None` for GET_TRACK (length-prefixed name) and HANDSHAKE
    /// (greeting string, handled by the codec's pre-handshake state).
    pub fn fixed_payload_len(self) -> Option<usize> {
        match self {
            Opcode::SetKey => Some(13),
            Opcode::DeleteKey => Some(8),
            Opcode::SetRow => Some(4),
            Opcode::Pause => Some(1),
            Opcode::SaveTracks => Some(0),
            Opcode::GetTrack | Opcode::Handshake => None,
        }
    }
}

// ── Command ──────────────────────────────────────────────────────

/// One complete decoded frame.
///
/// The client only ever *sends* `GetTrack` and `SetRow`; the rest arrive
/// from the editor. The codec can encode every opcode frame regardless,
/// which the editor stub in the integration tests relies on.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Server greeting received; the session may go live.
    Handshake,
    /// Insert or replace a key on the track at `track`.
    SetKey {
        track: u32,
        row: i32,
        value: f32,
        interpolation: Interpolation,
    },
    /// Delete the key at `row` from the track at `track`.
    DeleteKey { track: u32, row: i32 },
    /// Announce interest in a named track.
    GetTrack { name: String },
    /// Playback position changed.
    SetRow { row: i32 },
    /// `paused == true` pauses playback, `false` resumes it.
    Pause { paused: bool },
    /// Persist tracks on the client side.
    SaveTracks,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Handshake => Opcode::Handshake,
            Command::SetKey { .. } => Opcode::SetKey,
            Command::DeleteKey { .. } => Opcode::DeleteKey,
            Command::GetTrack { .. } => Opcode::GetTrack,
            Command::SetRow { .. } => Opcode::SetRow,
            Command::Pause { .. } => Opcode::Pause,
            Command::SaveTracks => Opcode::SaveTracks,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.opcode(), f)
    }
}

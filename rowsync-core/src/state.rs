//! Connection state machine for a sync session.
//!
//! Models the lifecycle of the editor link with validated transitions
//! that return `Result` instead of panicking.

use crate::error::SyncError;

// ── SessionState ─────────────────────────────────────────────────

/// The current phase of the editor connection.
///
/// ```text
///  Disconnected ──► AwaitingHandshake ──► Live ◄──► Paused
///       ▲                  │               │          │
///       └──────────────────┴───────────────┴──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No active connection. Initial / terminal state.
    #[default]
    Disconnected,

    /// Transport is open; greeting sent, waiting for the editor's reply.
    AwaitingHandshake,

    /// Handshake complete, playback running.
    Live,

    /// Handshake complete, playback paused by the editor.
    Paused,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::AwaitingHandshake => write!(f, "AwaitingHandshake"),
            Self::Live => write!(f, "Live"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}

impl SessionState {
    /// Returns `true` once the handshake is complete, whether playing
    /// or paused.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Live | Self::Paused)
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transport opened, greeting on the wire.
    ///
    /// Valid from: `Disconnected`.
    pub fn open(&mut self) -> Result<(), SyncError> {
        match self {
            Self::Disconnected => {
                *self = Self::AwaitingHandshake;
                Ok(())
            }
            _ => Err(SyncError::ProtocolViolation(
                "cannot open: not in Disconnected state",
            )),
        }
    }

    /// Editor greeting received, session goes live.
    ///
    /// Valid from: `AwaitingHandshake`.
    pub fn complete_handshake(&mut self) -> Result<(), SyncError> {
        match self {
            Self::AwaitingHandshake => {
                *self = Self::Live;
                Ok(())
            }
            _ => Err(SyncError::ProtocolViolation(
                "cannot complete handshake: not in AwaitingHandshake state",
            )),
        }
    }

    /// Apply a PAUSE frame.
    ///
    /// Valid from: `Live`, `Paused`. The editor may repeat the current
    /// direction; that is not a transition error.
    pub fn set_paused(&mut self, paused: bool) -> Result<(), SyncError> {
        match self {
            Self::Live | Self::Paused => {
                *self = if paused { Self::Paused } else { Self::Live };
                Ok(())
            }
            _ => Err(SyncError::ProtocolViolation(
                "cannot pause/resume: handshake not complete",
            )),
        }
    }

    /// Force-reset to `Disconnected` from any state.
    ///
    /// Used on transport close or error.
    pub fn reset(&mut self) {
        *self = Self::Disconnected;
    }
}

// ── Tests ────────────────────────────────────────────────────────

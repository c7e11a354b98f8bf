//! The synchronization session.
//!
//! [`SyncSession`] owns the track registry and the connection state
//! machine. Decoded frames come in through [`SyncSession::handle_command`],
//! host-side playback drives [`SyncSession::advance`], and everything the
//! host needs to react to is surfaced through the [`SessionHandler`]
//! observer. The session never blocks: outgoing frames go through a
//! [`CommandSink`] and return immediately.

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::SyncError;
use crate::message::Command;
use crate::registry::{TrackHandle, TrackRegistry};
use crate::state::SessionState;
use crate::track::Key;

// ── SessionHandler ───────────────────────────────────────────────

/// Host-facing lifecycle events.
///
/// Every method defaults to a no-op, so hosts implement only what they
/// care about.
pub trait SessionHandler {
    /// Handshake complete; tracks may now be requested and populated.
    fn on_ready(&mut self) {}
    /// The editor seeked; the host should jump playback to `row`.
    fn on_row_changed(&mut self, _row: i32) {}
    /// The editor paused playback.
    fn on_pause(&mut self) {}
    /// The editor resumed playback.
    fn on_play(&mut self) {}
    /// The editor asked the client to persist its tracks.
    fn on_save_requested(&mut self) {}
    /// A key was added or removed on some track.
    fn on_update(&mut self) {}
    /// The transport closed or failed; the session is back to Disconnected.
    fn on_disconnect(&mut self) {}
}

/// A host that ignores every event.
impl SessionHandler for () {}

// ── CommandSink ──────────────────────────────────────────────────

/// Outgoing seam between the session and its transport.
pub trait CommandSink {
    /// Queue one frame for the peer without blocking.
    fn send(&mut self, cmd: Command) -> Result<(), SyncError>;
}

/// Production sink: the connection's writer-task channel.
impl CommandSink for mpsc::UnboundedSender<Command> {
    fn send(&mut self, cmd: Command) -> Result<(), SyncError> {
        mpsc::UnboundedSender::send(self, cmd).map_err(SyncError::from)
    }
}

/// Buffering sink for tests and offline hosts.
impl CommandSink for Vec<Command> {
    fn send(&mut self, cmd: Command) -> Result<(), SyncError> {
        self.push(cmd);
        Ok(())
    }
}

// ── SyncSession ──────────────────────────────────────────────────

/// Client-side session state machine.
///
/// Explicitly constructed and self-contained: the session owns its
/// registry, sink, and handler, and no state lives outside it.
#[derive(Debug)]
pub struct SyncSession<S, H> {
    state: SessionState,
    registry: TrackRegistry,
    sink: S,
    handler: H,
    last_sent_row: Option<i32>,
}

impl<S: CommandSink, H: SessionHandler> SyncSession<S, H> {
    pub fn new(sink: S, handler: H) -> Self {
        Self {
            state: SessionState::Disconnected,
            registry: TrackRegistry::new(),
            sink,
            handler,
            last_sent_row: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Transport lifecycle ──────────────────────────────────────

    /// The transport is up and the client greeting is on the wire;
    /// start waiting for the editor's handshake.
    pub fn handle_open(&mut self) -> Result<(), SyncError> {
        self.state.open()
    }

    /// The transport closed or errored.
    ///
    /// The partial-frame buffer dies with the connection's codec; here we
    /// reset the state machine and the row-throttle memo so a reconnected
    /// session starts clean. Tracks and their indices survive.
    pub fn handle_close(&mut self) {
        if self.state.is_disconnected() {
            return;
        }
        self.state.reset();
        self.last_sent_row = None;
        self.handler.on_disconnect();
    }

    // ── Inbound dispatch ─────────────────────────────────────────

    /// Apply one decoded frame.
    ///
    /// Anomalies from a misbehaving peer (unknown track indices, frames
    /// before the handshake) are logged and ignored — never fatal.
    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Handshake => {
                if self.state.complete_handshake().is_err() {
                    warn!(state = %self.state, "ignoring unexpected handshake");
                    return;
                }
                if let Err(e) = self.announce_all_tracks() {
                    warn!(error = %e, "failed to announce tracks after handshake");
                }
                self.handler.on_ready();
            }
            cmd if !self.state.is_connected() => {
                warn!(%cmd, state = %self.state, "ignoring frame before handshake");
            }
            Command::SetKey {
                track,
                row,
                value,
                interpolation,
            } => match self.registry.by_index(track) {
                Some(handle) => {
                    handle.add(Key::new(row, value, interpolation));
                    self.handler.on_update();
                }
                None => warn!(track, "SET_KEY for unknown track index"),
            },
            Command::DeleteKey { track, row } => match self.registry.by_index(track) {
                Some(handle) => {
                    handle.remove(row);
                    self.handler.on_update();
                }
                None => warn!(track, "DELETE_KEY for unknown track index"),
            },
            Command::SetRow { row } => self.handler.on_row_changed(row),
            Command::Pause { paused } => {
                // Cannot fail: the guard arm above ensures we are connected.
                let _ = self.state.set_paused(paused);
                if paused {
                    self.handler.on_pause();
                } else {
                    self.handler.on_play();
                }
            }
            Command::SaveTracks => self.handler.on_save_requested(),
            Command::GetTrack { name } => {
                warn!(name = %name, "ignoring inbound GET_TRACK");
            }
        }
    }

    // ── Host surface ─────────────────────────────────────────────

    /// Report the current playback position, possibly fractional.
    ///
    /// Emits a SET_ROW frame only when `floor(row)` differs from the
    /// previously sent integer row, so fractional-only movement never
    /// generates traffic and outgoing bandwidth is bounded by one frame
    /// per row transition.
    pub fn advance(&mut self, row: f32) -> Result<(), SyncError> {
        if !self.state.is_connected() {
            return Ok(());
        }
        let int_row = row.floor() as i32;
        if self.last_sent_row == Some(int_row) {
            return Ok(());
        }
        self.sink.send(Command::SetRow { row: int_row })?;
        self.last_sent_row = Some(int_row);
        Ok(())
    }

    /// Look up a track by name, creating it locally on first request.
    ///
    /// New names are announced to the editor with GET_TRACK when the
    /// session is connected; names requested while offline are announced
    /// by the next handshake instead. The handle stays valid for the
    /// lifetime of the session.
    pub fn get_or_create_track(&mut self, name: &str) -> Result<TrackHandle, SyncError> {
        let known = self.registry.index_of(name).is_some();
        if !known && self.state.is_connected() {
            self.sink.send(Command::GetTrack {
                name: name.to_owned(),
            })?;
        }
        let (_, handle) = self.registry.get_or_create(name);
        Ok(handle)
    }

    /// Re-request every known track, oldest index first.
    ///
    /// The editor assigns its own indices in GET_TRACK arrival order, so
    /// announcing in our index order keeps both sides aligned. Stale keys
    /// are dropped first; the editor resends the full track contents.
    fn announce_all_tracks(&mut self) -> Result<(), SyncError> {
        for handle in self.registry.handles() {
            handle.clear();
        }
        for name in self.registry.names() {
            self.sink.send(Command::GetTrack { name })?;
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

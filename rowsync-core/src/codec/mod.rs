//! Incremental frame codec for the editor byte stream.
//!
//! The transport delivers an ordered byte stream with no alignment
//! guarantees: one frame may arrive split across several reads, and one
//! read may carry several frames. [`TrackerCodec`] therefore follows the
//! `tokio_util` decoder contract — `Ok(None)` consumes nothing and asks
//! for more bytes, and `Framed` loops `decode` until it returns `None`.
//!
//! A fresh codec is built per connection, so dropping the connection
//! discards any buffered partial frame; decoding after a reconnect always
//! starts from a clean state.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::SyncError;
use crate::message::{Command, Opcode, SERVER_GREETING};
use crate::track::Interpolation;

/// Upper bound on a GET_TRACK name, as a hostile-length guard.
pub const MAX_NAME_LEN: usize = 4096;

/// Codec for the Rocket editor protocol.
///
/// Starts in a pre-handshake state that expects the literal server
/// greeting; everything after that is opcode-framed.
#[derive(Debug, Default)]
pub struct TrackerCodec {
    greeted: bool,
}

impl TrackerCodec {
    /// Codec for a fresh connection, greeting still pending.
    pub fn new() -> Self {
        Self { greeted: false }
    }

    /// Codec for a stream that is already past the greeting exchange.
    pub fn greeted() -> Self {
        Self { greeted: true }
    }
}

impl Decoder for TrackerCodec {
    type Item = Command;
    type Error = SyncError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Command>, SyncError> {
        if !self.greeted {
            if src.len() < SERVER_GREETING.len() {
                return Ok(None);
            }
            let greeting = src.split_to(SERVER_GREETING.len());
            if greeting[..] != *SERVER_GREETING {
                return Err(SyncError::InvalidGreeting);
            }
            self.greeted = true;
            return Ok(Some(Command::Handshake));
        }

        loop {
            let Some(&opcode) = src.first() else {
                return Ok(None);
            };
            let op = match Opcode::try_from(opcode) {
                Ok(op) => op,
                Err(_) => {
                    // Non-fatal per protocol policy: skip the byte and
                    // resume at what should be the next frame.
                    warn!(opcode, "skipping unknown opcode");
                    src.advance(1);
                    continue;
                }
            };

            if let Some(payload) = op.fixed_payload_len() {
                if src.len() < 1 + payload {
                    return Ok(None);
                }
            }

            match op {
                Opcode::SetKey => {
                    src.advance(1);
                    let track = src.get_u32();
                    let row = src.get_i32();
                    let value = src.get_f32();
                    let raw = src.get_u8();
                    match Interpolation::try_from(raw) {
                        Ok(interpolation) => {
                            return Ok(Some(Command::SetKey {
                                track,
                                row,
                                value,
                                interpolation,
                            }));
                        }
                        Err(_) => {
                            // Frame already consumed; the stream stays
                            // aligned, only this key is lost.
                            warn!(raw, "dropping SET_KEY with unknown interpolation");
                            continue;
                        }
                    }
                }
                Opcode::DeleteKey => {
                    src.advance(1);
                    let track = src.get_u32();
                    let row = src.get_i32();
                    return Ok(Some(Command::DeleteKey { track, row }));
                }
                Opcode::GetTrack => {
                    // The total frame size depends on the 4-byte length
                    // prefix, so that must be readable first.
                    if src.len() < 5 {
                        return Ok(None);
                    }
                    let len = u32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
                    if len > MAX_NAME_LEN {
                        return Err(SyncError::NameTooLong {
                            len,
                            max: MAX_NAME_LEN,
                        });
                    }
                    if src.len() < 5 + len {
                        return Ok(None);
                    }
                    src.advance(5);
                    let name = String::from_utf8(src.split_to(len).to_vec())?;
                    return Ok(Some(Command::GetTrack { name }));
                }
                Opcode::SetRow => {
                    src.advance(1);
                    return Ok(Some(Command::SetRow { row: src.get_i32() }));
                }
                Opcode::Pause => {
                    src.advance(1);
                    return Ok(Some(Command::Pause {
                        paused: src.get_u8() != 0,
                    }));
                }
                Opcode::SaveTracks => {
                    src.advance(1);
                    return Ok(Some(Command::SaveTracks));
                }
                Opcode::Handshake => {
                    // An 'h' mid-stream after the greeting is a stray byte.
                    warn!("skipping stray handshake byte");
                    src.advance(1);
                    continue;
                }
            }
        }
    }
}

impl Encoder<Command> for TrackerCodec {
    type Error = SyncError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), SyncError> {
        match item {
            Command::SetKey {
                track,
                row,
                value,
                interpolation,
            } => {
                dst.reserve(14);
                dst.put_u8(Opcode::SetKey as u8);
                dst.put_u32(track);
                dst.put_i32(row);
                dst.put_f32(value);
                dst.put_u8(interpolation as u8);
            }
            Command::DeleteKey { track, row } => {
                dst.reserve(9);
                dst.put_u8(Opcode::DeleteKey as u8);
                dst.put_u32(track);
                dst.put_i32(row);
            }
            Command::GetTrack { name } => {
                if name.len() > MAX_NAME_LEN {
                    return Err(SyncError::NameTooLong {
                        len: name.len(),
                        max: MAX_NAME_LEN,
                    });
                }
                dst.reserve(5 + name.len());
                dst.put_u8(Opcode::GetTrack as u8);
                dst.put_u32(name.len() as u32);
                dst.put_slice(name.as_bytes());
            }
            Command::SetRow { row } => {
                dst.reserve(5);
                dst.put_u8(Opcode::SetRow as u8);
                dst.put_i32(row);
            }
            Command::Pause { paused } => {
                dst.reserve(2);
                dst.put_u8(Opcode::Pause as u8);
                dst.put_u8(paused as u8);
            }
            Command::SaveTracks => {
                dst.put_u8(Opcode::SaveTracks as u8);
            }
            Command::Handshake => {
                return Err(SyncError::ProtocolViolation(
                    "the handshake greeting is not an opcode frame",
                ));
            }
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

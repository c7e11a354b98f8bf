//! Keyframed curve engine.
//!
//! A [`Track`] is one named parameter's timeline: a strictly row-sorted
//! sequence of [`Key`]s plus a pure evaluator that answers the parameter's
//! value at any (possibly fractional) playback row.

use std::fmt;

use crate::error::SyncError;

// ── Interpolation ────────────────────────────────────────────────

/// How the curve moves from a key to the next one.
///
/// Discriminants are the on-wire values of the SET_KEY frame's
/// `interpolation` byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Hold the key's value until the next key.
    #[default]
    Step = 0,
    /// Straight line to the next key.
    Linear = 1,
    /// Smoothstep ease-in/ease-out.
    Smooth = 2,
    /// Quadratic ease-in.
    Ramp = 3,
}

impl TryFrom<u8> for Interpolation {
    type Error = SyncError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Interpolation::Step),
            1 => Ok(Interpolation::Linear),
            2 => Ok(Interpolation::Smooth),
            3 => Ok(Interpolation::Ramp),
            _ => Err(SyncError::UnknownVariant {
                type_name: "Interpolation",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Interpolation {
    /// Blend `a` toward `b` at normalized position `t` in `[0, 1]`.
    pub fn blend(self, a: f32, b: f32, t: f32) -> f32 {
        match self {
            Interpolation::Step => a,
            Interpolation::Linear => a + (b - a) * t,
            Interpolation::Smooth => a + (b - a) * (t * t * (3.0 - 2.0 * t)),
            Interpolation::Ramp => a + (b - a) * (t * t),
        }
    }
}

// ── Key ──────────────────────────────────────────────────────────

/// A single keyframe: an anchor point on a [`Track`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key {
    /// Playback row the key sits on. Unique within a track.
    pub row: i32,
    /// Parameter value at that row, full f32 precision.
    pub value: f32,
    /// How to travel from this key to the next.
    pub interpolation: Interpolation,
}

impl Key {
    pub fn new(row: i32, value: f32, interpolation: Interpolation) -> Self {
        Self {
            row,
            value,
            interpolation,
        }
    }
}

// ── Track ────────────────────────────────────────────────────────

/// One parameter's keyframe timeline.
///
/// Invariant: `keys` is strictly ascending by row — no duplicates, always
/// sorted after every mutation. Insertion keeps the order via binary
/// search rather than append-and-resort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    keys: Vec<Key>,
}

impl Track {
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Insert a key, replacing any existing key on the same row.
    ///
    /// Every row/value combination is accepted; there is no error case.
    pub fn add(&mut self, key: Key) {
        match self.keys.binary_search_by_key(&key.row, |k| k.row) {
            Ok(i) => self.keys[i] = key,
            Err(i) => self.keys.insert(i, key),
        }
    }

    /// Delete the key at `row`. Silently does nothing if no key is there.
    pub fn remove(&mut self, row: i32) {
        if let Ok(i) = self.keys.binary_search_by_key(&row, |k| k.row) {
            self.keys.remove(i);
        }
    }

    /// Evaluate the track at `row`.
    ///
    /// Pure and side-effect-free; safe at arbitrary fractional rows.
    /// Never extrapolates: rows at or before the first key return the
    /// first key's value, rows at or past the last key return the last
    /// key's value. An empty track answers the sentinel `0.0`.
    pub fn value_at(&self, row: f32) -> f32 {
        if self.keys.is_empty() {
            return 0.0;
        }

        // Index of the first key strictly after `row`; the bracketing
        // pair is then (upper - 1, upper).
        let upper = self.keys.partition_point(|k| (k.row as f32) <= row);
        if upper == 0 {
            return self.keys[0].value;
        }
        if upper == self.keys.len() {
            return self.keys[upper - 1].value;
        }

        let lo = &self.keys[upper - 1];
        let hi = &self.keys[upper];
        let t = (row - lo.row as f32) / ((hi.row - lo.row) as f32);
        lo.interpolation.blend(lo.value, hi.value, t)
    }

    /// Number of keys on the track.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The keys in ascending row order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Drop every key, keeping the track itself alive.
    ///
    /// Used when a reconnected editor is about to resend the full track.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

// ── Tests ────────────────────────────────────────────────────────

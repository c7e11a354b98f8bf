//! Ordered collection of named tracks.
//!
//! Inbound frames reference tracks only by numeric index, so the
//! registry's index assignment must mirror the editor's: monotonic, in
//! order of first request, for the lifetime of the session. Tracks are
//! created lazily and never removed — only their keys change.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::track::{Key, Track};

// ── TrackHandle ──────────────────────────────────────────────────

/// Shared, cheaply clonable handle to one track.
///
/// The host's render loop samples values through this handle while the
/// connection task applies edits; the lock guarantees `value_at` never
/// observes a half-applied key insertion.
#[derive(Debug, Clone, Default)]
pub struct TrackHandle {
    inner: Arc<RwLock<Track>>,
}

impl TrackHandle {
    fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Track::new())),
        }
    }

    /// Evaluate the track at `row`. See [`Track::value_at`].
    pub fn value_at(&self, row: f32) -> f32 {
        self.read(|t| t.value_at(row))
    }

    /// Insert or replace a key.
    pub fn add(&self, key: Key) {
        self.write(|t| t.add(key));
    }

    /// Delete the key at `row` if present.
    pub fn remove(&self, row: i32) {
        self.write(|t| t.remove(row));
    }

    /// Drop all keys (reconnect repopulation).
    pub fn clear(&self) {
        self.write(Track::clear);
    }

    /// Number of keys currently on the track.
    pub fn key_count(&self) -> usize {
        self.read(Track::len)
    }

    /// Run `f` against a snapshot of the track.
    pub fn with<R>(&self, f: impl FnOnce(&Track) -> R) -> R {
        self.read(f)
    }

    // A poisoned lock only means a panic elsewhere mid-write of a 12-byte
    // key; the data is still usable, so recover instead of propagating.
    fn read<R>(&self, f: impl FnOnce(&Track) -> R) -> R {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Track) -> R) -> R {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner))
    }
}

// ── TrackRegistry ────────────────────────────────────────────────

/// Name- and index-addressed track storage.
#[derive(Debug, Default)]
pub struct TrackRegistry {
    indices: HashMap<String, u32>,
    tracks: Vec<TrackHandle>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, if it was requested before.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.indices.get(name).copied()
    }

    /// Return the existing track for `name`, or allocate the next index
    /// and an empty track.
    pub fn get_or_create(&mut self, name: &str) -> (u32, TrackHandle) {
        if let Some(index) = self.index_of(name) {
            return (index, self.tracks[index as usize].clone());
        }
        let index = self.tracks.len() as u32;
        let handle = TrackHandle::new();
        self.indices.insert(name.to_owned(), index);
        self.tracks.push(handle.clone());
        (index, handle)
    }

    /// Track at a peer-supplied index. `None` for out-of-range values —
    /// a misbehaving editor must not crash the session.
    pub fn by_index(&self, index: u32) -> Option<TrackHandle> {
        self.tracks.get(index as usize).cloned()
    }

    /// Number of tracks requested so far.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Track names in index order.
    pub fn names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.tracks.len()];
        for (name, &index) in &self.indices {
            names[index as usize] = name.clone();
        }
        names
    }

    /// Handles in index order.
    pub fn handles(&self) -> &[TrackHandle] {
        &self.tracks
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Interpolation;

    #[test]
    fn indices_assigned_in_request_order() {
        let mut reg = TrackRegistry::new();
        let (a, _) = reg.get_or_create("clear.r");
        let (b, _) = reg.get_or_create("clear.g");
        let (c, _) = reg.get_or_create("camera.x");
        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(reg.names(), vec!["clear.r", "clear.g", "camera.x"]);
    }

    #[test]
    fn get_or_create_is_stable() {
        let mut reg = TrackRegistry::new();
        let (a, first) = reg.get_or_create("clear.r");
        first.add(Key::new(0, 1.0, Interpolation::Step));
        let (b, second) = reg.get_or_create("clear.r");
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
        // same underlying track
        assert_eq!(second.key_count(), 1);
    }

    #[test]
    fn by_index_out_of_range_is_none() {
        let mut reg = TrackRegistry::new();
        reg.get_or_create("clear.r");
        assert!(reg.by_index(0).is_some());
        assert!(reg.by_index(1).is_none());
        assert!(reg.by_index(u32::MAX).is_none());
    }

    #[test]
    fn handle_mutations_visible_through_clones() {
        let mut reg = TrackRegistry::new();
        let (_, writer) = reg.get_or_create("fov");
        let reader = reg.by_index(0).unwrap();
        writer.add(Key::new(0, 60.0, Interpolation::Step));
        assert_eq!(reader.value_at(0.0), 60.0);
        writer.remove(0);
        assert_eq!(reader.key_count(), 0);
    }
}

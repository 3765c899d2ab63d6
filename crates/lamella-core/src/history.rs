//! Configuration snapshots and the bounded undo/redo buffer.
//!
//! The history collaborator stores *input configurations* as opaque
//! snapshots; the core guarantees round-trip equality and nothing else
//! interprets the payload. The buffer holds a fixed number of states
//! (default 5): pushing evicts the oldest beyond capacity, and a new push
//! after undo discards the redo-forward tail.

use serde::{Deserialize, Serialize};

use crate::types::{DisplayOptions, RangeSpec, Stack};

/// The full input configuration of one computation request: stack, both
/// sweep ranges with their fixed companions, and display options.
/// Sufficient to reconstruct an identical computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub stack: Stack,
    /// Wavelength sweep range.
    pub spectral: RangeSpec,
    /// Fixed angle of incidence for the spectral sweep (degrees).
    pub spectral_angle_deg: f64,
    /// Angle sweep range (degrees).
    pub angular: RangeSpec,
    /// Fixed wavelength for the angular sweep (nm).
    pub angular_wavelength_nm: f64,
    #[serde(default)]
    pub finite_substrate: bool,
    #[serde(default)]
    pub display: DisplayOptions,
}

/// An opaque serialized configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(String);

impl Snapshot {
    /// Capture a configuration. Serialization of these plain-data types
    /// cannot fail.
    pub fn capture(config: &SessionConfig) -> Self {
        Self(serde_json::to_string(config).expect("plain-data config serializes"))
    }

    /// Reconstruct the configuration held by this snapshot.
    pub fn restore(&self) -> Result<SessionConfig, serde_json::Error> {
        serde_json::from_str(&self.0)
    }

    /// The raw payload, for persistence by external collaborators.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fixed-capacity undo/redo ring over configuration snapshots.
///
/// The cursor points at the current state. `undo`/`redo` move the cursor
/// without dropping entries; `push` truncates everything after the cursor
/// (the redo tail) before appending.
#[derive(Debug)]
pub struct HistoryBuffer {
    snapshots: Vec<Snapshot>,
    cursor: usize,
    capacity: usize,
}

/// Default number of retained states.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history needs room for at least one state");
        Self {
            snapshots: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.is_empty() && self.cursor + 1 < self.snapshots.len()
    }

    /// Record a new state. Discards any redo-forward entries, then evicts
    /// the oldest state if the buffer is full.
    pub fn push(&mut self, snapshot: Snapshot) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.capacity {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step back one state, if any remains behind the cursor.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Step forward one state, if the cursor was moved back.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    /// The current state, if any.
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Layer;

    fn config(thickness_nm: f64) -> SessionConfig {
        SessionConfig {
            stack: Stack::with_layers(
                "Air",
                vec![Layer::new("MgF2", thickness_nm)],
                "Glass_BK7",
            ),
            spectral: RangeSpec::Count {
                start: 400.0,
                stop: 700.0,
                points: 301,
            },
            spectral_angle_deg: 0.0,
            angular: RangeSpec::Step {
                start: 0.0,
                stop: 89.0,
                step: 1.0,
            },
            angular_wavelength_nm: 550.0,
            finite_substrate: false,
            display: DisplayOptions::default(),
        }
    }

    #[test]
    fn snapshot_round_trips_exactly() {
        let original = config(99.6);
        let snapshot = Snapshot::capture(&original);
        assert_eq!(snapshot.restore().unwrap(), original);
    }

    #[test]
    fn undo_and_redo_move_the_cursor_without_loss() {
        let mut history = HistoryBuffer::default();
        history.push(Snapshot::capture(&config(1.0)));
        history.push(Snapshot::capture(&config(2.0)));
        history.push(Snapshot::capture(&config(3.0)));

        let back = history.undo().unwrap().restore().unwrap();
        assert_eq!(back.stack.layers[0].thickness_nm, 2.0);
        let back = history.undo().unwrap().restore().unwrap();
        assert_eq!(back.stack.layers[0].thickness_nm, 1.0);
        assert!(!history.can_undo());

        let forward = history.redo().unwrap().restore().unwrap();
        assert_eq!(forward.stack.layers[0].thickness_nm, 2.0);
        assert!(history.can_redo());
    }

    #[test]
    fn push_after_undo_discards_the_redo_tail() {
        let mut history = HistoryBuffer::default();
        history.push(Snapshot::capture(&config(1.0)));
        history.push(Snapshot::capture(&config(2.0)));
        history.undo();
        history.push(Snapshot::capture(&config(9.0)));

        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        let current = history.current().unwrap().restore().unwrap();
        assert_eq!(current.stack.layers[0].thickness_nm, 9.0);
    }

    #[test]
    fn capacity_evicts_the_oldest_state() {
        let mut history = HistoryBuffer::new(5);
        for i in 1..=7 {
            history.push(Snapshot::capture(&config(i as f64)));
        }
        assert_eq!(history.len(), 5);

        // Walk all the way back: the oldest reachable state is 3.
        let mut oldest = None;
        while let Some(snapshot) = history.undo() {
            oldest = Some(snapshot.restore().unwrap());
        }
        assert_eq!(oldest.unwrap().stack.layers[0].thickness_nm, 3.0);
    }
}

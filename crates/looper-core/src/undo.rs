//! Undo/redo history over the active loop region
//!
//! A fixed ring of snapshot slots, each as large as the sample buffer, so any
//! region fits. Slots are allocated once at setup; save/undo/redo only copy
//! or swap samples.
//!
//! # Cursor model
//!
//! ```text
//! save:  slot[write] ← region      write = read = write + 1
//! undo:  read -= 1                  slot[read] ⇄ region
//! redo:  slot[read] ⇄ region        read += 1
//! ```
//!
//! Undo swaps instead of copying, so the content it replaces stays in the
//! slot and redo can bring it back. History is linear: a save after undo
//! writes at the read cursor and drops whatever could have been redone.

use crate::buffer::{LoopRegion, SampleBuffer};
use crate::types::{Sample, MAX_UNDO_LEVELS};

/// Fixed-depth ring of region snapshots
#[derive(Debug)]
pub struct UndoHistory {
    /// Snapshot storage, one slot per level
    slots: Vec<Box<[Sample]>>,
    /// Slot the next save writes to
    write_index: usize,
    /// Slot boundary undo/redo step from
    read_index: usize,
    /// Snapshots reachable by undo
    undo_depth: usize,
    /// Snapshots reachable by redo
    redo_depth: usize,
}

impl UndoHistory {
    /// Build a history from pre-allocated slots
    ///
    /// Slots beyond [`MAX_UNDO_LEVELS`] are dropped. An empty list gives a
    /// history where every operation is a no-op.
    pub fn new(mut slots: Vec<Vec<Sample>>) -> Self {
        if slots.len() > MAX_UNDO_LEVELS {
            log::warn!(
                "undo: {} snapshot slots supplied, using the first {}",
                slots.len(),
                MAX_UNDO_LEVELS
            );
            slots.truncate(MAX_UNDO_LEVELS);
        }
        Self {
            slots: slots.into_iter().map(Vec::into_boxed_slice).collect(),
            write_index: 0,
            read_index: 0,
            undo_depth: 0,
            redo_depth: 0,
        }
    }

    /// Number of configured snapshot slots
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_depth
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_depth
    }

    pub fn can_undo(&self) -> bool {
        self.undo_depth > 0
    }

    pub fn can_redo(&self) -> bool {
        self.redo_depth > 0
    }

    /// Snapshot the region's current content
    ///
    /// Once all slots are in use the oldest snapshot is overwritten.
    pub fn save(&mut self, buffer: &SampleBuffer, region: &LoopRegion) {
        let count = self.count();
        if count == 0 {
            return;
        }
        self.write_index = self.read_index;
        buffer.copy_region_into(region, &mut self.slots[self.write_index]);
        self.write_index = (self.write_index + 1) % count;
        self.read_index = self.write_index;
        self.undo_depth = (self.undo_depth + 1).min(count);
        self.redo_depth = 0;
    }

    /// Restore the most recent snapshot into the region
    ///
    /// Returns `false` (buffer untouched) when nothing is left to undo.
    pub fn undo(&mut self, buffer: &mut SampleBuffer, region: &LoopRegion) -> bool {
        let count = self.count();
        if self.undo_depth == 0 || count == 0 {
            return false;
        }
        self.read_index = (self.read_index + count - 1) % count;
        buffer.swap_region(region, &mut self.slots[self.read_index]);
        self.undo_depth -= 1;
        self.redo_depth = (self.redo_depth + 1).min(count - 1);
        true
    }

    /// Re-apply the most recently undone change
    ///
    /// Returns `false` (buffer untouched) when nothing is left to redo.
    pub fn redo(&mut self, buffer: &mut SampleBuffer, region: &LoopRegion) -> bool {
        let count = self.count();
        if self.redo_depth == 0 || count == 0 {
            return false;
        }
        buffer.swap_region(region, &mut self.slots[self.read_index]);
        self.read_index = (self.read_index + 1) % count;
        self.undo_depth = (self.undo_depth + 1).min(count);
        self.redo_depth -= 1;
        true
    }

    /// Forget every snapshot (loop cleared)
    pub fn clear(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.undo_depth = 0;
        self.redo_depth = 0;
    }
}

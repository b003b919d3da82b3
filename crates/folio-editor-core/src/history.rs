//! Undo/redo history for notes.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `SnapshotHistory` - a bounded stack of `{title, content}` snapshots
//!
//! Snapshots are whole-note copies rather than edit operations: formatting
//! changes rewrite arbitrary parts of the tree, and notes are small.

use std::time::Duration;

use web_time::Instant;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// A recorded state of the note.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub title: String,
    /// Serialized HTML of the surface.
    pub content: String,
}

impl Snapshot {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Linear, size-bounded snapshot history.
///
/// The entry at the top of `undo_stack` is the current state; undo moves
/// it to the redo stack and exposes the one below.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_steps: usize,
    debounce: Duration,
    last_record: Option<Instant>,
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new(50, Duration::from_millis(1000))
    }
}

impl SnapshotHistory {
    pub fn new(max_steps: usize, debounce: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps: max_steps.max(1),
            debounce,
            last_record: None,
        }
    }

    /// The state the history currently points at.
    pub fn current(&self) -> Option<&Snapshot> {
        self.undo_stack.last()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Record a new state observed at `at`.
    ///
    /// Identical states are ignored. A record within the debounce window of
    /// the previous one replaces the top entry instead of pushing, so a burst
    /// of keystrokes becomes one undo step. Returns true if anything changed.
    pub fn record(&mut self, snapshot: Snapshot, at: Instant) -> bool {
        if self.current() == Some(&snapshot) {
            return false;
        }
        self.redo_stack.clear();

        let coalesce = self.undo_stack.len() > 1
            && self
                .last_record
                .is_some_and(|last| at.saturating_duration_since(last) < self.debounce);
        self.last_record = Some(at);

        if coalesce {
            if let Some(top) = self.undo_stack.last_mut() {
                *top = snapshot;
            }
            tracing::trace!(target: "folio::history", depth = self.undo_stack.len(), "coalesced snapshot");
            return true;
        }

        self.undo_stack.push(snapshot);
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
        tracing::trace!(target: "folio::history", depth = self.undo_stack.len(), "recorded snapshot");
        true
    }

    /// Start a fresh history at a loaded state.
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.clear_history();
        self.undo_stack.push(snapshot);
    }
}

impl UndoManager for SnapshotHistory {
    fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        let Some(top) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(top);
        // The next record must not coalesce into the restored state.
        self.last_record = None;
        tracing::debug!(target: "folio::history", depth = self.undo_stack.len(), "undo");
        true
    }

    fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(next);
        self.last_record = None;
        tracing::debug!(target: "folio::history", depth = self.undo_stack.len(), "redo");
        true
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last_record = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(content: &str) -> Snapshot {
        Snapshot::new("Note", content)
    }

    #[test]
    fn test_undo_redo_walks_snapshots() {
        let t0 = Instant::now();
        let mut history = SnapshotHistory::new(50, Duration::ZERO);
        history.reset(snap("a"));
        history.record(snap("ab"), t0);
        history.record(snap("abc"), t0 + Duration::from_secs(2));

        assert!(history.undo());
        assert_eq!(history.current().unwrap().content, "ab");
        assert!(history.undo());
        assert_eq!(history.current().unwrap().content, "a");
        assert!(!history.undo());

        assert!(history.redo());
        assert_eq!(history.current().unwrap().content, "ab");
        history.record(snap("abx"), t0 + Duration::from_secs(5));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_identical_state_is_ignored() {
        let mut history = SnapshotHistory::default();
        history.reset(snap("a"));
        assert!(!history.record(snap("a"), Instant::now()));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_burst_coalesces() {
        let t0 = Instant::now();
        let mut history = SnapshotHistory::new(50, Duration::from_millis(1000));
        history.reset(snap(""));
        history.record(snap("h"), t0);
        history.record(snap("he"), t0 + Duration::from_millis(300));
        history.record(snap("hey"), t0 + Duration::from_millis(600));
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().unwrap().content, "hey");

        history.record(snap("hey!"), t0 + Duration::from_millis(2000));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let t0 = Instant::now();
        let mut history = SnapshotHistory::new(3, Duration::ZERO);
        for (i, c) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            history.record(snap(c), t0 + Duration::from_secs(i as u64));
        }
        assert_eq!(history.len(), 3);
        history.undo();
        history.undo();
        assert_eq!(history.current().unwrap().content, "c");
    }
}

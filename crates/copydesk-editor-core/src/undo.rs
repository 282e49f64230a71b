//! Undo/redo history of paired plain-text and HTML snapshots.
//!
//! The plain and HTML sequences are stored as one sequence of pairs, so they
//! always have the same length and share a single cursor. Duplicate detection
//! compares the plain half only: an edit that changes markup but not text
//! (e.g. toggling bold) replaces nothing and creates no step.

use std::collections::VecDeque;

use crate::config::DEFAULT_HISTORY_CAPACITY;

/// One undo/redo step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub plain: String,
    pub html: String,
}

/// Bounded linear history with a shared cursor.
#[derive(Debug, Clone)]
pub struct DualHistory {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    capacity: usize,
}

impl Default for DualHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl DualHistory {
    /// Create an empty history holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the current entry. Meaningless while empty.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    /// Record a new state. Returns false if `plain` equals the current entry's
    /// plain text, in which case nothing changes.
    pub fn push(&mut self, plain: impl Into<String>, html: impl Into<String>) -> bool {
        let plain = plain.into();
        if self.current().is_some_and(|cur| cur.plain == plain) {
            tracing::trace!(target: "copydesk::history", "skipping duplicate history entry");
            return false;
        }

        // Discard the abandoned redo branch.
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(HistoryEntry {
            plain,
            html: html.into(),
        });

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;

        tracing::trace!(
            target: "copydesk::history",
            len = self.entries.len(),
            cursor = self.cursor,
            "pushed history entry"
        );
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Step back one entry and return it.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.current().cloned()
    }

    /// Step forward one entry and return it.
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.current().cloned()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Plain-text projection of every entry, oldest first.
    pub fn plain_entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.plain.as_str())
    }

    /// HTML of every entry, oldest first.
    pub fn html_entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.html.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_n(history: &mut DualHistory, n: usize) {
        for i in 0..n {
            history.push(format!("text {i}"), format!("<p>text {i}</p>"));
        }
    }

    #[test]
    fn test_duplicate_push_is_ignored() {
        let mut h = DualHistory::default();
        assert!(h.push("same", "<p>same</p>"));
        assert!(!h.push("same", "<p><b>same</b></p>"));
        assert_eq!(h.len(), 1);
        assert_eq!(h.cursor(), 0);
        assert_eq!(h.current().unwrap().html, "<p>same</p>");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut h = DualHistory::new(50);
        push_n(&mut h, 60);
        assert_eq!(h.len(), 50);
        assert_eq!(h.cursor(), 49);
        assert_eq!(h.plain_entries().count(), h.html_entries().count());

        let mut oldest = None;
        while let Some(entry) = h.undo() {
            oldest = Some(entry);
        }
        assert_eq!(oldest.unwrap().plain, "text 10");
        assert!(!h.plain_entries().any(|p| p == "text 9"));
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut h = DualHistory::default();
        push_n(&mut h, 12);
        let before = h.current().cloned();
        for k in 1..12 {
            for _ in 0..k {
                assert!(h.undo().is_some());
            }
            for _ in 0..k {
                assert!(h.redo().is_some());
            }
            assert_eq!(h.current().cloned(), before);
        }
        assert!(!h.can_redo());
    }

    #[test]
    fn test_push_after_undo_truncates_redo() {
        let mut h = DualHistory::default();
        h.push("a", "<p>a</p>");
        h.push("b", "<p>b</p>");
        h.push("c", "<p>c</p>");
        assert_eq!(h.undo().unwrap().plain, "b");
        h.push("d", "<p>d</p>");
        assert!(h.redo().is_none());
        assert_eq!(h.plain_entries().collect::<Vec<_>>(), vec!["a", "b", "d"]);
    }

    #[test]
    fn test_bounds() {
        let mut h = DualHistory::default();
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert!(h.undo().is_none());
        h.push("only", "<p>only</p>");
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
    }

    #[test]
    fn test_capacity_with_cursor_mid_history() {
        let mut h = DualHistory::new(3);
        push_n(&mut h, 3);
        h.undo();
        h.push("x", "<p>x</p>");
        assert_eq!(h.plain_entries().collect::<Vec<_>>(), vec!["text 0", "text 1", "x"]);
        h.push("y", "<p>y</p>");
        assert_eq!(h.plain_entries().collect::<Vec<_>>(), vec!["text 1", "x", "y"]);
        assert_eq!(h.cursor(), 2);
    }
}

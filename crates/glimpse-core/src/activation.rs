//! Activation order of windows
//!
//! A LIFO of window ids. Closed windows are not removed when they close; the
//! stack skips them the next time someone asks for the current window.

use crate::window::WindowId;

#[derive(Debug, Default)]
pub struct ActivationTracker {
    stack: Vec<WindowId>,
}

impl ActivationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: WindowId) {
        self.stack.push(id);
    }

    /// Most recently pushed window that `is_live` accepts.
    ///
    /// Dead entries above it are popped; entries below it are left alone.
    pub fn current_live<F>(&mut self, is_live: F) -> Option<WindowId>
    where
        F: Fn(WindowId) -> bool,
    {
        while let Some(&top) = self.stack.last() {
            if is_live(top) {
                return Some(top);
            }
            self.stack.pop();
        }
        None
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker_has_no_current() {
        let mut tracker = ActivationTracker::new();
        assert_eq!(tracker.current_live(|_| true), None);
    }

    #[test]
    fn test_last_push_wins() {
        let mut tracker = ActivationTracker::new();
        tracker.push(WindowId(1));
        tracker.push(WindowId(2));
        tracker.push(WindowId(1));

        assert_eq!(tracker.current_live(|_| true), Some(WindowId(1)));
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_dead_entries_pruned_only_down_to_live_one() {
        let mut tracker = ActivationTracker::new();
        for id in [1, 2, 3, 4] {
            tracker.push(WindowId(id));
        }

        // 4 and 3 closed, 1 also closed but buried under live 2
        let live = [WindowId(2)];
        assert_eq!(
            tracker.current_live(|id| live.contains(&id)),
            Some(WindowId(2))
        );
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_all_dead_empties_stack() {
        let mut tracker = ActivationTracker::new();
        tracker.push(WindowId(1));
        tracker.push(WindowId(2));

        assert_eq!(tracker.current_live(|_| false), None);
        assert!(tracker.is_empty());
    }
}

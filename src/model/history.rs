// ============================================================================
// reactive-model - History Log
// Reversible record of stored-property writes for undo/redo
// ============================================================================
//
// Only direct stored-property writes that actually changed a value are
// recorded. Computed recomputation is derived state - propagation replays
// it for free after a restore, so it is never logged.
// ============================================================================

use std::cell::RefCell;

use crate::core::value::Value;

/// One reversible stored-property change.
#[derive(Clone, Debug)]
pub struct Action {
    pub property: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Undo/redo stacks. A fresh action always clears the redo stack; undo and
/// redo move entries between the stacks without touching unrelated entries.
#[derive(Default)]
pub struct HistoryLog {
    history: RefCell<Vec<Action>>,
    redo_stack: RefCell<Vec<Action>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh write. Clears the redo stack.
    pub fn record(&self, action: Action) {
        self.history.borrow_mut().push(action);
        self.redo_stack.borrow_mut().clear();
    }

    /// Pop the most recent action for undoing, moving it to the redo stack.
    /// `None` when there is nothing to undo.
    pub fn pop_for_undo(&self) -> Option<Action> {
        let action = self.history.borrow_mut().pop()?;
        self.redo_stack.borrow_mut().push(action.clone());
        Some(action)
    }

    /// Pop the most recent undone action for redoing, moving it back to
    /// the history. `None` when there is nothing to redo.
    pub fn pop_for_redo(&self) -> Option<Action> {
        let action = self.redo_stack.borrow_mut().pop()?;
        self.history.borrow_mut().push(action.clone());
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        !self.history.borrow().is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.history.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.borrow().is_empty()
    }

    /// Drop both stacks.
    pub fn clear(&self) {
        self.history.borrow_mut().clear();
        self.redo_stack.borrow_mut().clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn action(prop: &str, old: i64, new: i64) -> Action {
        Action {
            property: prop.to_owned(),
            old_value: Value::from(old),
            new_value: Value::from(new),
        }
    }

    #[test]
    fn record_then_undo_then_redo() {
        let log = HistoryLog::new();
        log.record(action("n", 0, 1));
        log.record(action("n", 1, 2));
        assert_eq!(log.len(), 2);
        assert!(log.can_undo());
        assert!(!log.can_redo());

        let undone = log.pop_for_undo().unwrap();
        assert_eq!(undone.new_value.as_int(), Some(2));
        assert_eq!(log.len(), 1);
        assert!(log.can_redo());

        let redone = log.pop_for_redo().unwrap();
        assert_eq!(redone.new_value.as_int(), Some(2));
        assert_eq!(log.len(), 2);
        assert!(!log.can_redo());
    }

    #[test]
    fn empty_stacks_return_none() {
        let log = HistoryLog::new();
        assert!(log.pop_for_undo().is_none());
        assert!(log.pop_for_redo().is_none());
    }

    #[test]
    fn fresh_record_clears_redo_stack() {
        let log = HistoryLog::new();
        log.record(action("n", 0, 1));
        log.record(action("n", 1, 2));
        log.pop_for_undo().unwrap();
        assert!(log.can_redo());

        log.record(action("n", 1, 5));
        assert!(!log.can_redo());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn full_unwind_empties_history() {
        let log = HistoryLog::new();
        for i in 0..4 {
            log.record(action("n", i, i + 1));
        }
        for _ in 0..4 {
            assert!(log.pop_for_undo().is_some());
        }
        assert!(log.is_empty());
        assert!(!log.can_undo());

        for _ in 0..4 {
            assert!(log.pop_for_redo().is_some());
        }
        assert!(!log.can_redo());
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn clear_drops_both_stacks() {
        let log = HistoryLog::new();
        log.record(action("n", 0, 1));
        log.pop_for_undo().unwrap();
        log.clear();
        assert!(!log.can_undo());
        assert!(!log.can_redo());
    }
}

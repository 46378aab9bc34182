//! The change source abstraction.

use std::rc::Rc;

use crate::change::{ChangeMode, TaskStateChange};
use crate::error::DetectionError;

/// A lazy, single-pass sequence of changes.
///
/// Pulling an element may run an expensive comparison; a comparison failure
/// is yielded as an `Err` item.
pub type ChangeIter<'a> = Box<dyn Iterator<Item = Result<TaskStateChange, DetectionError>> + 'a>;

/// Something that can explain why a task is out of date.
pub trait TaskStateChanges {
    /// Enumerates changes visible in `mode`.
    fn changes(&self, mode: ChangeMode) -> ChangeIter<'_>;

    /// Drains [`changes`](Self::changes) into a list, stopping at the first failure.
    fn collect_changes(&self, mode: ChangeMode) -> Result<Vec<TaskStateChange>, DetectionError> {
        self.changes(mode).collect()
    }
}

impl<T: TaskStateChanges + ?Sized> TaskStateChanges for &T {
    fn changes(&self, mode: ChangeMode) -> ChangeIter<'_> {
        (**self).changes(mode)
    }
}

impl<T: TaskStateChanges + ?Sized> TaskStateChanges for Box<T> {
    fn changes(&self, mode: ChangeMode) -> ChangeIter<'_> {
        (**self).changes(mode)
    }
}

impl<T: TaskStateChanges + ?Sized> TaskStateChanges for Rc<T> {
    fn changes(&self, mode: ChangeMode) -> ChangeIter<'_> {
        (**self).changes(mode)
    }
}

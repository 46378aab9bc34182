//! Individual change records and query modes.

use std::fmt;

/// How a change participates in rebuild decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClass {
    /// A newly appearing output. Only reported when the query includes
    /// additions, so it never forces a full rebuild on its own.
    Addition,
    /// Anything that modifies or removes recorded state, including a newly
    /// added input.
    Modification,
}

/// Which changes a query enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMode {
    /// Skip [`ChangeClass::Addition`] changes.
    ExcludingAdded,
    /// Report every change.
    IncludingAdded,
}

impl ChangeMode {
    /// Returns `true` if a change of this class is visible in this mode.
    pub fn includes(self, change: &TaskStateChange) -> bool {
        match self {
            ChangeMode::IncludingAdded => true,
            ChangeMode::ExcludingAdded => !change.is_addition(),
        }
    }
}

/// One reported discrepancy between a task's previous and current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStateChange {
    message: String,
    class: ChangeClass,
}

impl TaskStateChange {
    /// Creates a change that modifies or removes recorded state.
    pub fn modification(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: ChangeClass::Modification,
        }
    }

    /// Creates a change describing a newly appearing output.
    pub fn addition(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: ChangeClass::Addition,
        }
    }

    /// The human-readable explanation.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The classification of this change.
    pub fn class(&self) -> ChangeClass {
        self.class
    }

    /// Returns `true` for [`ChangeClass::Addition`].
    pub fn is_addition(&self) -> bool {
        self.class == ChangeClass::Addition
    }
}

impl fmt::Display for TaskStateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

//! Priority-ordered aggregation of change sources under a message cap.

use std::rc::Rc;

use crate::change::{ChangeMode, TaskStateChange};
use crate::error::DetectionError;
use crate::source::{ChangeIter, TaskStateChanges};

/// Drains sources in order until `max_reported` changes are collected.
///
/// Sources past the cutoff are never queried, so expensive comparisons placed
/// late in the list are skipped once cheaper ones have filled the quota. A
/// failure ends the sequence and counts towards the cap.
pub struct SummaryTaskStateChanges<'a> {
    max_reported: usize,
    sources: Vec<Rc<dyn TaskStateChanges + 'a>>,
}

impl<'a> SummaryTaskStateChanges<'a> {
    /// Creates an aggregator over `sources`, highest priority first.
    pub fn new(max_reported: usize, sources: Vec<Rc<dyn TaskStateChanges + 'a>>) -> Self {
        Self {
            max_reported,
            sources,
        }
    }
}

impl TaskStateChanges for SummaryTaskStateChanges<'_> {
    fn changes(&self, mode: ChangeMode) -> ChangeIter<'_> {
        Box::new(SummaryIter {
            sources: self.sources.iter(),
            current: None,
            remaining: self.max_reported,
            mode,
        })
    }
}

struct SummaryIter<'s, 'a> {
    sources: std::slice::Iter<'s, Rc<dyn TaskStateChanges + 'a>>,
    current: Option<ChangeIter<'s>>,
    remaining: usize,
    mode: ChangeMode,
}

impl Iterator for SummaryIter<'_, '_> {
    type Item = Result<TaskStateChange, DetectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            if let Some(changes) = &mut self.current {
                match changes.next() {
                    Some(Ok(change)) => {
                        self.remaining -= 1;
                        return Some(Ok(change));
                    }
                    Some(Err(err)) => {
                        self.remaining = 0;
                        return Some(Err(err));
                    }
                    None => self.current = None,
                }
            }
            let source = self.sources.next()?;
            self.current = Some(source.changes(self.mode));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedSource {
        messages: Vec<TaskStateChange>,
        queried: Cell<usize>,
    }

    impl FixedSource {
        fn new(messages: &[&str]) -> Rc<Self> {
            Rc::new(Self {
                messages: messages
                    .iter()
                    .map(|m| TaskStateChange::modification(*m))
                    .collect(),
                queried: Cell::new(0),
            })
        }

        fn with_addition(message: &str) -> Rc<Self> {
            Rc::new(Self {
                messages: vec![TaskStateChange::addition(message)],
                queried: Cell::new(0),
            })
        }
    }

    impl TaskStateChanges for FixedSource {
        fn changes(&self, mode: ChangeMode) -> ChangeIter<'_> {
            self.queried.set(self.queried.get() + 1);
            Box::new(
                self.messages
                    .iter()
                    .filter(move |c| mode.includes(c))
                    .cloned()
                    .map(Ok),
            )
        }
    }

    struct BrokenSource;

    impl TaskStateChanges for BrokenSource {
        fn changes(&self, _mode: ChangeMode) -> ChangeIter<'_> {
            Box::new(std::iter::once(Err(DetectionError::UnavailableSnapshot {
                subject: "x".to_string(),
                reason: "y".to_string(),
            })))
        }
    }

    fn messages(source: &dyn TaskStateChanges, mode: ChangeMode) -> Vec<String> {
        source
            .collect_changes(mode)
            .unwrap()
            .into_iter()
            .map(|c| c.message().to_string())
            .collect()
    }

    #[test]
    fn drains_in_priority_order() {
        let summary = SummaryTaskStateChanges::new(
            3,
            vec![FixedSource::new(&["a"]), FixedSource::new(&[]), FixedSource::new(&["b", "c"])],
        );
        assert_eq!(messages(&summary, ChangeMode::ExcludingAdded), vec!["a", "b", "c"]);
    }

    #[test]
    fn caps_and_skips_later_sources() {
        let first = FixedSource::new(&["a", "b"]);
        let second = FixedSource::new(&["c", "d"]);
        let third = FixedSource::new(&["e"]);
        let summary = SummaryTaskStateChanges::new(
            3,
            vec![first.clone(), second.clone(), third.clone()],
        );
        assert_eq!(messages(&summary, ChangeMode::ExcludingAdded), vec!["a", "b", "c"]);
        assert_eq!(first.queried.get(), 1);
        assert_eq!(second.queried.get(), 1);
        assert_eq!(third.queried.get(), 0);
    }

    #[test]
    fn cap_of_one_stops_at_first_change() {
        let first = FixedSource::new(&["only"]);
        let second = FixedSource::new(&["skipped"]);
        let summary = SummaryTaskStateChanges::new(1, vec![first, second.clone()]);
        assert_eq!(messages(&summary, ChangeMode::ExcludingAdded), vec!["only"]);
        assert_eq!(second.queried.get(), 0);
    }

    #[test]
    fn mode_passed_to_sources() {
        let summary = SummaryTaskStateChanges::new(
            3,
            vec![FixedSource::with_addition("added"), FixedSource::new(&["changed"])],
        );
        assert_eq!(messages(&summary, ChangeMode::ExcludingAdded), vec!["changed"]);
        assert_eq!(
            messages(&summary, ChangeMode::IncludingAdded),
            vec!["added", "changed"]
        );
    }

    #[test]
    fn failure_ends_sequence() {
        let after = FixedSource::new(&["after"]);
        let summary = SummaryTaskStateChanges::new(
            3,
            vec![FixedSource::new(&["before"]), Rc::new(BrokenSource), after.clone()],
        );
        let items: Vec<_> = summary.changes(ChangeMode::ExcludingAdded).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
        assert_eq!(after.queried.get(), 0);
    }
}

//! Assembly of change sources into the views a scheduler queries.

use std::path::PathBuf;
use std::rc::Rc;

use crate::caching::CachingTaskStateChanges;
use crate::change::{ChangeMode, TaskStateChange};
use crate::error::DetectionError;
use crate::error_handling::ErrorHandlingTaskStateChanges;
use crate::record::ExecutionRecord;
use crate::snapshot::{FileCollectionSnapshot, NormalizationStrategy};
use crate::snapshotter::FileSnapshotter;
use crate::source::TaskStateChanges;
use crate::sources::{
    DiscoveredInputsTaskStateChanges, InputFilesTaskStateChanges,
    InputPropertiesTaskStateChanges, NoHistoryTaskStateChanges, OutputFilesTaskStateChanges,
    PreviousSuccessTaskStateChanges, TaskTypeTaskStateChanges,
};
use crate::summary::SummaryTaskStateChanges;

/// Default cap on the number of reasons reported for an out-of-date task.
pub const MAX_OUT_OF_DATE_MESSAGES: usize = 3;

/// Collaborators shared by every source of one task's state.
#[derive(Clone, Copy)]
pub struct StateContext<'a> {
    /// Path of the task, used in messages.
    pub task_path: &'a str,
    /// Captures discovered inputs.
    pub snapshotter: &'a dyn FileSnapshotter,
    /// How file collections are compared.
    pub normalization: &'a NormalizationStrategy,
    /// Cap for [`TaskUpToDateState::all_task_changes`].
    pub max_messages: usize,
}

impl<'a> StateContext<'a> {
    /// Creates a context with the default message cap.
    pub fn new(
        task_path: &'a str,
        snapshotter: &'a dyn FileSnapshotter,
        normalization: &'a NormalizationStrategy,
    ) -> Self {
        Self {
            task_path,
            snapshotter,
            normalization,
            max_messages: MAX_OUT_OF_DATE_MESSAGES,
        }
    }

    /// Builder-style message cap. A cap of zero is raised to one.
    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages.max(1);
        self
    }
}

type Cached<S> = Rc<CachingTaskStateChanges<Rc<S>>>;

/// The up-to-date state of one task, comparing its current record against
/// the previous one.
///
/// Created and consumed while evaluating a single task. Every source reads the
/// same borrowed records, so the cached and uncached output comparisons see
/// identical snapshots.
pub struct TaskUpToDateState<'a> {
    output_files: Rc<OutputFilesTaskStateChanges<'a>>,
    discovered: Rc<DiscoveredInputsTaskStateChanges<'a>>,
    input_files_changes: ErrorHandlingTaskStateChanges<Cached<InputFilesTaskStateChanges<'a>>>,
    all_changes: ErrorHandlingTaskStateChanges<SummaryTaskStateChanges<'a>>,
    rebuild_changes: ErrorHandlingTaskStateChanges<SummaryTaskStateChanges<'a>>,
}

impl<'a> TaskUpToDateState<'a> {
    /// Wires the sources for `current` against `previous`, if there was one.
    pub fn new(
        ctx: &StateContext<'a>,
        previous: Option<&'a ExecutionRecord>,
        current: &'a ExecutionRecord,
    ) -> Self {
        let task_path = ctx.task_path;
        let normalization = ctx.normalization;

        let previous_success = Rc::new(PreviousSuccessTaskStateChanges::new(previous));
        let no_history = Rc::new(NoHistoryTaskStateChanges::new(previous));
        let task_type = Rc::new(TaskTypeTaskStateChanges::new(task_path, previous, current));
        let input_properties = Rc::new(InputPropertiesTaskStateChanges::new(
            task_path, previous, current,
        ));

        let output_files = Rc::new(OutputFilesTaskStateChanges::new(
            previous,
            current,
            normalization,
        ));
        let cached_outputs = Rc::new(CachingTaskStateChanges::new(Rc::clone(&output_files)));

        let input_files = Rc::new(InputFilesTaskStateChanges::new(
            previous,
            current,
            normalization,
        ));
        let cached_inputs = Rc::new(CachingTaskStateChanges::new(input_files));

        let discovered = Rc::new(DiscoveredInputsTaskStateChanges::new(
            previous,
            ctx.snapshotter,
            normalization,
        ));
        let cached_discovered = Rc::new(CachingTaskStateChanges::new(Rc::clone(&discovered)));

        let all_sources: Vec<Rc<dyn TaskStateChanges + 'a>> = vec![
            previous_success.clone(),
            no_history.clone(),
            task_type.clone(),
            input_properties.clone(),
            cached_outputs.clone(),
            cached_inputs.clone(),
            cached_discovered,
        ];
        let rebuild_sources: Vec<Rc<dyn TaskStateChanges + 'a>> = vec![
            previous_success,
            no_history,
            task_type,
            input_properties,
            cached_outputs,
        ];
        let all_changes = SummaryTaskStateChanges::new(ctx.max_messages, all_sources);
        let rebuild_changes = SummaryTaskStateChanges::new(1, rebuild_sources);

        Self {
            output_files,
            discovered,
            input_files_changes: ErrorHandlingTaskStateChanges::new(task_path, cached_inputs),
            all_changes: ErrorHandlingTaskStateChanges::new(task_path, all_changes),
            rebuild_changes: ErrorHandlingTaskStateChanges::new(task_path, rebuild_changes),
        }
    }

    /// Changes to the declared input files only.
    pub fn input_files_changes(&self) -> &dyn TaskStateChanges {
        &self.input_files_changes
    }

    /// Whether any output changed, including outputs that did not exist
    /// before. A comparison failure counts as a change.
    pub fn has_any_output_file_changes(&self) -> bool {
        self.output_files
            .changes(ChangeMode::IncludingAdded)
            .next()
            .is_some()
    }

    /// Every reason the task is out of date, capped and in priority order.
    pub fn all_task_changes(&self) -> &dyn TaskStateChanges {
        &self.all_changes
    }

    /// The first reason the task needs a full rebuild, if any. Input file
    /// changes are excluded: on their own they allow an incremental run.
    pub fn rebuild_changes(&self) -> &dyn TaskStateChanges {
        &self.rebuild_changes
    }

    /// Snapshots inputs discovered while the task ran.
    pub fn new_inputs(&self, paths: &[PathBuf]) -> Result<(), DetectionError> {
        self.discovered.record_new_inputs(paths)
    }

    /// The snapshot captured by [`new_inputs`](Self::new_inputs), to be stored
    /// in the current record before it is persisted.
    pub fn discovered_inputs(&self) -> Option<FileCollectionSnapshot> {
        self.discovered.recorded()
    }

    /// Drains [`all_task_changes`](Self::all_task_changes), additions included.
    pub fn out_of_date_reasons(&self) -> Vec<TaskStateChange> {
        self.all_changes
            .changes(ChangeMode::IncludingAdded)
            .filter_map(Result::ok)
            .collect()
    }

    /// Whether nothing at all changed since the previous run.
    pub fn is_up_to_date(&self) -> bool {
        self.all_changes
            .changes(ChangeMode::IncludingAdded)
            .next()
            .is_none()
    }

    /// Drains [`rebuild_changes`](Self::rebuild_changes), additions excluded.
    pub fn rebuild_reasons(&self) -> Vec<TaskStateChange> {
        self.rebuild_changes
            .changes(ChangeMode::ExcludingAdded)
            .filter_map(Result::ok)
            .collect()
    }

    /// Whether the task must run from scratch rather than incrementally.
    pub fn must_rebuild(&self) -> bool {
        self.rebuild_changes
            .changes(ChangeMode::ExcludingAdded)
            .next()
            .is_some()
    }
}

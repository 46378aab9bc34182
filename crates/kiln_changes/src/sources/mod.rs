//! Primitive change sources, one per concern.
//!
//! Every source compares the previous execution record against the current
//! one. When there is no previous record, only [`NoHistoryTaskStateChanges`]
//! reports anything; the others stay silent without running a comparison.

mod discovered_inputs;
mod files;
mod input_files;
mod input_properties;
mod no_history;
mod output_files;
mod previous_success;
mod task_type;

pub use discovered_inputs::DiscoveredInputsTaskStateChanges;
pub use input_files::InputFilesTaskStateChanges;
pub use input_properties::InputPropertiesTaskStateChanges;
pub use no_history::NoHistoryTaskStateChanges;
pub use output_files::OutputFilesTaskStateChanges;
pub use previous_success::PreviousSuccessTaskStateChanges;
pub use task_type::TaskTypeTaskStateChanges;

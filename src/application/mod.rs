//! Application layer - the preset store and its use cases.
//!
//! This layer ties the document model to locking and storage, maintains
//! the accessor table, and formats results for display.

pub mod accessors;
pub mod formatter;
pub mod position;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use accessors::{Accessor, AccessorRegistry, Operation, Target};
pub use formatter::{
    collect_rows, format_history, format_presets, format_presets_table, format_state,
    OutputFormat, PresetRow,
};
pub use position::PresetPosition;
pub use state::{nearest_state, PresetState, STATE_THRESHOLD};
pub use store::{parse_value, reconfigure, validate_name, validate_value, PresetStore, UpdateOutcome};

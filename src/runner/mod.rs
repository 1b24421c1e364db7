//! Pipeline runner
//!
//! Applies defaults and header merging to each configured step, sends it
//! through the transport dispatcher and collects a [`PipelineReport`] per
//! pipeline.

mod pipeline;
mod summary;

pub use pipeline::{prepare_step, PipelineRunner, CURRENT_PIPELINE};
pub use summary::{PipelineReport, StepRecord};

//! Shipit Tasks - Release orchestration engine
//!
//! This crate sequences the publish steps of a release or snapshot run,
//! asks a gate before each one, and reports progress as it goes.

pub mod backends;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod reporter;
pub mod step;

pub use backends::{Backends, LiveBackends};
pub use error::{PipelineError, Result};
pub use gate::{PresetGate, PromptGate, StepGate, StepSelection};
pub use pipeline::{Pipeline, RunSummary};
pub use reporter::{CollectingReporter, PipelineReporter, StepEvent, TracingReporter};
pub use step::{parse_step_list, RunMode, Step};

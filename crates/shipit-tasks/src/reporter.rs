//! Step execution reporting

use std::sync::Mutex;
use std::time::Duration;

use shipit_core::ErrorKind;

use crate::step::Step;

/// Events emitted while a pipeline runs
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// A step is starting
    Started { step: Step },
    /// A step finished
    Completed {
        step: Step,
        duration: Duration,
        detail: Option<String>,
    },
    /// A step did not run
    Skipped { step: Step, reason: String },
    /// A step failed; `fatal` failures end the run
    Failed {
        step: Step,
        kind: ErrorKind,
        error: String,
        fatal: bool,
    },
}

impl StepEvent {
    /// Step the event belongs to
    pub fn step(&self) -> Step {
        match self {
            Self::Started { step }
            | Self::Completed { step, .. }
            | Self::Skipped { step, .. }
            | Self::Failed { step, .. } => *step,
        }
    }
}

/// Trait for reporting pipeline progress
pub trait PipelineReporter: Send + Sync {
    /// Handle a step event
    fn report(&self, event: &StepEvent);
}

/// Simple reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl PipelineReporter for TracingReporter {
    fn report(&self, event: &StepEvent) {
        match event {
            StepEvent::Started { step } => {
                tracing::info!("Starting {}", step);
            }
            StepEvent::Completed {
                step,
                duration,
                detail,
            } => match detail {
                Some(detail) => tracing::info!(
                    "{} completed in {:.1}s: {}",
                    step,
                    duration.as_secs_f64(),
                    detail
                ),
                None => tracing::info!("{} completed in {:.1}s", step, duration.as_secs_f64()),
            },
            StepEvent::Skipped { step, reason } => {
                tracing::info!("{} skipped: {}", step, reason);
            }
            StepEvent::Failed {
                step,
                kind,
                error,
                fatal,
            } => {
                if *fatal {
                    tracing::error!(kind = %kind, "{} failed: {}", step, error);
                } else {
                    tracing::warn!(kind = %kind, "{} failed, continuing: {}", step, error);
                }
            }
        }
    }
}

/// Reporter that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<StepEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<StepEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Steps that completed, in order
    pub fn completed(&self) -> Vec<Step> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, StepEvent::Completed { .. }))
            .map(|e| e.step())
            .collect()
    }

    /// Skip reason of a step, if it was skipped
    pub fn skip_reason(&self, step: Step) -> Option<String> {
        self.events().into_iter().find_map(|e| match e {
            StepEvent::Skipped { step: s, reason } if s == step => Some(reason),
            _ => None,
        })
    }
}

impl PipelineReporter for CollectingReporter {
    fn report(&self, event: &StepEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

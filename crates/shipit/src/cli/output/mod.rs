//! Output formatting utilities

use console::{style, Style};
use shipit_tasks::{PipelineReporter, StepEvent, TracingReporter};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Style for version numbers
pub fn version_style() -> Style {
    Style::new().green().bold()
}

/// Style for step names
pub fn step_style() -> Style {
    Style::new().cyan()
}

/// Prints step progress and forwards every event to the log
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    quiet: bool,
    log: TracingReporter,
}

impl ConsoleReporter {
    /// Create a reporter; `quiet` hides everything but failures
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            log: TracingReporter,
        }
    }

    /// Line printed for an event, if any
    fn line(&self, event: &StepEvent) -> Option<(Level, String)> {
        let step = step_style().apply_to(event.step());
        match event {
            StepEvent::Started { .. } if !self.quiet => {
                Some((Level::Info, format!("{}...", step)))
            }
            StepEvent::Completed {
                duration, detail, ..
            } if !self.quiet => {
                let took = style(format!("({:.1}s)", duration.as_secs_f64())).dim();
                Some((
                    Level::Success,
                    match detail {
                        Some(detail) => format!("{} {}: {}", step, took, detail),
                        None => format!("{} {}", step, took),
                    },
                ))
            }
            StepEvent::Skipped { reason, .. } if !self.quiet => Some((
                Level::Info,
                format!("{} {}", step, style(format!("skipped ({})", reason)).dim()),
            )),
            StepEvent::Failed {
                error, fatal: true, ..
            } => Some((Level::Error, format!("{} failed: {}", step, error))),
            StepEvent::Failed {
                error,
                fatal: false,
                ..
            } => Some((Level::Warning, format!("{} failed: {}", step, error))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl PipelineReporter for ConsoleReporter {
    fn report(&self, event: &StepEvent) {
        self.log.report(event);
        if let Some((level, line)) = self.line(event) {
            match level {
                Level::Info => info(&line),
                Level::Success => success(&line),
                Level::Warning => warning(&line),
                Level::Error => error(&line),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipit_core::ErrorKind;
    use shipit_tasks::Step;
    use std::time::Duration;

    #[test]
    fn test_quiet_reporter_only_shows_failures() {
        let reporter = ConsoleReporter::new(true);
        assert!(reporter
            .line(&StepEvent::Started { step: Step::Build })
            .is_none());
        assert!(reporter
            .line(&StepEvent::Completed {
                step: Step::Build,
                duration: Duration::from_secs(3),
                detail: None,
            })
            .is_none());

        let (level, line) = reporter
            .line(&StepEvent::Failed {
                step: Step::PostAnnouncement,
                kind: ErrorKind::NotFound,
                error: "Reddit post must be in build/release_notes-1.4.0.md".to_string(),
                fatal: false,
            })
            .unwrap();
        assert_eq!(level, Level::Warning);
        assert!(line.contains("Reddit post must be in"));
    }

    #[test]
    fn test_skip_reason_is_shown() {
        let reporter = ConsoleReporter::new(false);
        let (level, line) = reporter
            .line(&StepEvent::Skipped {
                step: Step::WriteDraft,
                reason: "declined".to_string(),
            })
            .unwrap();
        assert_eq!(level, Level::Info);
        assert!(line.contains("declined"));
    }
}

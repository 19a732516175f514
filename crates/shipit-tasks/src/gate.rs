//! Step gates
//!
//! Every step of a release or snapshot run asks a gate first. The
//! interactive gate asks the operator; the preset gate answers from
//! command-line flags so a run can be scripted.

use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

use shipit_core::Prompter;

use crate::step::{RunMode, Step};

/// Decides which steps run
pub trait StepGate: Send + Sync {
    /// Whether to run `step`
    fn confirm(&self, step: Step, mode: RunMode) -> io::Result<bool>;

    /// Whether hosting uploads go to production rather than staging
    fn production_hosting(&self) -> io::Result<bool>;
}

/// Asks the operator `"<question> [y/n]"` for every step
pub struct PromptGate {
    prompter: Arc<dyn Prompter>,
}

impl PromptGate {
    /// Create a gate that asks through `prompter`
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self { prompter }
    }

    fn ask(&self, question: &str) -> io::Result<bool> {
        self.prompter.confirm(&format!("{} [y/n]", question))
    }
}

impl StepGate for PromptGate {
    fn confirm(&self, step: Step, mode: RunMode) -> io::Result<bool> {
        self.ask(step.question(mode))
    }

    fn production_hosting(&self) -> io::Result<bool> {
        self.ask("Publish to production?")
    }
}

/// Which steps a preset gate lets through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSelection {
    /// Every step
    All,
    /// Only the listed steps
    Only(BTreeSet<Step>),
}

/// Answers gates from a fixed selection
#[derive(Debug, Clone)]
pub struct PresetGate {
    selection: StepSelection,
    production: bool,
}

impl PresetGate {
    /// Create a preset gate
    pub fn new(selection: StepSelection, production: bool) -> Self {
        Self {
            selection,
            production,
        }
    }

    /// Run every step
    pub fn all(production: bool) -> Self {
        Self::new(StepSelection::All, production)
    }
}

impl StepGate for PresetGate {
    fn confirm(&self, step: Step, _mode: RunMode) -> io::Result<bool> {
        Ok(match &self.selection {
            StepSelection::All => true,
            StepSelection::Only(steps) => steps.contains(&step),
        })
    }

    fn production_hosting(&self) -> io::Result<bool> {
        Ok(self.production)
    }
}

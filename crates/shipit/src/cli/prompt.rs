//! Terminal prompts

use std::io;

use dialoguer::{Confirm, Input, Password};
use shipit_core::Prompter;

/// Asks the operator on the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&self, label: &str) -> io::Result<String> {
        Input::<String>::new()
            .with_prompt(prompt_text(label))
            .interact_text()
            .map_err(to_io)
    }

    fn password(&self, label: &str) -> io::Result<String> {
        Password::new()
            .with_prompt(prompt_text(label))
            .interact()
            .map_err(to_io)
    }

    fn confirm(&self, question: &str) -> io::Result<bool> {
        Confirm::new()
            .with_prompt(prompt_text(question))
            .default(false)
            .interact()
            .map_err(to_io)
    }
}

/// Label without the trailing separator dialoguer adds itself
fn prompt_text(label: &str) -> &str {
    let label = label.strip_suffix(" [y/n]").unwrap_or(label);
    label.trim_end_matches([':', ' '])
}

fn to_io(error: dialoguer::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, error)
}

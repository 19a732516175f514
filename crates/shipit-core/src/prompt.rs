//! Operator input abstraction

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

/// Source of operator answers.
///
/// The CLI implements this on top of the terminal; tests use
/// [`ScriptedPrompter`].
pub trait Prompter: Send + Sync {
    /// Ask for a line of visible text
    fn input(&self, label: &str) -> io::Result<String>;

    /// Ask for a secret without echoing it
    fn password(&self, label: &str) -> io::Result<String>;

    /// Ask a yes/no question
    fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// Prompter that replays a fixed list of answers (useful for testing)
///
/// Every prompt consumes the next answer. `confirm` treats `"y"` as yes and
/// anything else as no. Running out of answers is an `UnexpectedEof` error.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Create a prompter with the given answers
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Labels of every prompt shown so far, in order
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Number of times a given label was prompted
    pub fn times_asked(&self, label: &str) -> usize {
        self.asked().iter().filter(|l| l.as_str() == label).count()
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or(0)
    }

    fn next(&self, label: &str) -> io::Result<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(label.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut a| a.pop_front())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("no scripted answer for '{}'", label),
                )
            })
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, label: &str) -> io::Result<String> {
        self.next(label)
    }

    fn password(&self, label: &str) -> io::Result<String> {
        self.next(label)
    }

    fn confirm(&self, question: &str) -> io::Result<bool> {
        Ok(self.next(question)? == "y")
    }
}

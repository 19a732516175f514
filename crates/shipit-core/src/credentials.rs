//! Persistent credential store
//!
//! Secrets are kept in a flat JSON object keyed by name. Missing values are
//! collected from the operator on first use, and every change rewrites the
//! whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{CredentialError, Result};
use crate::prompt::Prompter;

/// Credential store backed by a JSON file
pub struct CredentialStore {
    /// Backing file; `None` keeps everything in memory
    path: Option<PathBuf>,
    /// Cached secrets
    entries: BTreeMap<String, String>,
    /// Source of missing values
    prompter: Arc<dyn Prompter>,
}

impl CredentialStore {
    /// Open the store at `path`, loading it if the file exists
    pub fn open(path: impl AsRef<Path>, prompter: Arc<dyn Prompter>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(CredentialError::Io)?;
            let entries: BTreeMap<String, String> = serde_json::from_str(&content)
                .map_err(|source| CredentialError::Parse {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), count = entries.len(), "loaded credentials");
            entries
        } else {
            debug!(path = %path.display(), "no credential file yet");
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            entries,
            prompter,
        })
    }

    /// Create a store that is never written to disk
    pub fn in_memory(prompter: Arc<dyn Prompter>) -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
            prompter,
        }
    }

    /// Get a credential, prompting for it if absent
    pub fn get(&mut self, name: &str) -> Result<String> {
        self.get_or_prompt(name, false)
    }

    /// Get a secret credential, prompting with hidden input if absent
    pub fn get_secret_hidden(&mut self, name: &str) -> Result<String> {
        self.get_or_prompt(name, true)
    }

    /// Remove a credential so the next access prompts again
    pub fn invalidate(&mut self, name: &str) -> Result<()> {
        if self.entries.remove(name).is_some() {
            info!(credential = name, "credential invalidated");
        }
        self.save()
    }

    /// Check whether a credential is cached
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn get_or_prompt(&mut self, name: &str, hidden: bool) -> Result<String> {
        if let Some(value) = self.entries.get(name) {
            debug!(credential = name, source = "cache", "credential found");
            return Ok(value.clone());
        }

        let label = format!("{}: ", name);
        let answer = if hidden {
            self.prompter.password(&label)
        } else {
            self.prompter.input(&label)
        }
        .map_err(|e| CredentialError::Prompt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        debug!(credential = name, hidden, "credential collected from operator");
        self.entries.insert(name.to_string(), answer.clone());
        self.save()?;
        Ok(answer)
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, content).map_err(|source| CredentialError::Save {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), count = self.entries.len(), "credentials saved");
        Ok(())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.path)
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

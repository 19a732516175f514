//! Update manifest patching
//!
//! The manifest is the JSON document the launcher reads to find library
//! downloads. Only the `url` of an existing `libraries` entry is ever
//! changed; everything else is passed through in its original order.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::error::{ManifestError, Result};

/// A loaded update manifest
#[derive(Debug, Clone)]
pub struct UpdateManifest {
    path: PathBuf,
    document: Value,
}

impl UpdateManifest {
    /// Load and check a manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(ManifestError::Io)?;
        let document: Value =
            serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
                path: path.clone(),
                source,
            })?;

        let empty = match &document {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(ManifestError::Empty(path).into());
        }

        match document.get("libraries") {
            Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(ManifestError::Malformed {
                    path,
                    reason: "'libraries' is not an array".to_string(),
                }
                .into())
            }
            None => {
                return Err(ManifestError::Malformed {
                    path,
                    reason: "missing 'libraries'".to_string(),
                }
                .into())
            }
        }

        debug!(path = %path.display(), "manifest loaded");
        Ok(Self { path, document })
    }

    /// Path the manifest was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current URL of a library entry
    pub fn library_url(&self, name: &str) -> Option<&str> {
        self.libraries()
            .find(|lib| lib.get("name").and_then(Value::as_str) == Some(name))
            .and_then(|lib| lib.get("url"))
            .and_then(Value::as_str)
    }

    /// Point an existing library entry at a new URL
    pub fn set_library_url(&mut self, name: &str, url: &str) -> Result<()> {
        let entry = self
            .document
            .get_mut("libraries")
            .and_then(Value::as_array_mut)
            .and_then(|libs| {
                libs.iter_mut()
                    .find(|lib| lib.get("name").and_then(Value::as_str) == Some(name))
            })
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ManifestError::EntryNotFound {
                path: self.path.clone(),
                name: name.to_string(),
            })?;

        entry.insert("url".to_string(), Value::String(url.to_string()));
        Ok(())
    }

    /// Write the manifest back to where it was loaded from.
    ///
    /// The document goes to a temporary file in the same directory which is
    /// then renamed over the original.
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut file = NamedTempFile::new_in(&dir).map_err(ManifestError::Io)?;
        serde_json::to_writer(&mut file, &self.document)?;
        file.flush().map_err(ManifestError::Io)?;
        file.persist(&self.path)
            .map_err(|e| ManifestError::Io(e.error))?;
        debug!(path = %self.path.display(), "manifest written");
        Ok(())
    }

    fn libraries(&self) -> impl Iterator<Item = &Value> {
        self.document
            .get("libraries")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
    }
}

/// Set the download URL of `artifact_name` in the manifest at `path`.
///
/// Fails without writing anything if no library entry has that name.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn patch_manifest(path: &Path, artifact_name: &str, new_url: &str) -> Result<()> {
    let mut manifest = UpdateManifest::load(path)?;
    manifest.set_library_url(artifact_name, new_url)?;
    manifest.save()?;
    info!(library = artifact_name, url = new_url, "manifest patched");
    Ok(())
}

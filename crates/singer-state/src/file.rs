//! Atomic state persistence.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::State;

impl State {
    /// Load persisted state, or an empty state when no file exists yet.
    pub fn load(path: &Path) -> Result<State> {
        if !path.exists() {
            return Ok(State::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read state file {}", path.display()))?;
        let state = serde_json::from_str(&content)
            .with_context(|| format!("invalid state file {}", path.display()))?;
        Ok(state)
    }

    /// Persist the state with an atomic replace.
    ///
    /// The blob is written to a temp file in the target directory and renamed
    /// over the destination, so a concurrent reader sees either the previous
    /// checkpoint or this one, never a torn write.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create state directory {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp state file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, self).context("failed to serialize state")?;
        tmp.flush().context("failed to flush state")?;
        tmp.persist(path)
            .with_context(|| format!("failed to replace state file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "persisted state");
        Ok(())
    }
}

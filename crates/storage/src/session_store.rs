// SPDX-License-Identifier: MIT

//! Per-agent session records (§3, §4.B, §4.H): one YAML file per agent
//! under `sessions/<agent>.yaml`, holding a map of conversation-key to
//! [`SessionRecord`].

use crate::atomic::{atomic_write, read_yaml, AtomicIoError};
use crate::path_safety::{build_safe_file_path, PathTraversalError};
use herdctl_core::{default_ttl, Clock, SessionRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error(transparent)]
    PathTraversal(#[from] PathTraversalError),
    #[error(transparent)]
    Io(#[from] AtomicIoError),
    #[error("failed to serialize session file: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// The on-disk contents of one agent's session file. Unparseable
/// contents are treated as corrupted (§4.H "Schema migration") rather
/// than surfaced as an error: a fresh empty state is created and the
/// event is logged, on the view that data loss is preferable to an
/// uninterpretable file blocking every future job for that agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    records: IndexMap<String, SessionRecord>,
}

/// Owns `<state>/sessions/`.
pub struct SessionStore<C: Clock> {
    root: PathBuf,
    clock: C,
    ttl: chrono::Duration,
}

impl<C: Clock> SessionStore<C> {
    pub fn new(root: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            root: root.into(),
            clock,
            ttl: default_ttl(),
        }
    }

    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn file_path(&self, agent_name: &str) -> Result<PathBuf, SessionStoreError> {
        Ok(build_safe_file_path(&self.root, agent_name, "yaml")?)
    }

    fn load(&self, agent_name: &str) -> Result<SessionFile, SessionStoreError> {
        let path = self.file_path(agent_name)?;
        match read_yaml::<SessionFile>(&path) {
            Ok(Some(file)) => Ok(file),
            Ok(None) => Ok(SessionFile::default()),
            Err(_) => {
                warn!(agent = agent_name, "session file corrupted, starting fresh");
                Ok(SessionFile::default())
            }
        }
    }

    fn save(&self, agent_name: &str, file: &SessionFile) -> Result<(), SessionStoreError> {
        let path = self.file_path(agent_name)?;
        let content = serde_yaml::to_string(file)?;
        atomic_write(&path, content.as_bytes())?;
        Ok(())
    }

    /// Return the existing, non-expired record for `conversation_key`, or
    /// create a fresh one with a freshly generated external session id.
    pub fn get_or_create(
        &self,
        agent_name: &str,
        conversation_key: &str,
    ) -> Result<SessionRecord, SessionStoreError> {
        let mut file = self.load(agent_name)?;
        let now = self.clock.now();

        if let Some(existing) = file.records.get(conversation_key) {
            if !existing.is_expired(now, self.ttl) {
                return Ok(existing.clone().migrate());
            }
        }

        let record = SessionRecord::new(Uuid::new_v4().to_string(), now, None);
        file.records.insert(conversation_key.to_string(), record.clone());
        self.save(agent_name, &file)?;
        Ok(record)
    }

    /// Look up a record without creating one.
    pub fn get(
        &self,
        agent_name: &str,
        conversation_key: &str,
    ) -> Result<Option<SessionRecord>, SessionStoreError> {
        let file = self.load(agent_name)?;
        Ok(file.records.get(conversation_key).cloned().map(|r| r.migrate()))
    }

    /// Resume for `conversation_key`, detecting and clearing a stale
    /// session whose stored working directory no longer matches
    /// `current_working_directory` (§4.H stale-session detection).
    pub fn resolve_for_resume(
        &self,
        agent_name: &str,
        conversation_key: &str,
        current_working_directory: &Path,
    ) -> Result<SessionRecord, SessionStoreError> {
        let mut file = self.load(agent_name)?;
        let now = self.clock.now();
        let current = current_working_directory.to_path_buf();

        if let Some(existing) = file.records.get(conversation_key) {
            if existing.is_stale_for(&current) {
                let from = existing
                    .working_directory
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                warn!(
                    agent = agent_name,
                    session_id = %existing.external_session_id,
                    from,
                    to = %current.display(),
                    "working directory changed, clearing stale session",
                );
                file.records.remove(conversation_key);
                self.save(agent_name, &file)?;
            } else if !existing.is_expired(now, self.ttl) {
                return Ok(existing.clone().migrate());
            }
        }

        let record = SessionRecord::new(Uuid::new_v4().to_string(), now, Some(current));
        file.records.insert(conversation_key.to_string(), record.clone());
        self.save(agent_name, &file)?;
        Ok(record)
    }

    /// Replace the mapping for `conversation_key` with `external_session_id`,
    /// updating `last_message_at` and the working-directory snapshot.
    pub fn set(
        &self,
        agent_name: &str,
        conversation_key: &str,
        external_session_id: impl Into<String>,
        working_directory: Option<PathBuf>,
    ) -> Result<(), SessionStoreError> {
        let mut file = self.load(agent_name)?;
        let now = self.clock.now();
        let record = SessionRecord::new(external_session_id, now, working_directory);
        file.records.insert(conversation_key.to_string(), record);
        self.save(agent_name, &file)
    }

    /// Record token/message usage against an existing session.
    pub fn accumulate_usage(
        &self,
        agent_name: &str,
        conversation_key: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Result<(), SessionStoreError> {
        let mut file = self.load(agent_name)?;
        if let Some(record) = file.records.get_mut(conversation_key) {
            record
                .usage
                .get_or_insert_with(Default::default)
                .accumulate(input_tokens, output_tokens);
            self.save(agent_name, &file)?;
        }
        Ok(())
    }

    /// Refresh `last_message_at` for an existing mapping without
    /// changing its external session id (§4.H `touch`). A no-op if the
    /// conversation key has no record.
    pub fn touch(&self, agent_name: &str, conversation_key: &str) -> Result<(), SessionStoreError> {
        let mut file = self.load(agent_name)?;
        if let Some(record) = file.records.get_mut(conversation_key) {
            record.last_message_at = self.clock.now();
            self.save(agent_name, &file)?;
        }
        Ok(())
    }

    /// Clear a single session mapping (e.g. on explicit `clear_session`).
    pub fn clear(&self, agent_name: &str, conversation_key: &str) -> Result<(), SessionStoreError> {
        let mut file = self.load(agent_name)?;
        if file.records.remove(conversation_key).is_some() {
            self.save(agent_name, &file)?;
        }
        Ok(())
    }

    /// Number of live (non-expired) sessions for one agent.
    pub fn active_count(&self, agent_name: &str) -> Result<usize, SessionStoreError> {
        let file = self.load(agent_name)?;
        let now = self.clock.now();
        Ok(file
            .records
            .values()
            .filter(|r| !r.is_expired(now, self.ttl))
            .count())
    }

    /// Remove expired sessions across every agent file under the root.
    /// Returns the number of sessions cleared. Run at daemon `start`
    /// (§4.G) and can be re-run periodically.
    pub fn cleanup_expired(&self) -> Result<usize, SessionStoreError> {
        let mut cleared = 0;
        let agent_names = list_agent_file_stems(&self.root)?;

        let now = self.clock.now();
        for agent_name in agent_names {
            let mut file = self.load(&agent_name)?;
            let before = file.records.len();
            file.records.retain(|_, record| !record.is_expired(now, self.ttl));
            let removed = before - file.records.len();
            if removed > 0 {
                cleared += removed;
                self.save(&agent_name, &file)?;
            }
        }
        Ok(cleared)
    }
}

fn list_agent_file_stems(root: &Path) -> Result<Vec<String>, SessionStoreError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|source| {
        SessionStoreError::Io(AtomicIoError::Read {
            path: root.to_path_buf(),
            source,
        })
    })? {
        let entry = entry.map_err(|source| {
            SessionStoreError::Io(AtomicIoError::Read {
                path: root.to_path_buf(),
                source,
            })
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;

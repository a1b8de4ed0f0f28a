use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use derive_new::new;
use snafu::ResultExt;
use tempfile::NamedTempFile;
use tracing::instrument;

use crate::model::NotificationState;

pub use error::*;

mod error;

/// Durable home of the [`NotificationState`], a single JSON document.
#[derive(Debug, Clone, new)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole state. A missing or unreadable file is a cold start, never an error.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> NotificationState {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::debug!("no state file yet, starting empty");
                return NotificationState::default();
            }
            Err(error) => {
                tracing::warn!(%error, "cannot read state file, starting empty");
                return NotificationState::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|error| {
            tracing::warn!(%error, "state file is corrupt, starting empty");
            NotificationState::default()
        })
    }

    /// Replace the stored state with `state`.
    ///
    /// The document is written to a sibling temporary file and renamed over the old one, so a
    /// crash mid-write leaves the previous markers intact.
    #[instrument(skip(self, state), fields(path = %self.path.display()))]
    pub fn save(&self, state: &NotificationState) -> Result<()> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(directory).context(CreateTempSnafu {
            path: self.path.clone(),
        })?;

        serde_json::to_writer_pretty(&mut file, state).context(SerializeSnafu)?;
        file.flush().context(FlushSnafu)?;
        file.as_file().sync_all().context(FlushSnafu)?;

        file.persist(&self.path)
            .map_err(|error| error.error)
            .context(ReplaceSnafu {
                path: self.path.clone(),
            })?;

        tracing::debug!("state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{EventKind, MarkerKey};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(StateStore::new(path).load().is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested.json"));

        let mut state = NotificationState::default();
        state.mark_sent(&MarkerKey::threshold(EventKind::Dragon, 5400), day());
        store.save(&state).unwrap();

        // overwrite in place
        state.mark_sent(&MarkerKey::once(EventKind::Lord), day());
        store.save(&state).unwrap();

        assert_eq!(store.load(), state);
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary files must not be left behind");
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("absent").join("state.json"));

        let result = store.save(&NotificationState::default());
        assert!(matches!(result, Err(StateError::CreateTemp { .. })));
    }
}

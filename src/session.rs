use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::events::time_unit::TimestampFallback;
use crate::events::Analysis;
use crate::model::MatchResult;

/// Key the pipeline writes the match result under.
pub const RESULT_KEY: &str = "matchResult";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Session-scoped key/value storage written by the upload flow.
pub trait SessionStore {
    /// Stored value, or `None` if absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;
    fn put(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// The match result loaded for this session, if any.
///
/// Never fails: missing or malformed input leaves the session empty and
/// every view renders its empty state.
#[derive(Debug, Default)]
pub struct Session {
    result: Option<MatchResult>,
}

impl Session {
    pub fn load(store: &dyn SessionStore) -> Self {
        match store.get(RESULT_KEY) {
            Some(json) => Self::from_json(&json),
            None => {
                log::debug!("No match result in session");
                Self::default()
            }
        }
    }

    pub fn from_json(json: &str) -> Self {
        match MatchResult::from_json(json) {
            Ok(result) => Self {
                result: Some(result),
            },
            Err(e) => {
                log::warn!("Stored match result is malformed: {}. Treating as no result.", e);
                Self::default()
            }
        }
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// Normalized view of the loaded result.
    pub fn analysis(&self, fallback: TimestampFallback) -> Option<Analysis> {
        self.result
            .clone()
            .map(|result| Analysis::new(result, fallback))
    }

    /// Teardown hook: forget the result and drop it from the store.
    pub fn clear(&mut self, store: &mut dyn SessionStore) -> Result<()> {
        self.result = None;
        store.remove(RESULT_KEY)
    }
}

//! Runtime configuration for collabnotes front ends.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::service::NOTES_COLLECTION;
use crate::util::normalize_text_option;

/// Environment variable naming the notes collection
pub const COLLECTION_ENV: &str = "COLLABNOTES_COLLECTION";
/// Environment variable pointing at the local `SQLite` store
pub const DB_PATH_ENV: &str = "COLLABNOTES_DB_PATH";

/// Where notes live and which collection holds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesConfig {
    pub collection: String,
    pub store_path: PathBuf,
}

impl NotesConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset or blank values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let collection = normalize_text_option(lookup(COLLECTION_ENV))
            .unwrap_or_else(|| NOTES_COLLECTION.to_string());
        let store_path = match normalize_text_option(lookup(DB_PATH_ENV)) {
            Some(path) => PathBuf::from(path),
            None => default_store_path()?,
        };

        Ok(Self {
            collection,
            store_path,
        })
    }

    /// Apply command-line overrides on top of the loaded values.
    #[must_use]
    pub fn with_overrides(mut self, store_path: Option<PathBuf>, collection: Option<String>) -> Self {
        if let Some(path) = store_path {
            self.store_path = path;
        }
        if let Some(collection) = normalize_text_option(collection) {
            self.collection = collection;
        }
        self
    }
}

/// `<data_dir>/collabnotes/notes.db`
pub fn default_store_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("collabnotes").join("notes.db"))
        .ok_or_else(|| Error::Config("could not resolve a data directory".into()))
}

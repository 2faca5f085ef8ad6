//! JSON storage for the library
//!
//! The whole library lives in one pretty-printed JSON document. Every run
//! loads it once and writes it back once, so there is no locking: two
//! processes running at the same time race and the later save wins.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::Library;

/// Default file name, relative to the working directory
pub const DEFAULT_FILE_NAME: &str = "novel_notes.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read library '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Library '{path}' is not valid")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize library")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write library '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Store for the library document
pub struct LibraryStore {
    path: PathBuf,
}

impl LibraryStore {
    /// Creates a store for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file is present on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the library. A missing file is a first run and yields an empty
    /// library; any other failure is an error.
    pub fn load(&self) -> Result<Library, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Library::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&data).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the full library, replacing the file atomically
    pub fn save(&self, library: &Library) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error(parent))?;
        }

        let temp_path = self.temp_path();

        {
            let file = File::create(&temp_path).map_err(write_error(&temp_path))?;
            let mut writer = BufWriter::new(file);

            serde_json::to_writer_pretty(&mut writer, library).map_err(StoreError::Serialize)?;
            writeln!(writer).map_err(write_error(&temp_path))?;
            writer.flush().map_err(write_error(&temp_path))?;
        }

        fs::rename(&temp_path, &self.path).map_err(write_error(&self.path))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Write { path, source }
}

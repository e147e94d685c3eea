//! Persistence targets for debounced stage saves

use std::path::{Path, PathBuf};

use crate::core::Result;
use super::document::MapDocument;

/// Destination for a stage's persisted map
pub trait MapStore: Send {
    fn save(&mut self, url: &str, doc: &MapDocument) -> Result<()>;
}

/// Writes each stage to `<dir>/<encoded url>.json`
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File that `url` is stored in.
    ///
    /// ASCII letters, digits and `-` are kept; every other byte, `_`
    /// included, becomes `_XX` (uppercase hex), so distinct urls never
    /// share a file.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let mut name = String::with_capacity(url.len());
        for byte in url.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("_{:02X}", byte));
            }
        }
        self.dir.join(format!("{}.json", name))
    }

    /// Read back a previously saved map
    pub fn load(&self, url: &str) -> Result<Option<MapDocument>> {
        let path = self.path_for(url);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        Ok(Some(MapDocument::from_json_slice(&bytes)?))
    }
}

impl MapStore for JsonFileStore {
    fn save(&mut self, url: &str, doc: &MapDocument) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(url);

        // Write to temporary file, then replace
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, doc.to_json_string()?)?;
        std::fs::rename(&temp_path, &path)?;

        log::debug!("Saved '{}' to {}", url, path.display());
        Ok(())
    }
}

//! Editor-wide tunables

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::terrain::Chunk;

/// Configuration shared by grids, stages and the pager
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Tiles per chunk side. Fixed for the lifetime of a grid.
    pub chunk_size: u32,
    /// Maximum number of stages kept loaded
    pub pager_capacity: usize,
    /// Quiet window before a stage's pending edits are saved
    pub save_debounce_ms: u64,
    /// Added to the drag rectangle's top y to get the "flat" height
    pub flat_height_offset: i32,
    /// Where edited maps are written
    pub storage_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            pager_capacity: 2,
            save_debounce_ms: 500,
            flat_height_offset: -1,
            storage_dir: PathBuf::from("maps"),
        }
    }
}

impl EditorConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if self.chunk_size > Chunk::MAX_SIZE {
            return Err(Error::Config(format!(
                "chunk_size {} exceeds the maximum of {}",
                self.chunk_size,
                Chunk::MAX_SIZE
            )));
        }
        if self.pager_capacity == 0 {
            return Err(Error::Config("pager_capacity must be positive".to_string()));
        }
        Ok(())
    }

    /// Read and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.chunk_size, 16);
        assert_eq!(config.pager_capacity, 2);
        assert_eq!(config.save_debounce(), Duration::from_millis(500));
        assert_eq!(config.flat_height_offset, -1);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{ "chunk_size": 8 }"#).unwrap();
        assert_eq!(config.chunk_size, 8);
        assert_eq!(config.pager_capacity, 2);
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = EditorConfig { chunk_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        let config = EditorConfig { pager_capacity: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_chunks() {
        let config = EditorConfig { chunk_size: 70_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        let config = EditorConfig { chunk_size: Chunk::MAX_SIZE, ..Default::default() };
        config.validate().unwrap();
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        let config = EditorConfig { save_debounce_ms: 250, ..Default::default() };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }
}

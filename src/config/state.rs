//! Session state that outlives a single pager

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Resumable editor session.
///
/// Owned by the stage pager and loaded/saved explicitly by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorState {
    /// Url of the most recently evicted stage
    pub oldest_url: Option<String>,
    /// Url of the most recently loaded stage
    pub last_loaded: Option<String>,
}

impl EditorState {
    /// Load from `path`; a missing file yields the default state
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
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
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = EditorState::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(state, EditorState::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = EditorState {
            oldest_url: Some("maps/a.json".to_string()),
            last_loaded: Some("maps/c.json".to_string()),
        };
        state.save(&path).unwrap();
        assert_eq!(EditorState::load(&path).unwrap(), state);
    }
}

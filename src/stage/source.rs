//! Where stage documents are fetched from

use std::path::{Path, PathBuf};

use crate::core::{Error, Result};
use super::document::MapDocument;

/// Asynchronous document fetch.
///
/// Network transports implement this outside the core; a failed fetch is
/// reported as [`Error::Fetch`].
#[allow(async_fn_in_trait)]
pub trait StageSource {
    async fn fetch(&self, url: &str) -> Result<MapDocument>;
}

/// Reads `<root>/<url>` from the local filesystem
#[derive(Clone, Debug)]
pub struct DiskSource {
    root: PathBuf,
}

impl DiskSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }
}

impl StageSource for DiskSource {
    async fn fetch(&self, url: &str) -> Result<MapDocument> {
        let path = self.path_for(url);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::fetch(url, e))?;
        MapDocument::from_json_slice(&bytes).map_err(|e| Error::fetch(url, e))
    }
}

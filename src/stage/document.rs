//! Persisted map document (JSON wire format)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::types::{Result, Vec3};
use crate::terrain::ChunksData;

/// One object entry in `objectsData`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(rename = "clsId")]
    pub class_id: u32,
    #[serde(default)]
    pub args: Map<String, Value>,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ObjectRecord {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// `{ chunksData: {...}, objectsData: {...} }`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    #[serde(rename = "chunksData", default)]
    pub chunks_data: ChunksData,
    #[serde(rename = "objectsData", default)]
    pub objects_data: BTreeMap<String, ObjectRecord>,
}

impl MapDocument {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

//! Admin overrides for chart counts the remote scan gets wrong
//!
//! The scan counts one chart per archive, so game rips that expand into
//! hundreds of charts are undercounted. Overrides only correct the count;
//! size always comes from the local scan or the manifest.
//!
//! File format:
//!
//! ```json
//! {
//!   "overrides": {
//!     "Drive Name": {
//!       "_folder_id": "...",
//!       "_description": "...",
//!       "setlists": { "Setlist Name": { "chart_count": 120 } }
//!     }
//!   }
//! }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Override values for one sub-collection
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SubCollectionOverride {
    #[serde(default)]
    pub chart_count: Option<u64>,
}

/// Overrides for one collection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionOverride {
    #[serde(default, rename = "_folder_id")]
    pub folder_id: Option<String>,
    #[serde(default, rename = "_description")]
    pub description: Option<String>,
    #[serde(default, rename = "setlists")]
    pub sub_collections: HashMap<String, SubCollectionOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct OverrideFile {
    #[serde(default)]
    overrides: HashMap<String, CollectionOverride>,
}

/// Admin override table keyed by collection name
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    collections: HashMap<String, CollectionOverride>,
}

impl Overrides {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides; a missing or malformed file yields an empty table
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No overrides file at {}", path.display());
            return Self::new();
        }

        match fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed overrides {}: {}", path.display(), e);
                Self::new()
            }),
            Err(e) => {
                log::warn!("Cannot read overrides {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Parse overrides from JSON text
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let file: OverrideFile = serde_json::from_str(content)?;
        Ok(Self {
            collections: file.overrides,
        })
    }

    pub fn collection(&self, collection: &str) -> Option<&CollectionOverride> {
        self.collections.get(collection)
    }

    pub fn sub_collection(
        &self,
        collection: &str,
        sub_collection: &str,
    ) -> Option<&SubCollectionOverride> {
        self.collection(collection)?
            .sub_collections
            .get(sub_collection)
    }

    /// The overridden chart count, if one is set
    pub fn item_count(&self, collection: &str, sub_collection: &str) -> Option<u64> {
        self.sub_collection(collection, sub_collection)?.chart_count
    }

    /// The overridden chart count, or `default`
    pub fn get_item_count(&self, collection: &str, sub_collection: &str, default: u64) -> u64 {
        self.item_count(collection, sub_collection).unwrap_or(default)
    }

    pub fn has_override(&self, collection: &str, sub_collection: &str) -> bool {
        self.sub_collection(collection, sub_collection).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Add or replace a single override
    pub fn set_item_count(&mut self, collection: &str, sub_collection: &str, count: u64) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .sub_collections
            .insert(
                sub_collection.to_string(),
                SubCollectionOverride {
                    chart_count: Some(count),
                },
            );
    }
}

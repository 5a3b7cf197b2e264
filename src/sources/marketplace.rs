//! Marketplace descriptors (`.claude-plugin/marketplace.json`).
//!
//! Descriptors come from sources we do not control, so parsing enforces
//! size, nesting-depth and plugin-count limits before deserializing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SmithError};

use super::fetch::{FetchOptions, SourceFetcher};

pub const MARKETPLACE_FILE: &str = ".claude-plugin/marketplace.json";
pub const MAX_MARKETPLACE_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_MARKETPLACE_DEPTH: usize = 10;
pub const MAX_MARKETPLACE_PLUGINS: usize = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketplaceOwner {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketplacePlugin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketplaceDescriptor {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub owner: Option<MarketplaceOwner>,
    #[serde(default)]
    pub plugins: Vec<MarketplacePlugin>,
}

/// Parse a descriptor, enforcing the size, depth and plugin-count limits.
pub fn parse_marketplace(bytes: &[u8]) -> Result<MarketplaceDescriptor> {
    let size = bytes.len() as u64;
    if size > MAX_MARKETPLACE_BYTES {
        return Err(SmithError::MarketplaceTooLarge {
            size,
            limit: MAX_MARKETPLACE_BYTES,
        });
    }
    let value: Value = serde_json::from_slice(bytes)?;
    let depth = json_depth(&value);
    if depth > MAX_MARKETPLACE_DEPTH {
        return Err(SmithError::MarketplaceTooDeep {
            depth,
            limit: MAX_MARKETPLACE_DEPTH,
        });
    }
    let count = value
        .get("plugins")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if count > MAX_MARKETPLACE_PLUGINS {
        return Err(SmithError::MarketplaceTooManyPlugins {
            count,
            limit: MAX_MARKETPLACE_PLUGINS,
        });
    }
    Ok(serde_json::from_value(value)?)
}

fn json_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        Value::Object(map) => 1 + map.values().map(json_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// Looks up a source's marketplace descriptor.
pub trait MarketplaceFetcher {
    fn fetch_marketplace(&self, source: &str) -> Result<MarketplaceDescriptor>;
}

/// Reads the descriptor from a fetched source tree.
pub struct SourceMarketplaceFetcher<'a> {
    fetcher: &'a dyn SourceFetcher,
}

impl<'a> SourceMarketplaceFetcher<'a> {
    pub fn new(fetcher: &'a dyn SourceFetcher) -> Self {
        Self { fetcher }
    }
}

impl MarketplaceFetcher for SourceMarketplaceFetcher<'_> {
    fn fetch_marketplace(&self, source: &str) -> Result<MarketplaceDescriptor> {
        let fetched = self.fetcher.fetch(source, &FetchOptions::default())?;
        read_marketplace(&fetched.path)
    }
}

/// Read `<root>/.claude-plugin/marketplace.json`.
pub fn read_marketplace(root: &Path) -> Result<MarketplaceDescriptor> {
    let path: PathBuf = root.join(MARKETPLACE_FILE);
    let size = std::fs::metadata(&path)
        .map_err(|_| SmithError::NotFound(format!("marketplace {}", path.display())))?
        .len();
    if size > MAX_MARKETPLACE_BYTES {
        return Err(SmithError::MarketplaceTooLarge {
            size,
            limit: MAX_MARKETPLACE_BYTES,
        });
    }
    parse_marketplace(&std::fs::read(&path)?)
}

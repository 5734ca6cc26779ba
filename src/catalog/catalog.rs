use std::collections::HashSet;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use super::descriptor::{Priority, ResourceDescriptor};

/// Ordered, validated list of resources. Ids are unique.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    resources: Vec<ResourceDescriptor>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "resource")]
    resources: Vec<ResourceDescriptor>,
}

impl ResourceCatalog {
    pub fn new(resources: Vec<ResourceDescriptor>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(resources.len());
        for r in &resources {
            if r.id.trim().is_empty() {
                return Err(anyhow!("resource id must not be empty"));
            }
            if r.url.trim().is_empty() {
                return Err(anyhow!("resource {} has an empty url", r.id));
            }
            if !seen.insert(r.id.as_str()) {
                return Err(anyhow!("duplicate resource id: {}", r.id));
            }
        }
        Ok(Self { resources })
    }

    /// Parse `[[resource]]` tables from TOML.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(input).map_err(|e| anyhow!("invalid catalog: {}", e))?;
        Self::new(file.resources)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.iter()
    }

    pub fn get(&self, id: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Members of one tier, in catalog order.
    pub fn tier(&self, priority: Priority) -> Vec<ResourceDescriptor> {
        self.resources
            .iter()
            .filter(|r| r.priority == priority)
            .cloned()
            .collect()
    }

    /// All four tiers in load order. Empty tiers are included.
    pub fn partition(&self) -> Vec<(Priority, Vec<ResourceDescriptor>)> {
        Priority::ALL
            .iter()
            .map(|p| (*p, self.tier(*p)))
            .collect()
    }
}

//! Bundle file schema
//!
//! Only the fields that drive segment assignment are modelled: the service
//! map, each service's unit count and its relation-to-segment bindings.
//! Mapping order is significant (machine slots are assigned by declaration
//! order), so maps keep insertion order. A repeated key replaces the earlier
//! entry in place.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("failed to read bundle {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed bundle: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("service {0} must declare num_units >= 1")]
    NoUnits(String),

    #[error("bundle declares no services")]
    Empty,
}

/// A deployable bundle
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(alias = "applications")]
    pub services: IndexMap<String, ServiceSpec>,
}

/// One service in a bundle
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charm: Option<String>,

    #[serde(default)]
    pub num_units: u32,

    /// Relation (endpoint) name to segment name
    #[serde(default)]
    pub bindings: IndexMap<String, String>,
}

impl ServiceSpec {
    /// Distinct segments this service's units must reach, in first-seen order
    pub fn segments(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for segment in self.bindings.values() {
            if !seen.contains(&segment.as_str()) {
                seen.push(segment);
            }
        }
        seen
    }
}

impl Bundle {
    /// Parse and validate a bundle document
    pub fn from_yaml(doc: &str) -> Result<Self, BundleError> {
        let bundle: Bundle = serde_yaml::from_str(doc)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Read, parse and validate a bundle file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BundleError> {
        let path = path.as_ref();
        let doc = std::fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&doc)
    }

    fn validate(&self) -> Result<(), BundleError> {
        if self.services.is_empty() {
            return Err(BundleError::Empty);
        }
        if let Some((name, _)) = self.services.iter().find(|(_, s)| s.num_units == 0) {
            return Err(BundleError::NoUnits(name.to_string()));
        }
        Ok(())
    }

    /// Total number of units across all services
    pub fn unit_count(&self) -> usize {
        self.services.values().map(|s| s.num_units as usize).sum()
    }
}

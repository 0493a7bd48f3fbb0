//! Deployment configuration

use crate::{Result, Segment, SpacesError};
use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable overriding the MAAS CLI profile
pub const ENV_MAAS_PROFILE: &str = "SPACES_MAAS_PROFILE";
/// Environment variable overriding the controller name
pub const ENV_CONTROLLER: &str = "SPACES_CONTROLLER";
/// Environment variable overriding the bundle path
pub const ENV_BUNDLE: &str = "SPACES_BUNDLE";

/// Everything a provisioning run needs
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Logged-in MAAS CLI profile
    pub maas_profile: String,

    /// Fabric that must already exist and will carry the segment VLANs
    pub managed_fabric: String,

    /// Subnet every node already reaches; parent network for sub-interfaces
    pub managed_network_cidr: String,

    pub default_space: DefaultSpace,

    pub segments: Vec<SegmentConfig>,

    pub bundle: PathBuf,

    pub controller: String,

    pub cloud: String,

    /// Seconds between convergence polls
    pub poll_interval_secs: u64,
}

/// The pre-existing default space and the name it is renamed to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSpace {
    pub sentinel: String,
    pub name: String,
}

impl Default for DefaultSpace {
    fn default() -> Self {
        Self {
            sentinel: "space-0".to_string(),
            name: "default".to_string(),
        }
    }
}

/// A segment as written in the configuration file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub name: String,
    pub cidr: String,
    pub vid: u16,
    pub interface: String,
}

impl SegmentConfig {
    fn new(name: &str, cidr: &str, vid: u16, interface: &str) -> Self {
        Self {
            name: name.to_string(),
            cidr: cidr.to_string(),
            vid,
            interface: interface.to_string(),
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            maas_profile: "maas".to_string(),
            managed_fabric: "managed".to_string(),
            managed_network_cidr: "192.168.1.0/24".to_string(),
            default_space: DefaultSpace::default(),
            segments: vec![
                SegmentConfig::new("internal", "192.168.10.0/24", 10, "enp2s0.10"),
                SegmentConfig::new("public", "192.168.11.0/24", 11, "enp2s0.11"),
                SegmentConfig::new("db", "192.168.12.0/24", 12, "enp2s0.12"),
            ],
            bundle: PathBuf::from("charms/mediawiki/bundle.yaml"),
            controller: "maas".to_string(),
            cloud: "maas".to_string(),
            poll_interval_secs: 5,
        }
    }
}

impl DeployConfig {
    /// Load a YAML configuration file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let doc = std::fs::read_to_string(path)
            .map_err(|e| SpacesError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let mut config = Self::from_yaml(&doc)?;
        config.apply_env_overrides();
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise start from the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    pub fn from_yaml(doc: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(doc).map_err(|e| SpacesError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SPACES_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(profile) = lookup(ENV_MAAS_PROFILE) {
            self.maas_profile = profile;
        }
        if let Some(controller) = lookup(ENV_CONTROLLER) {
            self.controller = controller;
        }
        if let Some(bundle) = lookup(ENV_BUNDLE) {
            self.bundle = PathBuf::from(bundle);
        }
    }

    /// Plan every configured segment; fails before any remote call is made
    pub fn segments(&self) -> Result<Vec<Segment>> {
        let mut planned: Vec<Segment> = Vec::with_capacity(self.segments.len());
        for s in &self.segments {
            let segment = Segment::plan(&s.name, &s.cidr, s.vid, &s.interface)?;
            for other in &planned {
                check_distinct(other, &segment)?;
            }
            planned.push(segment);
        }
        Ok(planned)
    }

    /// Managed network in canonical form
    pub fn managed_network(&self) -> Result<Ipv4Network> {
        self.managed_network_cidr.parse().map_err(|e| {
            SpacesError::InvalidTopologyConfig(format!(
                "managed network {:?}: {}",
                self.managed_network_cidr, e
            ))
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(SpacesError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Two segments may share nothing the inventory keys on
fn check_distinct(a: &Segment, b: &Segment) -> Result<()> {
    let clash = if a.name() == b.name() {
        "name"
    } else if a.network().contains(b.network_address())
        || b.network().contains(a.network_address())
    {
        "address block"
    } else if a.vid() == b.vid() {
        "VLAN id"
    } else if a.interface() == b.interface() {
        "interface"
    } else {
        return Ok(());
    };
    Err(SpacesError::InvalidTopologyConfig(format!(
        "segments {} and {} share the same {}",
        a.name(),
        b.name(),
        clash
    )))
}

//! Session configuration

use serde::{Deserialize, Serialize};

use crate::{memory::RegionConfig, sync::WaitPolicy};

/// Everything a side needs to start a bridge session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub region: RegionConfig,
    /// Bounds the publish wait and the wait for a peer that is still initialising
    pub wait: WaitPolicy,
    /// Take over a role the region still records as held by a dead process
    #[serde(default)]
    pub reclaim: bool,
}

impl BridgeConfig {
    /// Defaults for the named session; the region is created if missing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            region: RegionConfig::new(name),
            wait: WaitPolicy::default(),
            reclaim: false,
        }
    }

    pub fn with_region(mut self, region: RegionConfig) -> Self {
        self.region = region;
        self
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_reclaim(mut self, reclaim: bool) -> Self {
        self.reclaim = reclaim;
        self
    }

    /// Open an existing region only, failing with `NotFound` otherwise
    pub fn open_existing(mut self) -> Self {
        self.region.create = false;
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.region.validate()?;
        self.wait.validate()
    }
}

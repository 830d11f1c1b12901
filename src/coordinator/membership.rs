//! Cloud membership view

use crate::common::{NodeConfig, Result};
use std::collections::HashSet;

/// Instance ids the control plane currently reports alive in this node's rack
pub trait MembershipProvider: Send + Sync {
    fn live_rack_members(&self) -> Result<HashSet<String>>;
}

/// Fixed membership set
#[derive(Debug, Clone, Default)]
pub struct StaticMembership {
    live: HashSet<String>,
}

impl StaticMembership {
    pub fn new<I, S>(live: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            live: live.into_iter().map(Into::into).collect(),
        }
    }

    /// Configured live set, always including this node itself
    pub fn from_config<I, S>(config: &dyn NodeConfig, live: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut membership = Self::new(live);
        membership.live.insert(config.instance_id().to_string());
        membership
    }
}

impl MembershipProvider for StaticMembership {
    fn live_rack_members(&self) -> Result<HashSet<String>> {
        Ok(self.live.clone())
    }
}

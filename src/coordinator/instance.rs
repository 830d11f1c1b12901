//! Directory records describing cluster members

use crate::common::NodeConfig;
use serde::{Deserialize, Serialize};

/// One cluster member's identity and location.
///
/// `(app, id)` is unique within a directory. Records are bincode-encoded by
/// the RocksDB directory, so every field is always serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInstance {
    pub app: String,
    /// Cluster member id, `datacenter.instance_id`
    pub id: String,
    pub instance_id: String,
    pub hostname: String,
    pub host_ip: String,
    /// Availability zone
    pub rack: String,
    pub datacenter: String,
    pub asg: String,
    /// Milliseconds since the Unix epoch
    pub update_time: i64,
    /// Reserved for data-partitioning assignment
    pub token: Option<String>,
}

impl ClusterInstance {
    /// Directory key for an instance: `datacenter.instance_id`
    pub fn member_id(datacenter: &str, instance_id: &str) -> String {
        format!("{}.{}", datacenter, instance_id)
    }

    /// Same deployment unit and same rack
    pub fn in_scope(&self, asg: &str, rack: &str) -> bool {
        self.asg == asg && self.rack == rack
    }
}

impl std::fmt::Display for ClusterInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} ({} {} {} asg={})",
            self.app, self.id, self.hostname, self.host_ip, self.rack, self.asg
        )
    }
}

/// Request to create a directory record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstance {
    pub app: String,
    pub id: String,
    pub instance_id: String,
    pub hostname: String,
    pub host_ip: String,
    pub rack: String,
    pub datacenter: String,
    pub asg: String,
    pub token: Option<String>,
}

impl NewInstance {
    /// This node's own registration
    pub fn from_config(config: &dyn NodeConfig) -> Self {
        Self {
            app: config.app_name().to_string(),
            id: ClusterInstance::member_id(config.datacenter(), config.instance_id()),
            instance_id: config.instance_id().to_string(),
            hostname: config.hostname().to_string(),
            host_ip: config.host_ip().to_string(),
            rack: config.rack().to_string(),
            datacenter: config.datacenter().to_string(),
            asg: config.asg_name().to_string(),
            token: None,
        }
    }

    /// Materialize the record, stamped with `update_time`
    pub fn into_instance(self, update_time: i64) -> ClusterInstance {
        ClusterInstance {
            app: self.app,
            id: self.id,
            instance_id: self.instance_id,
            hostname: self.hostname,
            host_ip: self.host_ip,
            rack: self.rack,
            datacenter: self.datacenter,
            asg: self.asg,
            update_time,
            token: self.token,
        }
    }
}

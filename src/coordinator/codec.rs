//! JSON instances document
//!
//! ```text
//! {"instances": {"instance-0": {"host_name": ..., "id": ..., ...}, "instance-1": ...}}
//! ```

use crate::common::{Error, Result};
use crate::coordinator::instance::ClusterInstance;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const INSTANCES: &str = "instances";

#[derive(Debug, Serialize, Deserialize)]
struct InstanceEntry {
    host_name: String,
    id: String,
    app_name: String,
    instance_id: String,
    availability_zone: String,
    public_ip: String,
    dc: String,
    update_time: i64,
    #[serde(default)]
    asg_name: String,
}

impl From<&ClusterInstance> for InstanceEntry {
    fn from(instance: &ClusterInstance) -> Self {
        Self {
            host_name: instance.hostname.clone(),
            id: instance.id.clone(),
            app_name: instance.app.clone(),
            instance_id: instance.instance_id.clone(),
            availability_zone: instance.rack.clone(),
            public_ip: instance.host_ip.clone(),
            dc: instance.datacenter.clone(),
            update_time: instance.update_time,
            asg_name: instance.asg.clone(),
        }
    }
}

impl From<InstanceEntry> for ClusterInstance {
    fn from(entry: InstanceEntry) -> Self {
        Self {
            app: entry.app_name,
            id: entry.id,
            instance_id: entry.instance_id,
            hostname: entry.host_name,
            host_ip: entry.public_ip,
            rack: entry.availability_zone,
            datacenter: entry.dc,
            asg: entry.asg_name,
            update_time: entry.update_time,
            token: None,
        }
    }
}

fn entry_key(index: usize) -> String {
    format!("instance-{}", index)
}

/// Encode instances as the listing document
pub fn instances_to_json(instances: &[ClusterInstance]) -> Result<Value> {
    let mut entries = Map::new();
    for (index, instance) in instances.iter().enumerate() {
        entries.insert(
            entry_key(index),
            serde_json::to_value(InstanceEntry::from(instance))?,
        );
    }

    let mut document = Map::new();
    document.insert(INSTANCES.to_string(), Value::Object(entries));
    Ok(Value::Object(document))
}

/// Decode a listing document, reading `instance-0, instance-1, ...` until the
/// first missing index. Tokens are not part of the document.
pub fn instances_from_json(document: &Value) -> Result<Vec<ClusterInstance>> {
    let entries = document
        .get(INSTANCES)
        .and_then(Value::as_object)
        .ok_or_else(|| Error::Corrupted("missing \"instances\" object".into()))?;

    let mut instances = Vec::new();
    while let Some(entry) = entries.get(&entry_key(instances.len())) {
        let entry: InstanceEntry = serde_json::from_value(entry.clone())?;
        instances.push(entry.into());
    }

    Ok(instances)
}

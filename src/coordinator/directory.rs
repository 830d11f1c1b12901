//! Shared directory of instance records
//!
//! The directory is external and shared by every node of the deployment; it
//! is responsible for its own consistency under concurrent peers. Creating an
//! existing `(app, id)` replaces the record. Deleting a record that is already
//! gone succeeds, since several peers may sweep the same dead instance.

use crate::common::{timestamp_now_millis, Error, Result};
use crate::coordinator::instance::{ClusterInstance, NewInstance};
use std::collections::HashMap;
use std::sync::Mutex;

/// Durable store of instance records, keyed per cluster name
pub trait Directory: Send + Sync {
    fn create(&self, instance: &NewInstance) -> Result<ClusterInstance>;
    fn delete(&self, instance: &ClusterInstance) -> Result<()>;
    fn list_all(&self, cluster_name: &str) -> Result<Vec<ClusterInstance>>;
}

/// In-memory directory, listing in insertion order
#[derive(Default)]
pub struct MemoryDirectory {
    clusters: Mutex<HashMap<String, Vec<ClusterInstance>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record as-is, bypassing `create`'s timestamping
    pub fn insert(&self, instance: ClusterInstance) -> Result<()> {
        let mut clusters = self.lock()?;
        upsert(clusters.entry(instance.app.clone()).or_default(), instance);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<ClusterInstance>>>> {
        self.clusters
            .lock()
            .map_err(|_| Error::Internal("directory lock poisoned".into()))
    }
}

fn upsert(records: &mut Vec<ClusterInstance>, instance: ClusterInstance) {
    match records.iter_mut().find(|r| r.id == instance.id) {
        Some(existing) => *existing = instance,
        None => records.push(instance),
    }
}

impl Directory for MemoryDirectory {
    fn create(&self, instance: &NewInstance) -> Result<ClusterInstance> {
        let record = instance.clone().into_instance(timestamp_now_millis());
        self.insert(record.clone())?;
        Ok(record)
    }

    fn delete(&self, instance: &ClusterInstance) -> Result<()> {
        let mut clusters = self.lock()?;
        if let Some(records) = clusters.get_mut(&instance.app) {
            records.retain(|r| r.id != instance.id);
        }
        Ok(())
    }

    fn list_all(&self, cluster_name: &str) -> Result<Vec<ClusterInstance>> {
        Ok(self.lock()?.get(cluster_name).cloned().unwrap_or_default())
    }
}

//! Persistent directory using RocksDB
//!
//! Stores:
//! - Instance records (`app/member_id` → bincode `ClusterInstance`)

use crate::common::{timestamp_now_millis, Error, Result};
use crate::coordinator::directory::Directory;
use crate::coordinator::instance::{ClusterInstance, NewInstance};
use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, DB};
use std::path::Path;

const CF_INSTANCES: &str = "instances";
const KEY_SEPARATOR: char = '/';

/// Cluster names are key prefixes and may not contain the separator
fn check_cluster_name(name: &str) -> Result<()> {
    if name.contains(KEY_SEPARATOR) {
        return Err(Error::InvalidConfig(format!(
            "cluster name {:?} must not contain '{}'",
            name, KEY_SEPARATOR
        )));
    }
    Ok(())
}

fn record_key(app: &str, member_id: &str) -> String {
    format!("{}{}{}", app, KEY_SEPARATOR, member_id)
}

/// Directory backed by a local RocksDB database
pub struct RocksDirectory {
    db: DB,
}

impl RocksDirectory {
    /// Open or create the directory database
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, path, vec![CF_INSTANCES])?;

        Ok(Self { db })
    }

    fn instances(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_INSTANCES)
            .ok_or_else(|| Error::Internal("missing column family: instances".into()))
    }

    fn put(&self, instance: &ClusterInstance) -> Result<()> {
        check_cluster_name(&instance.app)?;
        let cf = self.instances()?;
        let value = bincode::serialize(instance)?;
        self.db
            .put_cf(cf, record_key(&instance.app, &instance.id).as_bytes(), value)?;
        Ok(())
    }
}

impl Directory for RocksDirectory {
    fn create(&self, instance: &NewInstance) -> Result<ClusterInstance> {
        let record = instance.clone().into_instance(timestamp_now_millis());
        self.put(&record)?;
        Ok(record)
    }

    fn delete(&self, instance: &ClusterInstance) -> Result<()> {
        let cf = self.instances()?;
        self.db
            .delete_cf(cf, record_key(&instance.app, &instance.id).as_bytes())?;
        Ok(())
    }

    fn list_all(&self, cluster_name: &str) -> Result<Vec<ClusterInstance>> {
        check_cluster_name(cluster_name)?;
        let cf = self.instances()?;
        let prefix = format!("{}{}", cluster_name, KEY_SEPARATOR);
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        let mut instances = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            instances.push(bincode::deserialize(&value)?);
        }

        Ok(instances)
    }
}

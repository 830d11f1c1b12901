//! Configuration for the escar sidecar
//!
//! Configuration is layered: an optional TOML file, then `ESCAR_` environment
//! variables (`ESCAR_IDENTITY__RACK=us-east-1a`). The resolved snapshot is
//! immutable for the lifetime of the process.

use crate::common::retry::RetryPolicy;
use crate::common::utils::split_names;
use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "ESCAR";

/// Read-only view of this node's identity and deployment mode.
pub trait NodeConfig: Send + Sync {
    fn app_name(&self) -> &str;
    fn datacenter(&self) -> &str;
    fn instance_id(&self) -> &str;
    fn hostname(&self) -> &str;
    fn host_ip(&self) -> &str;
    fn rack(&self) -> &str;
    fn asg_name(&self) -> &str;
    fn tribe_mode_enabled(&self) -> bool;
    /// Ordered list of clusters this tribe node federates.
    fn tribe_cluster_names(&self) -> &[String];
    /// Masters run in their own autoscaling group.
    fn dedicated_deployment_enabled(&self) -> bool;
    fn debug_enabled(&self) -> bool;
}

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// This node's identity
    pub identity: IdentityConfig,

    #[serde(default)]
    pub tribe: TribeConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub membership: MembershipConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Node identity, as assigned by the cloud control plane
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub app_name: String,
    /// Region
    pub datacenter: String,
    pub instance_id: String,
    pub hostname: String,
    pub host_ip: String,
    /// Availability zone
    pub rack: String,
    pub asg_name: String,

    #[serde(default)]
    pub dedicated_deployment: bool,

    #[serde(default)]
    pub debug: bool,
}

/// Tribe (federation) mode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TribeConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub clusters: Vec<String>,
}

/// Retry policy for startup calls
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    RetryPolicy::default().max_attempts
}
fn default_backoff_ms() -> u64 {
    RetryPolicy::default().backoff.as_millis() as u64
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    #[default]
    Memory,
    Rocksdb,
}

/// Directory backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub backend: DirectoryBackend,

    /// RocksDB path
    #[serde(default = "default_directory_path")]
    pub path: PathBuf,
}

fn default_directory_path() -> PathBuf {
    PathBuf::from("./escar-data")
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            backend: DirectoryBackend::default(),
            path: default_directory_path(),
        }
    }
}

/// Static membership view of this node's rack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipConfig {
    #[serde(default)]
    pub live_instances: Vec<String>,
}

/// HTTP query surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

fn default_http_enabled() -> bool {
    true
}
fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl Config {
    /// Config with default sections around the given identity
    pub fn new(identity: IdentityConfig) -> Self {
        Self {
            identity,
            tribe: TribeConfig::default(),
            retry: RetryConfig::default(),
            directory: DirectoryConfig::default(),
            membership: MembershipConfig::default(),
            http: HttpConfig::default(),
            log_level: default_log_level(),
        }
    }

    /// Load from an optional TOML file overlaid with `ESCAR_` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("tribe.clusters")
                    .with_list_parse_key("membership.live_instances")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn normalize(&mut self) {
        self.tribe.clusters = split_names(&self.tribe.clusters);
        self.membership.live_instances = split_names(&self.membership.live_instances);
    }

    /// Reject snapshots the coordinator cannot run with
    pub fn validate(&self) -> Result<()> {
        let id = &self.identity;
        for (field, value) in [
            ("identity.app_name", &id.app_name),
            ("identity.datacenter", &id.datacenter),
            ("identity.instance_id", &id.instance_id),
            ("identity.rack", &id.rack),
            ("identity.asg_name", &id.asg_name),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{} must be set", field)));
            }
        }

        if self.tribe.enabled && split_names(&self.tribe.clusters).is_empty() {
            return Err(Error::InvalidConfig(
                "tribe mode requires one or more cluster names".into(),
            ));
        }

        // Cluster names prefix directory keys as `name/member_id`
        let clusters = split_names(&self.tribe.clusters);
        for name in std::iter::once(&id.app_name).chain(clusters.iter()) {
            if name.contains('/') {
                return Err(Error::InvalidConfig(format!(
                    "cluster name {:?} must not contain '/'",
                    name
                )));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

impl NodeConfig for Config {
    fn app_name(&self) -> &str {
        &self.identity.app_name
    }
    fn datacenter(&self) -> &str {
        &self.identity.datacenter
    }
    fn instance_id(&self) -> &str {
        &self.identity.instance_id
    }
    fn hostname(&self) -> &str {
        &self.identity.hostname
    }
    fn host_ip(&self) -> &str {
        &self.identity.host_ip
    }
    fn rack(&self) -> &str {
        &self.identity.rack
    }
    fn asg_name(&self) -> &str {
        &self.identity.asg_name
    }
    fn tribe_mode_enabled(&self) -> bool {
        self.tribe.enabled
    }
    fn tribe_cluster_names(&self) -> &[String] {
        &self.tribe.clusters
    }
    fn dedicated_deployment_enabled(&self) -> bool {
        self.identity.dedicated_deployment
    }
    fn debug_enabled(&self) -> bool {
        self.identity.debug
    }
}

//! Instance coordinator
//!
//! Turns the local configuration into a registered cluster identity and
//! answers identity and role queries for the rest of the sidecar.
//!
//! Startup runs two phases, each under its own retry executor:
//! 1. Dead-instance sweep: delete records in this node's ASG and rack whose
//!    instance id the membership provider no longer reports alive.
//! 2. Self-registration: create this node's record and cache it.
//!
//! A coordinator value only exists once both phases succeeded.

use crate::common::{
    contains_ignore_case, split_names, Error, NodeConfig, Result, RetryExecutor, RetryPolicy,
};
use crate::coordinator::directory::Directory;
use crate::coordinator::instance::{ClusterInstance, NewInstance};
use crate::coordinator::membership::MembershipProvider;
use std::sync::Arc;

/// What a dead-instance sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records listed across the configured scope
    pub inspected: usize,
    /// Instance ids whose records were deleted
    pub deleted: Vec<String>,
}

/// Registered identity of this node, plus read access to the directory
pub struct InstanceCoordinator {
    directory: Arc<dyn Directory>,
    config: Arc<dyn NodeConfig>,
    instance: ClusterInstance,
}

impl InstanceCoordinator {
    /// Sweep dead peers and register this node with the default retry policy
    pub fn start(
        directory: Arc<dyn Directory>,
        membership: Arc<dyn MembershipProvider>,
        config: Arc<dyn NodeConfig>,
    ) -> Result<Self> {
        Self::start_with_policy(directory, membership, config, RetryPolicy::default())
    }

    pub fn start_with_policy(
        directory: Arc<dyn Directory>,
        membership: Arc<dyn MembershipProvider>,
        config: Arc<dyn NodeConfig>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        tracing::info!("Deregistering dead instances");
        let report = RetryExecutor::new("dead instance sweep", policy).call(|| {
            sweep_dead_instances(directory.as_ref(), membership.as_ref(), config.as_ref())
        })?;
        tracing::info!(
            "Sweep inspected {} instances, removed {}",
            report.inspected,
            report.deleted.len()
        );

        tracing::info!("Registering instance");
        let instance = RetryExecutor::new("instance registration", policy)
            .call(|| register_instance(directory.as_ref(), config.as_ref()))?;
        tracing::info!("Instance details: {}", instance);

        Ok(Self {
            directory,
            config,
            instance,
        })
    }

    /// This node's registered record
    pub fn get_instance(&self) -> &ClusterInstance {
        &self.instance
    }

    /// Every record in scope, read fresh from the directory.
    ///
    /// In tribe mode this is each configured cluster's listing concatenated in
    /// configured order, without deduplication. Any failed listing fails the
    /// whole call.
    pub fn get_all_instances(&self) -> Result<Vec<ClusterInstance>> {
        list_instances(self.directory.as_ref(), self.config.as_ref())
    }

    /// Every node is master-eligible unless masters have a dedicated ASG
    pub fn is_master(&self) -> bool {
        is_master(self.config.as_ref())
    }

    pub fn config(&self) -> &dyn NodeConfig {
        self.config.as_ref()
    }
}

/// Master eligibility for a configuration
pub fn is_master(config: &dyn NodeConfig) -> bool {
    !config.dedicated_deployment_enabled() || contains_ignore_case(config.asg_name(), "master")
}

/// List the records in this node's scope: its app, or every tribe cluster
pub fn list_instances(
    directory: &dyn Directory,
    config: &dyn NodeConfig,
) -> Result<Vec<ClusterInstance>> {
    let instances = if config.tribe_mode_enabled() {
        let clusters = split_names(config.tribe_cluster_names());
        if clusters.is_empty() {
            return Err(Error::InvalidConfig(
                "tribe mode requires one or more cluster names".into(),
            ));
        }

        let mut all = Vec::new();
        for cluster in &clusters {
            all.extend(directory.list_all(cluster)?);
        }
        all
    } else {
        directory.list_all(config.app_name())?
    };

    if config.debug_enabled() {
        for instance in &instances {
            tracing::debug!("{}", instance);
        }
    }

    Ok(instances)
}

/// Delete records in this node's ASG and rack that are no longer alive.
///
/// Records of other ASGs or racks are never touched.
pub fn sweep_dead_instances(
    directory: &dyn Directory,
    membership: &dyn MembershipProvider,
    config: &dyn NodeConfig,
) -> Result<SweepReport> {
    let instances = list_instances(directory, config)?;
    let live = membership.live_rack_members()?;

    let mut report = SweepReport {
        inspected: instances.len(),
        deleted: Vec::new(),
    };

    for dead in instances.iter().filter(|instance| {
        instance.in_scope(config.asg_name(), config.rack())
            && !live.contains(&instance.instance_id)
    }) {
        tracing::info!("Found dead instance: {}", dead.instance_id);
        directory.delete(dead)?;
        report.deleted.push(dead.instance_id.clone());
    }

    Ok(report)
}

/// Create this node's record from configuration
pub fn register_instance(
    directory: &dyn Directory,
    config: &dyn NodeConfig,
) -> Result<ClusterInstance> {
    directory.create(&NewInstance::from_config(config))
}

//! Sidecar process wiring

use crate::common::{Config, DirectoryBackend, Error, NodeConfig, Result};
use crate::coordinator::directory::{Directory, MemoryDirectory};
use crate::coordinator::http::{create_router, IdentityState};
use crate::coordinator::manager::InstanceCoordinator;
use crate::coordinator::membership::{MembershipProvider, StaticMembership};
use crate::coordinator::metadata::RocksDirectory;
use std::sync::Arc;

/// Open the configured directory backend
pub fn open_directory(config: &Config) -> Result<Arc<dyn Directory>> {
    Ok(match config.directory.backend {
        DirectoryBackend::Memory => Arc::new(MemoryDirectory::new()),
        DirectoryBackend::Rocksdb => Arc::new(RocksDirectory::open(&config.directory.path)?),
    })
}

pub struct Sidecar {
    config: Arc<Config>,
}

impl Sidecar {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Register this node, then serve identity queries until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting escar sidecar: {}", self.config.instance_id());
        tracing::info!("  App: {}", self.config.app_name());
        tracing::info!("  ASG: {}", self.config.asg_name());
        tracing::info!("  Rack: {}", self.config.rack());
        tracing::info!("  Directory: {:?}", self.config.directory.backend);

        let directory = open_directory(&self.config)?;
        let membership: Arc<dyn MembershipProvider> = Arc::new(StaticMembership::from_config(
            self.config.as_ref(),
            self.config.membership.live_instances.iter().cloned(),
        ));
        let node_config: Arc<dyn NodeConfig> = self.config.clone();
        let policy = self.config.retry.policy();

        // Startup blocks on backoff sleeps
        let coordinator = tokio::task::spawn_blocking(move || {
            InstanceCoordinator::start_with_policy(directory, membership, node_config, policy)
        })
        .await
        .map_err(|e| Error::Internal(format!("startup task failed: {}", e)))??;
        let coordinator = Arc::new(coordinator);

        tracing::info!(
            "✓ Registered {} (master eligible: {})",
            coordinator.get_instance().id,
            coordinator.is_master()
        );

        if !self.config.http.enabled {
            tokio::signal::ctrl_c().await?;
            return Ok(());
        }

        let router = create_router(IdentityState { coordinator });
        let listener = tokio::net::TcpListener::bind(self.config.http.bind_addr).await?;
        tracing::info!("  HTTP API: {}", self.config.http.bind_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                }
            })
            .await?;

        tracing::info!("Sidecar stopped");
        Ok(())
    }
}

//! # escar
//!
//! Identity and membership coordination for a data-store sidecar:
//! - Durable, externally visible identity record per node
//! - Sweep of stale records left by terminated nodes, scoped to the node's
//!   own autoscaling group and rack
//! - Master eligibility and cluster membership queries
//!
//! ## Startup
//!
//! ```text
//!  Config ──┐
//!           ├─► InstanceCoordinator::start
//! Directory ┤     1. sweep dead instances   (retried)
//!           │     2. register this instance (retried)
//! Membership┘
//!                 └─► ready: get_instance / get_all_instances / is_master
//! ```
//!
//! ## Usage
//!
//! ```bash
//! escar serve --config ./escar.toml
//! escar instances --config ./escar.toml
//! ```

pub mod common;
pub mod coordinator;

// Re-export commonly used types
pub use common::{Config, Error, NodeConfig, Result, RetryExecutor, RetryPolicy};
pub use coordinator::{ClusterInstance, Directory, InstanceCoordinator, MembershipProvider};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

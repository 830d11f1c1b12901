//! Instance coordination
//!
//! The coordinator is responsible for:
//! - Sweeping dead peers' records from the shared directory
//! - Registering this node's identity
//! - Answering identity and role queries (in-process and over HTTP)

pub mod codec;
pub mod directory;
pub mod http;
pub mod instance;
pub mod manager;
pub mod membership;
pub mod metadata;
pub mod server;

pub use directory::{Directory, MemoryDirectory};
pub use instance::{ClusterInstance, NewInstance};
pub use manager::{InstanceCoordinator, SweepReport};
pub use membership::{MembershipProvider, StaticMembership};
pub use metadata::RocksDirectory;
pub use server::Sidecar;

//! Common utilities and types shared across escar

pub mod config;
pub mod error;
pub mod retry;
pub mod utils;

pub use config::{
    Config, DirectoryBackend, DirectoryConfig, HttpConfig, IdentityConfig, MembershipConfig,
    NodeConfig, RetryConfig, TribeConfig,
};
pub use error::{Error, FailureClass, Result};
pub use retry::{Attempt, AttemptStatus, Outcome, RetryExecutor, RetryPolicy, Sleeper, ThreadSleeper};
pub use utils::{contains_ignore_case, split_names, timestamp_now_millis};

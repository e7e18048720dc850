#![deny(clippy::expect_used, clippy::unwrap_used)]

//! Lifecycle phase tracking and change notification for a cluster client.
//! 集群客户端的生命周期阶段跟踪与变更通知。

pub mod config;
pub mod error;
pub mod lifecycle;

pub use config::LifecycleConfig;
pub use error::{Error, Result};
pub use lifecycle::{LifecycleDriver, LifecyclePhase, LifecycleTracker, ListenerId};

//! 客户端生命周期模块
//! Client Lifecycle Module
//!
//! 该模块跟踪客户端相对于集群的连接阶段，并把阶段变化分发给已注册的监听器。
//! 集群发现、连接建立和成员管理不在此处；它们作为驱动方调用 `transition`。
//!
//! This module tracks the client's connectivity phase relative to the cluster
//! and fans phase changes out to registered listeners. Discovery, connection
//! establishment and membership live elsewhere; they act as drivers that call
//! `transition`.

mod build_info;
mod listener;
mod panic_capture;
mod phase;
mod tracker;

pub use build_info::BuildInfo;
pub use listener::{LifecycleListener, ListenerCallback, ListenerId};
pub use phase::{ALL_PHASES, LifecyclePhase};
pub use tracker::{LifecycleDriver, LifecycleTracker};

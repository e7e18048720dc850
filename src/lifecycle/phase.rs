//! 客户端生命周期阶段
//! Client lifecycle phases
//!
//! 该模块只描述阶段本身，不约束阶段之间的转换顺序；合法的转换由外部驱动方决定。
//!
//! This module only describes the phases themselves and does not constrain the
//! order of transitions between them; legal transitions are up to the external
//! driver.

use crate::error::{Error, Result};
use std::{fmt, str::FromStr};

/// 客户端相对于集群的连接阶段
/// Connectivity phase of the client relative to the cluster
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// 客户端正在启动，构造时自动进入
    /// The client is starting; entered automatically at construction
    Starting,
    /// 已连接到集群
    /// Connected to the cluster
    Connected,
    /// 与集群断开连接
    /// Disconnected from the cluster
    Disconnected,
    /// 正在关闭，客户端从此不再存活
    /// Shutting down; the client is no longer live from here on
    ShuttingDown,
    /// 已关闭
    /// Shut down
    Shutdown,
}

/// Every lifecycle phase, in the order a well-behaved driver visits them.
pub const ALL_PHASES: [LifecyclePhase; 5] = [
    LifecyclePhase::Starting,
    LifecyclePhase::Connected,
    LifecyclePhase::Disconnected,
    LifecyclePhase::ShuttingDown,
    LifecyclePhase::Shutdown,
];

impl LifecyclePhase {
    /// Stable upper-case name used in log lines.
    /// 日志中使用的稳定大写名称。
    pub const fn as_str(self) -> &'static str {
        match self {
            LifecyclePhase::Starting => "STARTING",
            LifecyclePhase::Connected => "CONNECTED",
            LifecyclePhase::Disconnected => "DISCONNECTED",
            LifecyclePhase::ShuttingDown => "SHUTTING_DOWN",
            LifecyclePhase::Shutdown => "SHUTDOWN",
        }
    }

    /// True once the client has started shutting down.
    /// 客户端开始关闭后为真。
    pub const fn ends_liveness(self) -> bool {
        matches!(self, LifecyclePhase::ShuttingDown | LifecyclePhase::Shutdown)
    }

    /// 是否为终止阶段 `SHUTDOWN`
    /// Whether this is the terminal `SHUTDOWN` phase
    pub const fn is_terminal(self) -> bool {
        matches!(self, LifecyclePhase::Shutdown)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecyclePhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ALL_PHASES
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownPhase(s.to_string()))
    }
}

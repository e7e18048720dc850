//! 定义了生命周期跟踪器的可配置参数。
//! Defines configurable parameters for the lifecycle tracker.

use crate::lifecycle::{BuildInfo, LifecycleListener, ListenerCallback};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// The client name used in transition log lines when none is configured.
/// 未配置时在状态转换日志中使用的客户端名称。
pub const DEFAULT_CLIENT_NAME: &str = "HazelcastClient";

/// A structure containing all configurable parameters for a lifecycle tracker.
///
/// 包含生命周期跟踪器所有可配置参数的结构体。
#[derive(Clone)]
pub struct LifecycleConfig {
    /// Listeners registered before the initial `STARTING` event fires.
    /// 在初始 `STARTING` 事件触发之前注册的监听器。
    pub listeners: Vec<ListenerCallback>,

    /// Extra metadata merged into every log record the tracker emits.
    /// Rendered as space separated `key=value` pairs in key order.
    ///
    /// 合并到跟踪器发出的每条日志记录中的额外元数据。
    /// 按键顺序渲染为以空格分隔的 `key=value` 对。
    pub logger_extras: BTreeMap<String, String>,

    /// Build metadata used to prefix every transition log line.
    /// 用于为每条状态转换日志添加前缀的构建元数据。
    pub build_info: Option<BuildInfo>,

    /// Name of the client in transition log lines.
    /// 状态转换日志中的客户端名称。
    pub client_name: String,
}

impl fmt::Debug for LifecycleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleConfig")
            .field("listeners_count", &self.listeners.len())
            .field("logger_extras", &self.logger_extras)
            .field("build_info", &self.build_info)
            .field("client_name", &self.client_name)
            .finish()
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            logger_extras: BTreeMap::new(),
            build_info: BuildInfo::from_build_env(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
        }
    }
}

impl LifecycleConfig {
    /// Adds a listener to be registered at construction time.
    /// 添加一个在构造时注册的监听器。
    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: LifecycleListener + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Adds one `key=value` pair to the log metadata.
    /// 向日志元数据添加一个 `key=value` 对。
    pub fn with_logger_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.logger_extras.insert(key.into(), value.into());
        self
    }

    /// Sets the build metadata that prefixes transition log lines.
    /// 设置作为状态转换日志前缀的构建元数据。
    pub fn with_build_info(mut self, build_info: Option<BuildInfo>) -> Self {
        self.build_info = build_info;
        self
    }

    /// Sets the client name used in transition log lines.
    /// 设置状态转换日志中的客户端名称。
    pub fn with_client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = client_name.into();
        self
    }

    /// Renders `logger_extras` into the single field value attached to log records.
    /// 将 `logger_extras` 渲染为附加到日志记录上的单个字段值。
    pub(crate) fn render_logger_extras(&self) -> String {
        self.logger_extras
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

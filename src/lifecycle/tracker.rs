//! 客户端生命周期跟踪器 - 记录当前阶段并通知监听器
//! Client Lifecycle Tracker - Records the current phase and notifies listeners
//!
//! 跟踪器是阶段状态唯一的修改者。外部驱动方（连接管理、集群成员管理）在连接状态
//! 变化时调用 `transition`，跟踪器更新状态、记录日志，并在调用方线程上依次同步
//! 调用每个监听器。
//!
//! The tracker is the only mutator of phase state. External drivers (connection
//! management, cluster membership) call `transition` when connectivity changes;
//! the tracker updates the state, logs it, and synchronously invokes every
//! listener in turn on the caller's thread.
//!
//! # Delivery contract
//!
//! - Listeners run in-line, in registration order. A slow listener delays the
//!   caller of `transition` and every listener after it in the same pass.
//! - Each pass works on a snapshot taken after the new phase is stored.
//!   Listeners registered or removed during a pass do not change that pass.
//! - Concurrent `transition` calls each store their phase and then run their
//!   own pass. Passes are not serialized, so two racing transitions may notify
//!   in the opposite order of their stores; a listener's last-seen phase can
//!   then differ from `phase()`. Drivers that need ordered delivery must
//!   serialize their calls.
//! - A panicking listener is logged and skipped; the remaining listeners still
//!   run and the panic never reaches the caller. The error record carries the
//!   panic message, the `file:line:column` of the panic and a backtrace taken
//!   at the panic site. This relies on unwinding, so it does not hold for
//!   builds with `panic = "abort"`.

use super::{
    panic_capture,
    listener::{LifecycleListener, ListenerCallback, ListenerId, ListenerRegistry},
    phase::LifecyclePhase,
};
use crate::config::LifecycleConfig;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::watch;
use tracing::{debug, error, info, trace};

/// 驱动方看到的生命周期接口
/// Lifecycle interface seen by drivers
///
/// Connection and membership drivers hold this instead of the full tracker so
/// they cannot touch the listener table.
pub trait LifecycleDriver: Send + Sync {
    /// 转换到新阶段
    /// Transition to a new phase
    fn transition(&self, phase: LifecyclePhase);

    /// 获取当前阶段
    /// Get current phase
    fn phase(&self) -> LifecyclePhase;

    /// 客户端是否仍然存活
    /// Whether the client is still live
    fn is_live(&self) -> bool;
}

/// 生命周期跟踪器
/// Lifecycle tracker
pub struct LifecycleTracker {
    /// 当前阶段；同时作为异步观察者的数据源
    /// Current phase; also the source for async watchers
    phase_tx: watch::Sender<LifecyclePhase>,
    /// 进入 `SHUTTING_DOWN` 后永久为假
    /// Permanently false once `SHUTTING_DOWN` is reached
    live: AtomicBool,
    listeners: ListenerRegistry,
    /// 构建信息前缀，构造后不可变
    /// Build annotation prefix, immutable after construction
    annotation: String,
    client_name: String,
    /// 渲染后的日志附加元数据
    /// Rendered extra log metadata
    extras: String,
}

impl fmt::Debug for LifecycleTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleTracker")
            .field("phase", &self.phase())
            .field("live", &self.is_live())
            .field("listeners", &self.listeners)
            .field("annotation", &self.annotation)
            .field("client_name", &self.client_name)
            .field("extras", &self.extras)
            .finish()
    }
}

impl LifecycleTracker {
    /// 创建跟踪器，注册预配置的监听器，并立即触发 `STARTING`
    /// Creates the tracker, registers the configured listeners, then fires `STARTING`
    pub fn new(config: LifecycleConfig) -> Self {
        let extras = config.render_logger_extras();
        let LifecycleConfig {
            listeners,
            build_info,
            client_name,
            ..
        } = config;

        let (phase_tx, _) = watch::channel(LifecyclePhase::Starting);
        let tracker = Self {
            phase_tx,
            live: AtomicBool::new(true),
            listeners: ListenerRegistry::default(),
            annotation: build_info.map(|info| info.annotation()).unwrap_or_default(),
            client_name,
            extras,
        };

        for listener in listeners {
            tracker.register_shared(listener);
        }
        tracker.transition(LifecyclePhase::Starting);
        tracker
    }

    /// 注册监听器，返回用于注销的ID。监听器只接收之后的事件。
    /// Registers a listener and returns the id used to unregister it.
    /// The listener only receives future events.
    pub fn register<L>(&self, listener: L) -> ListenerId
    where
        L: LifecycleListener + 'static,
    {
        self.register_shared(Arc::new(listener))
    }

    /// Registers an already shared listener handle.
    /// 注册一个已共享的监听器句柄。
    pub fn register_shared(&self, listener: ListenerCallback) -> ListenerId {
        let id = self.listeners.insert(listener);
        debug!(listener_id = %id, extras = %self.extras, "Lifecycle listener registered");
        id
    }

    /// 注销监听器。ID未知或已注销时返回 `false`。
    /// Unregisters a listener. Returns `false` if the id is unknown or already removed.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(id);
        debug!(
            listener_id = %id,
            removed,
            extras = %self.extras,
            "Lifecycle listener unregistration"
        );
        removed
    }

    /// 转换到新阶段并通知所有监听器
    /// Transition to a new phase and notify all listeners
    ///
    /// No transition graph is enforced here; the driver decides which
    /// transitions are legal.
    pub fn transition(&self, new_phase: LifecyclePhase) {
        if new_phase.ends_liveness() {
            self.live.store(false, Ordering::Release);
        }

        self.phase_tx.send_replace(new_phase);

        info!(
            phase = %new_phase,
            extras = %self.extras,
            "{}",
            self.status_line(new_phase)
        );

        let snapshot = self.listeners.snapshot();
        trace!(phase = %new_phase, listeners = snapshot.len(), "Notifying lifecycle listeners");

        for (id, listener) in snapshot {
            if let Err(failure) =
                panic_capture::call_guarded(|| listener.on_lifecycle_change(new_phase))
            {
                error!(
                    listener_id = %id,
                    phase = %new_phase,
                    extras = %self.extras,
                    panic = %failure.message,
                    location = %failure.location(),
                    backtrace = %failure.backtrace(),
                    "Exception in lifecycle listener"
                );
            }
        }
    }

    /// 获取当前阶段
    /// Get current phase
    pub fn phase(&self) -> LifecyclePhase {
        *self.phase_tx.borrow()
    }

    /// 客户端是否仍然存活
    /// Whether the client is still live
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Watches the current phase asynchronously. Receivers see the latest
    /// phase, not necessarily every intermediate one.
    ///
    /// 异步观察当前阶段。接收方看到的是最新阶段，不保证看到每个中间阶段。
    pub fn subscribe(&self) -> watch::Receiver<LifecyclePhase> {
        self.phase_tx.subscribe()
    }

    /// 当前已注册的监听器数量
    /// Number of currently registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// The transition log line, e.g. `"(20240105 - a1b2c3d) HazelcastClient is CONNECTED"`.
    pub(crate) fn status_line(&self, phase: LifecyclePhase) -> String {
        format!("{}{} is {}", self.annotation, self.client_name, phase)
    }
}

impl LifecycleDriver for LifecycleTracker {
    fn transition(&self, phase: LifecyclePhase) {
        LifecycleTracker::transition(self, phase)
    }

    fn phase(&self) -> LifecyclePhase {
        LifecycleTracker::phase(self)
    }

    fn is_live(&self) -> bool {
        LifecycleTracker::is_live(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::BuildInfo;
    use std::sync::Mutex;

    type Recorded = Arc<Mutex<Vec<LifecyclePhase>>>;

    fn recorder() -> (Recorded, impl Fn(LifecyclePhase) + Send + Sync + 'static) {
        let events: Recorded = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        (events, move |phase: LifecyclePhase| sink.lock().unwrap().push(phase))
    }

    fn take(events: &Recorded) -> Vec<LifecyclePhase> {
        std::mem::take(&mut *events.lock().unwrap())
    }

    #[test]
    fn test_construction_fires_starting() {
        let tracker = LifecycleTracker::new(LifecycleConfig::default());
        assert_eq!(tracker.phase(), LifecyclePhase::Starting);
        assert!(tracker.is_live());
        assert_eq!(tracker.listener_count(), 0);
    }

    #[test]
    fn test_seeded_listeners_receive_starting() {
        let (events, listener) = recorder();
        let config = LifecycleConfig::default().with_listener(listener);
        let tracker = LifecycleTracker::new(config);

        assert_eq!(take(&events), vec![LifecyclePhase::Starting]);
        assert_eq!(tracker.listener_count(), 1);
    }

    #[test]
    fn test_full_scenario() {
        let tracker = LifecycleTracker::new(LifecycleConfig::default());

        let (l1_events, l1) = recorder();
        let l1_id = tracker.register(l1);
        tracker.transition(LifecyclePhase::Connected);
        assert_eq!(take(&l1_events), vec![LifecyclePhase::Connected]);

        let (l2_events, l2) = recorder();
        tracker.register(l2);
        tracker.transition(LifecyclePhase::Disconnected);
        assert_eq!(take(&l1_events), vec![LifecyclePhase::Disconnected]);
        assert_eq!(take(&l2_events), vec![LifecyclePhase::Disconnected]);

        assert!(tracker.unregister(l1_id));
        tracker.transition(LifecyclePhase::ShuttingDown);
        assert!(take(&l1_events).is_empty());
        assert_eq!(take(&l2_events), vec![LifecyclePhase::ShuttingDown]);
        assert!(!tracker.is_live());

        tracker.transition(LifecyclePhase::Shutdown);
        assert!(take(&l1_events).is_empty());
        assert_eq!(take(&l2_events), vec![LifecyclePhase::Shutdown]);
        assert!(!tracker.is_live());
        assert_eq!(tracker.phase(), LifecyclePhase::Shutdown);
    }

    #[test]
    fn test_no_replay_for_late_listener() {
        let tracker = LifecycleTracker::new(LifecycleConfig::default());
        tracker.transition(LifecyclePhase::Connected);

        let (events, listener) = recorder();
        tracker.register(listener);
        assert!(take(&events).is_empty());
    }

    #[test]
    fn test_unregister_unknown_and_twice() {
        let tracker = LifecycleTracker::new(LifecycleConfig::default());
        let other = LifecycleTracker::new(LifecycleConfig::default());
        let foreign = other.register(|_phase: LifecyclePhase| {});

        let id = tracker.register(|_phase: LifecyclePhase| {});
        assert!(!tracker.unregister(foreign));
        assert!(tracker.unregister(id));
        assert!(!tracker.unregister(id));
    }

    #[test]
    fn test_liveness_never_returns() {
        let tracker = LifecycleTracker::new(LifecycleConfig::default());
        tracker.transition(LifecyclePhase::ShuttingDown);
        assert!(!tracker.is_live());

        // The graph is permissive, but liveness stays gone.
        tracker.transition(LifecyclePhase::Starting);
        tracker.transition(LifecyclePhase::Connected);
        assert_eq!(tracker.phase(), LifecyclePhase::Connected);
        assert!(!tracker.is_live());
    }

    #[test]
    fn test_direct_shutdown_ends_liveness() {
        let tracker = LifecycleTracker::new(LifecycleConfig::default());
        tracker.transition(LifecyclePhase::Shutdown);
        assert!(!tracker.is_live());
    }

    fn failing_listener(phase: LifecyclePhase) {
        panic!("listener failed on {phase}");
    }

    fn opaque_panic_listener(_phase: LifecyclePhase) {
        std::panic::panic_any(42_u32);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let tracker = LifecycleTracker::new(LifecycleConfig::default());
        let (before_events, before) = recorder();
        let (after_events, after) = recorder();

        tracker.register(before);
        tracker.register(failing_listener);
        tracker.register(opaque_panic_listener);
        tracker.register(after);

        tracker.transition(LifecyclePhase::Connected);
        tracker.transition(LifecyclePhase::Disconnected);

        let expected = vec![LifecyclePhase::Connected, LifecyclePhase::Disconnected];
        assert_eq!(take(&before_events), expected);
        assert_eq!(take(&after_events), expected);
        assert_eq!(tracker.phase(), LifecyclePhase::Disconnected);
    }

    #[test]
    fn test_listener_registered_during_pass_misses_it() {
        let tracker = Arc::new(LifecycleTracker::new(LifecycleConfig::default()));
        let late_events: Recorded = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&tracker);
        let flag = AtomicBool::new(false);
        let late_events_sink = late_events.clone();
        tracker.register(move |_phase: LifecyclePhase| {
            if let Some(tracker) = weak.upgrade() {
                if !flag.swap(true, Ordering::SeqCst) {
                    let sink = late_events_sink.clone();
                    tracker.register(move |phase: LifecyclePhase| sink.lock().unwrap().push(phase));
                }
            }
        });

        tracker.transition(LifecyclePhase::Connected);
        assert!(take(&late_events).is_empty());

        tracker.transition(LifecyclePhase::Disconnected);
        assert_eq!(take(&late_events), vec![LifecyclePhase::Disconnected]);
    }

    #[test]
    fn test_listener_removed_during_pass_still_completes_it() {
        let tracker = Arc::new(LifecycleTracker::new(LifecycleConfig::default()));
        let victim_id = Arc::new(Mutex::new(None::<ListenerId>));

        let weak = Arc::downgrade(&tracker);
        let target = victim_id.clone();
        tracker.register(move |_phase: LifecyclePhase| {
            if let (Some(tracker), Some(id)) = (weak.upgrade(), *target.lock().unwrap()) {
                tracker.unregister(id);
            }
        });

        let (victim_events, victim) = recorder();
        *victim_id.lock().unwrap() = Some(tracker.register(victim));

        tracker.transition(LifecyclePhase::Connected);
        assert_eq!(take(&victim_events), vec![LifecyclePhase::Connected]);
        assert_eq!(tracker.listener_count(), 1);

        tracker.transition(LifecyclePhase::Disconnected);
        assert!(take(&victim_events).is_empty());
    }

    #[test]
    fn test_reentrant_transition_from_listener() {
        let tracker = Arc::new(LifecycleTracker::new(LifecycleConfig::default()));
        let (events, listener) = recorder();

        let weak = Arc::downgrade(&tracker);
        tracker.register(move |phase: LifecyclePhase| {
            if phase == LifecyclePhase::ShuttingDown {
                if let Some(tracker) = weak.upgrade() {
                    tracker.transition(LifecyclePhase::Shutdown);
                }
            }
        });
        tracker.register(listener);

        tracker.transition(LifecyclePhase::ShuttingDown);
        // The nested pass completes before the outer one reaches the recorder.
        assert_eq!(
            take(&events),
            vec![LifecyclePhase::Shutdown, LifecyclePhase::ShuttingDown]
        );
        assert_eq!(tracker.phase(), LifecyclePhase::Shutdown);
    }

    #[test]
    fn test_status_line() {
        let plain = LifecycleTracker::new(LifecycleConfig::default().with_build_info(None));
        assert_eq!(
            plain.status_line(LifecyclePhase::Connected),
            "HazelcastClient is CONNECTED"
        );

        let annotated = LifecycleTracker::new(
            LifecycleConfig::default()
                .with_build_info(Some(BuildInfo::new("20240105", "a1b2c3d").unwrap()))
                .with_client_name("EdgeClient"),
        );
        assert_eq!(
            annotated.status_line(LifecyclePhase::ShuttingDown),
            "(20240105 - a1b2c3d) EdgeClient is SHUTTING_DOWN"
        );
    }

    #[test]
    fn test_driver_trait_object() {
        let tracker = Arc::new(LifecycleTracker::new(LifecycleConfig::default()));
        let driver: Arc<dyn LifecycleDriver> = tracker.clone();

        driver.transition(LifecyclePhase::Connected);
        assert_eq!(driver.phase(), LifecyclePhase::Connected);
        assert_eq!(tracker.phase(), LifecyclePhase::Connected);
        assert!(driver.is_live());
    }
}

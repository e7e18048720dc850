//! 生命周期监听器及其注册表
//! Lifecycle listeners and their registry
//!
//! 注册表只在互斥锁内做插入、删除和快照；监听器本身总是在锁外被调用，
//! 因此监听器可以在回调中安全地注册、注销或触发新的状态转换。
//!
//! The registry only inserts, removes and snapshots while holding its mutex;
//! listeners are always invoked outside the lock, so a listener may register,
//! unregister or trigger a new transition from inside its callback.

use super::phase::LifecyclePhase;
use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

/// 生命周期变化的观察者
/// Observer of lifecycle changes
///
/// Implementations run synchronously on the thread that called
/// `LifecycleTracker::transition`, so they must be fast and must not block.
/// Any closure `Fn(LifecyclePhase) + Send + Sync` is a listener.
pub trait LifecycleListener: Send + Sync {
    /// Called once per transition with the new phase.
    /// 每次状态转换时以新阶段调用一次。
    fn on_lifecycle_change(&self, phase: LifecyclePhase);
}

impl<F> LifecycleListener for F
where
    F: Fn(LifecyclePhase) + Send + Sync,
{
    fn on_lifecycle_change(&self, phase: LifecyclePhase) {
        self(phase)
    }
}

/// 共享的监听器句柄
/// Shared listener handle
pub type ListenerCallback = Arc<dyn LifecycleListener>;

// Process-wide so that ids never repeat across trackers.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// 监听器注册ID，进程生命周期内唯一
/// Listener registration id, unique for the lifetime of the process
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{:016x}", self.0)
    }
}

/// Point-in-time copy of the registered listeners, in registration order.
/// 已注册监听器的时间点副本，按注册顺序排列。
pub(crate) type ListenerSnapshot = Vec<(ListenerId, ListenerCallback)>;

/// 线程安全的监听器表
/// Thread-safe listener table
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: Mutex<BTreeMap<ListenerId, ListenerCallback>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners_count", &self.len())
            .finish()
    }
}

impl ListenerRegistry {
    // Listeners never run under this lock, so poisoning can only come from a
    // panic inside BTreeMap itself; the map is still structurally valid then.
    fn table(&self) -> MutexGuard<'_, BTreeMap<ListenerId, ListenerCallback>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert(&self, listener: ListenerCallback) -> ListenerId {
        let id = ListenerId::next();
        self.table().insert(id, listener);
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        self.table().remove(&id).is_some()
    }

    pub(crate) fn snapshot(&self) -> ListenerSnapshot {
        self.table()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.table().len()
    }
}

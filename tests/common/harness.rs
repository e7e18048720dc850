//! tests/common/harness.rs
use cluster_lifecycle::LifecyclePhase;
use std::sync::{Arc, Mutex, Once};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "cluster_lifecycle=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Records every phase a listener is notified with.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<LifecyclePhase>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener closure feeding this recorder.
    pub fn listener(&self) -> impl Fn(LifecyclePhase) + Send + Sync + 'static {
        let events = self.events.clone();
        move |phase: LifecyclePhase| events.lock().unwrap().push(phase)
    }

    /// Drains everything recorded so far.
    pub fn take(&self) -> Vec<LifecyclePhase> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

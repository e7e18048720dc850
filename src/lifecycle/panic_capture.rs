//! 监听器panic现场捕获
//! Capture of the panic site of a failing listener
//!
//! `catch_unwind` 返回时栈已经展开，此时获取的回溯只指向捕获方。这里安装一个
//! 进程级panic钩子：当当前线程正在执行受保护的监听器调用时，钩子把panic位置和
//! 回溯存入线程局部槽位，由调用方在 `catch_unwind` 之后取出。其他panic原样交给
//! 之前的钩子处理。
//!
//! By the time `catch_unwind` returns the stack is gone, so a backtrace taken
//! there only shows the catcher. A process-wide panic hook is installed that,
//! while the current thread is inside a guarded listener call, stores the
//! panic location and a backtrace in a thread-local slot for the caller to
//! drain after `catch_unwind`. Every other panic is forwarded to the hook that
//! was installed before.

use std::{
    any::Any,
    backtrace::Backtrace,
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe, PanicHookInfo},
    sync::Once,
};

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    static CAPTURED: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

/// panic发生处的位置和回溯
/// Location and backtrace of the panic site
#[derive(Debug)]
pub(crate) struct PanicSite {
    /// `file:line:column`
    pub(crate) location: String,
    pub(crate) backtrace: Backtrace,
}

/// 一次失败的监听器调用
/// A failed listener call
#[derive(Debug)]
pub(crate) struct ListenerFailure {
    pub(crate) message: String,
    /// Missing when another panic hook replaced ours after installation.
    pub(crate) site: Option<PanicSite>,
}

impl ListenerFailure {
    pub(crate) fn location(&self) -> &str {
        self.site
            .as_ref()
            .map_or("<unknown>", |site| site.location.as_str())
    }

    pub(crate) fn backtrace(&self) -> String {
        self.site
            .as_ref()
            .map_or_else(|| "<unavailable>".to_string(), |site| site.backtrace.to_string())
    }
}

fn install_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            let guarded = GUARD_DEPTH.try_with(Cell::get).unwrap_or(0) > 0;
            if !guarded {
                previous(info);
                return;
            }
            let site = PanicSite {
                location: info
                    .location()
                    .map_or_else(|| "<unknown>".to_string(), ToString::to_string),
                backtrace: Backtrace::force_capture(),
            };
            let _ = CAPTURED.try_with(|slot| *slot.borrow_mut() = Some(site));
        }));
    });
}

/// 在保护下调用监听器，panic时返回其消息与现场
/// Calls a listener under guard, returning its message and site on panic
pub(crate) fn call_guarded<F: FnOnce()>(f: F) -> Result<(), ListenerFailure> {
    install_hook();

    GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));

    // Drained on success too, so a panic the listener caught itself does not
    // leak into a later failure report.
    let site = CAPTURED.with(|slot| slot.borrow_mut().take());
    outcome.map_err(|payload| ListenerFailure {
        message: panic_message(payload.as_ref()).to_string(),
        site,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

//! Concrete `EventLoop` adapters (§6): the host-resolution core never
//! constructs one of these directly, it only ever receives
//! `Arc<dyn EventLoop>` from the embedding application.

use netresolve_core::{EventLoop, EventLoopId, ModeName};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// An event loop backed by the ambient Tokio runtime. `run` drives one
/// iteration in a given mode, blocking until something calls `wake` (a
/// self-signalling stub firing, or an external caller nudging the
/// loop) — the same role a `CFRunLoop` run-in-mode call plays.
pub struct TokioEventLoop {
    id: EventLoopId,
    notify: Notify,
    waiting: AtomicBool,
    mode: Mutex<Option<ModeName>>,
}

impl Default for TokioEventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioEventLoop {
    pub fn new() -> Self {
        Self {
            id: EventLoopId::next(),
            notify: Notify::new(),
            waiting: AtomicBool::new(false),
            mode: Mutex::new(None),
        }
    }

    /// Runs one iteration in `mode`: blocks until woken.
    pub async fn run(&self, mode: ModeName) {
        *self.mode.lock().unwrap() = Some(mode);
        self.waiting.store(true, Ordering::SeqCst);
        self.notify.notified().await;
        self.waiting.store(false, Ordering::SeqCst);
        *self.mode.lock().unwrap() = None;
    }
}

impl std::fmt::Debug for TokioEventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioEventLoop").field("id", &self.id).finish()
    }
}

impl EventLoop for TokioEventLoop {
    fn id(&self) -> EventLoopId {
        self.id
    }

    fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::SeqCst)
    }

    fn current_mode(&self) -> Option<ModeName> {
        self.mode.lock().unwrap().clone()
    }

    fn wake(&self) {
        self.notify.notify_waiters();
    }
}

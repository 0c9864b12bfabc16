//! The scheduling contract with the hosting event loop (§6).
//!
//! `EventLoop` is deliberately abstract, the same way the spec describes
//! it: the core never assumes a particular loop implementation, only that
//! it can be scheduled onto, woken, and asked whether it is currently
//! blocked waiting. `netresolve-runtime` ships the production adapters
//! (`TokioEventLoop`, `BlockingLoop`).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// An opaque, process-unique identity for an `EventLoop`, used for the
/// identity-based equality the spec requires ("Equality and hashing are
/// defined by identity of loop and byte-equality of mode name" — §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventLoopId(u64);

static NEXT_LOOP_ID: AtomicU64 = AtomicU64::new(1);

impl EventLoopId {
    pub fn next() -> Self {
        Self(NEXT_LOOP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A mode name. Cloned and compared by byte-equality, same as a
/// `CFRunLoopMode` string (§3).
pub type ModeName = Arc<str>;

/// The abstract hosting event loop. A concrete adapter owns whatever
/// reactor/executor actually drives I/O; the core only ever calls these
/// methods.
pub trait EventLoop: Send + Sync + fmt::Debug {
    fn id(&self) -> EventLoopId;

    /// Whether this loop is currently blocked waiting for sources to fire
    /// (used to decide whether a wake is needed at all).
    fn is_waiting(&self) -> bool;

    /// The mode the loop is currently running in, if any.
    fn current_mode(&self) -> Option<ModeName>;

    /// Wake the loop if it is blocked waiting, so it re-evaluates its
    /// scheduled sources (used by the cancel stub to unblock synchronous
    /// waiters on other threads — §4.5).
    fn wake(&self);
}

impl PartialEq for dyn EventLoop {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
impl Eq for dyn EventLoop {}

/// The set of (loop, mode) pairs a single lookup token is currently
/// scheduled on. Shared by every `LookupToken` variant in `token.rs` so
/// scheduling bookkeeping is written once (§3, Scheduling Pair).
type ScheduleEntry = (EventLoopId, Arc<dyn EventLoop>, ModeName);

#[derive(Debug, Default)]
pub struct ScheduleSet {
    entries: Mutex<Vec<ScheduleEntry>>,
}

impl ScheduleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a (loop, mode) pair. Returns `true` if it was newly added —
    /// duplicate adds are idempotent (P7).
    pub fn schedule(&self, event_loop: Arc<dyn EventLoop>, mode: ModeName) -> bool {
        let id = event_loop.id();
        let mut entries = self.entries.lock().unwrap();
        if entries
            .iter()
            .any(|(existing_id, _, existing_mode)| *existing_id == id && *existing_mode == mode)
        {
            return false;
        }
        entries.push((id, event_loop, mode));
        true
    }

    /// Removes a (loop, mode) pair. Returns `true` if it was present.
    pub fn unschedule(&self, event_loop: &Arc<dyn EventLoop>, mode: &ModeName) -> bool {
        let id = event_loop.id();
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|(existing_id, _, existing_mode)| {
            !(*existing_id == id && existing_mode == mode)
        });
        entries.len() != before
    }

    pub fn contains(&self, event_loop: &Arc<dyn EventLoop>, mode: &ModeName) -> bool {
        let id = event_loop.id();
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(existing_id, _, existing_mode)| *existing_id == id && existing_mode == mode)
    }

    pub fn pairs(&self) -> Vec<(Arc<dyn EventLoop>, ModeName)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, lp, mode)| (lp.clone(), mode.clone()))
            .collect()
    }

    /// Wakes every loop currently holding this pair — used when a
    /// self-signalling stub fires, so synchronous waiters on other
    /// threads unblock (§4.5).
    pub fn wake_all(&self) {
        for (_, lp, _) in self.entries.lock().unwrap().iter() {
            lp.wake();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NoopLoop(EventLoopId);
    impl EventLoop for NoopLoop {
        fn id(&self) -> EventLoopId {
            self.0
        }
        fn is_waiting(&self) -> bool {
            false
        }
        fn current_mode(&self) -> Option<ModeName> {
            None
        }
        fn wake(&self) {}
    }

    #[test]
    fn schedule_is_idempotent() {
        let set = ScheduleSet::new();
        let lp: Arc<dyn EventLoop> = Arc::new(NoopLoop(EventLoopId::next()));
        let mode: ModeName = Arc::from("default");
        assert!(set.schedule(lp.clone(), mode.clone()));
        assert!(!set.schedule(lp.clone(), mode.clone()));
        assert_eq!(set.pairs().len(), 1);
    }

    #[test]
    fn unschedule_removes_exactly_the_matching_pair() {
        let set = ScheduleSet::new();
        let lp: Arc<dyn EventLoop> = Arc::new(NoopLoop(EventLoopId::next()));
        let mode_a: ModeName = Arc::from("a");
        let mode_b: ModeName = Arc::from("b");
        set.schedule(lp.clone(), mode_a.clone());
        set.schedule(lp.clone(), mode_b.clone());
        assert!(set.unschedule(&lp, &mode_a));
        assert!(!set.contains(&lp, &mode_a));
        assert!(set.contains(&lp, &mode_b));
    }
}

//! `LookupToken`: the tagged variant standing in for the polymorphic
//! lookup object of the original core (a port, a file descriptor, a
//! self-signalling source, a reachability probe — see DESIGN.md's
//! grounding ledger).

use crate::sched::{EventLoop, ModeName, ScheduleSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::AbortHandle;

/// Membership in a master-registry lookup group, carried by `Primary` and
/// `Subscriber` tokens so `CancelInfoResolution` can withdraw (§4.3).
pub struct GroupMembership {
    pub name: Arc<str>,
    pub liveness: Arc<AtomicUsize>,
}

/// An asynchronous lookup driven by a spawned task.
pub struct TaskToken {
    schedules: ScheduleSet,
    abort: AbortHandle,
    pub group: Option<GroupMembership>,
}

impl TaskToken {
    pub fn new(abort: AbortHandle) -> Self {
        Self {
            schedules: ScheduleSet::new(),
            abort,
            group: None,
        }
    }

    pub fn with_group(abort: AbortHandle, group: GroupMembership) -> Self {
        Self {
            schedules: ScheduleSet::new(),
            abort,
            group: Some(group),
        }
    }
}

/// A one-shot source whose firing is triggered by an explicit signal
/// rather than an external I/O event — used for cache hits (synthesise
/// the result immediately) and for the cancel stub (§4.5).
pub struct SelfSignalToken {
    schedules: ScheduleSet,
    fired: AtomicBool,
}

impl SelfSignalToken {
    pub fn new() -> Self {
        Self {
            schedules: ScheduleSet::new(),
            fired: AtomicBool::new(false),
        }
    }

    pub fn signal(&self) {
        self.fired.store(true, Ordering::SeqCst);
        self.schedules.wake_all();
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

pub enum LookupToken {
    /// Forward master-address lookup performed directly by this handle —
    /// either as the registry's leader, or bypassing the registry
    /// entirely for a "master"-family kind.
    Primary(TaskToken),
    /// Joined to another handle's in-flight master-address lookup.
    Subscriber(TaskToken),
    /// Reverse DNS (`kNames`).
    NameLookup(TaskToken),
    Reachability(TaskToken),
    GenericDns(TaskToken),
    /// Cache hit synthesis, or the cancel stub.
    SelfSignal(SelfSignalToken),
}

impl LookupToken {
    fn schedules(&self) -> &ScheduleSet {
        match self {
            LookupToken::Primary(t)
            | LookupToken::Subscriber(t)
            | LookupToken::NameLookup(t)
            | LookupToken::Reachability(t)
            | LookupToken::GenericDns(t) => &t.schedules,
            LookupToken::SelfSignal(s) => &s.schedules,
        }
    }

    pub fn schedule(&self, event_loop: Arc<dyn EventLoop>, mode: ModeName) -> bool {
        self.schedules().schedule(event_loop, mode)
    }

    pub fn unschedule(&self, event_loop: &Arc<dyn EventLoop>, mode: &ModeName) -> bool {
        self.schedules().unschedule(event_loop, mode)
    }

    pub fn scheduled_pairs(&self) -> Vec<(Arc<dyn EventLoop>, ModeName)> {
        self.schedules().pairs()
    }

    pub fn contains(&self, event_loop: &Arc<dyn EventLoop>, mode: &ModeName) -> bool {
        self.schedules().contains(event_loop, mode)
    }

    /// Detach the underlying work — aborts a spawned task, or is a no-op
    /// for a self-signalling stub (§4.5 step b/c).
    pub fn invalidate(&self) {
        match self {
            LookupToken::Primary(t)
            | LookupToken::Subscriber(t)
            | LookupToken::NameLookup(t)
            | LookupToken::Reachability(t)
            | LookupToken::GenericDns(t) => t.abort.abort(),
            LookupToken::SelfSignal(_) => {}
        }
    }

    pub fn group_membership(&self) -> Option<&GroupMembership> {
        match self {
            LookupToken::Primary(t) | LookupToken::Subscriber(t) => t.group.as_ref(),
            _ => None,
        }
    }
}

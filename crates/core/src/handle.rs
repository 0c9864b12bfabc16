//! Host Handle (§4.1): the per-request object a consumer creates,
//! schedules, and starts resolution on. This module owns the handle's
//! state and its public surface; `driver.rs` owns the resolution-path
//! selection logic that decides which `LookupToken` variant a given
//! `QueryKind` produces.

use crate::driver;
use crate::registry::MasterRegistry;
use crate::sched::{EventLoop, ModeName};
use crate::token::LookupToken;
use netresolve_domain::{HostError, HostInfoValue, QueryKind};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Condvar, Mutex};
use tracing::debug;

use super::resolver::HostResolver;

/// Invoked when a lookup completes, whether synchronously scheduled or
/// asynchronously fired. Mirrors the client callback + client context
/// pair in the original design; since the closure owns (by `Arc`
/// capture) whatever context it needs, Rust's closures absorb the
/// retain/release dance the C API needed explicit calls for.
pub type ClientCallback = Arc<dyn Fn(&HostHandle, QueryKind, Option<&HostError>) + Send + Sync>;

pub(crate) struct HostHandleInner {
    pub(crate) info: HashMap<QueryKind, Option<HostInfoValue>>,
    pub(crate) lookup: Option<LookupToken>,
    pub(crate) active_kind: Option<QueryKind>,
    pub(crate) schedules: Vec<(Arc<dyn EventLoop>, ModeName)>,
    pub(crate) callback: Option<ClientCallback>,
    pub(crate) error: Option<HostError>,
}

/// Bumped every time a handle's `lookup` transitions from `Some` to
/// `None`, so `start_info_resolution`'s synchronous path can block the
/// calling OS thread without needing its own event loop (§4.1,
/// "blocks... until the lookup completes").
#[derive(Default)]
pub(crate) struct CompletionGate {
    generation: Mutex<u64>,
    condvar: Condvar,
}

impl CompletionGate {
    fn bump(&self) {
        let mut g = self.generation.lock().unwrap();
        *g = g.wrapping_add(1);
        self.condvar.notify_all();
    }

    fn snapshot(&self) -> u64 {
        *self.generation.lock().unwrap()
    }

    fn wait_for_change(&self, last_seen: u64) -> u64 {
        let mut g = self.generation.lock().unwrap();
        while *g == last_seen {
            g = self.condvar.wait(g).unwrap();
        }
        *g
    }
}

pub(crate) struct HostHandleData {
    pub(crate) inner: Mutex<HostHandleInner>,
    pub(crate) resolver: Arc<dyn HostResolver>,
    pub(crate) gate: CompletionGate,
}

/// The Host Handle (§4.1). Cheaply `Clone`: every clone shares the same
/// underlying state, the way a retained CFHost reference would.
#[derive(Clone)]
pub struct HostHandle(pub(crate) Arc<HostHandleData>);

/// What `start_info_resolution` actually did (§4.1, §7). A plain `bool`
/// would conflate "re-entry while already running" with "completed
/// without error," which the spec treats differently (the former never
/// touches `error`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The lookup was (synchronously, for the blocking path) started.
    Started,
    /// `kind` already has a lookup in flight (I2); no-op.
    AlreadyActive,
}

impl HostHandle {
    fn new_with_info(
        info: HashMap<QueryKind, Option<HostInfoValue>>,
        resolver: Arc<dyn HostResolver>,
    ) -> Self {
        HostHandle(Arc::new(HostHandleData {
            inner: Mutex::new(HostHandleInner {
                info,
                lookup: None,
                active_kind: None,
                schedules: Vec::new(),
                callback: None,
                error: None,
            }),
            resolver,
            gate: CompletionGate::default(),
        }))
    }

    /// `HostCreateWithName` (§4.1): seeds `info[Names]` with the given
    /// name so a later `Addresses` resolution knows what to look up.
    pub fn create_with_name(
        name: impl Into<String>,
        resolver: Arc<dyn HostResolver>,
    ) -> Result<Self, HostError> {
        let name = name.into();
        validate_name(&name)?;
        let mut info = HashMap::new();
        info.insert(QueryKind::Names, Some(HostInfoValue::Names(vec![name])));
        Ok(Self::new_with_info(info, resolver))
    }

    /// `HostCreateWithAddress` (§4.1): seeds `info[Addresses]` with the
    /// given address so a later `Names` (reverse) resolution knows what
    /// to look up.
    pub fn create_with_address(
        address: IpAddr,
        resolver: Arc<dyn HostResolver>,
    ) -> Result<Self, HostError> {
        let mut info = HashMap::new();
        info.insert(
            QueryKind::Addresses,
            Some(HostInfoValue::Addresses(vec![address])),
        );
        Ok(Self::new_with_info(info, resolver))
    }

    /// `HostCreateCopy` (§4.1): snapshots only the resolved `info` map.
    /// Schedules, callback, lookup, and error are deliberately not
    /// carried over.
    pub fn create_copy(&self) -> Self {
        let info = self.0.inner.lock().unwrap().info.clone();
        Self::new_with_info(info, self.0.resolver.clone())
    }

    /// A read-only snapshot of one query kind's resolved info, if any
    /// lookup of that kind has ever completed for this handle.
    pub fn get_info(&self, kind: QueryKind) -> Option<Option<HostInfoValue>> {
        self.0.inner.lock().unwrap().info.get(&kind).cloned()
    }

    pub fn error(&self) -> Option<HostError> {
        self.0.inner.lock().unwrap().error.clone()
    }

    /// `HostSetClient` (§4.1). Installing `None` cancels any active
    /// lookup (matching "no callback" meaning synchronous-only usage).
    /// Installing a callback while a lookup is already active without
    /// one schedules it onto the handle's existing (loop, mode) pairs,
    /// so async notification starts working retroactively.
    pub fn set_client(&self, callback: Option<ClientCallback>) -> bool {
        let mut inner = self.0.inner.lock().unwrap();
        if callback.is_none() {
            let had_active = inner.active_kind.is_some();
            if let Some(active) = inner.active_kind {
                teardown_lookup(&mut inner, active, None);
            }
            inner.callback = None;
            drop(inner);
            if had_active {
                self.0.gate.bump();
            }
            return true;
        }
        let had_callback = inner.callback.is_some();
        if !had_callback {
            if let Some(lookup) = &inner.lookup {
                for (event_loop, mode) in inner.schedules.clone() {
                    lookup.schedule(event_loop, mode);
                }
            }
        }
        inner.callback = callback;
        true
    }

    /// `HostScheduleWithRunLoop` (§4.1, P7 — idempotent).
    pub fn schedule_with_run_loop(&self, event_loop: Arc<dyn EventLoop>, mode: ModeName) {
        let mut inner = self.0.inner.lock().unwrap();
        let already = inner
            .schedules
            .iter()
            .any(|(lp, m)| **lp == *event_loop && *m == mode);
        if already {
            return;
        }
        inner.schedules.push((event_loop.clone(), mode.clone()));
        if let Some(lookup) = &inner.lookup {
            lookup.schedule(event_loop, mode);
        }
    }

    /// `HostUnscheduleFromRunLoop` (§4.1, P7).
    pub fn unschedule_from_run_loop(&self, event_loop: &Arc<dyn EventLoop>, mode: &ModeName) {
        let mut inner = self.0.inner.lock().unwrap();
        let before = inner.schedules.len();
        inner
            .schedules
            .retain(|(lp, m)| !(**lp == **event_loop && m == mode));
        if inner.schedules.len() != before {
            if let Some(lookup) = &inner.lookup {
                lookup.unschedule(event_loop, mode);
            }
        }
    }

    /// `HostStartInfoResolution` (§4.1). Blocks the calling thread when
    /// no client callback is installed; otherwise returns as soon as the
    /// lookup has been started.
    pub fn start_info_resolution(&self, kind: QueryKind) -> Result<StartOutcome, HostError> {
        {
            let inner = self.0.inner.lock().unwrap();
            if inner.active_kind.is_some() {
                return Ok(StartOutcome::AlreadyActive);
            }
        }
        let has_callback = self.0.inner.lock().unwrap().callback.is_some();
        driver::begin_resolution(self, kind)?;
        if has_callback {
            return Ok(StartOutcome::Started);
        }
        let blocking_loop = driver::blocking_loop();
        let mode: ModeName = Arc::from(netresolve_domain::BLOCKING_MODE);
        self.schedule_with_run_loop(blocking_loop.clone(), mode.clone());
        let mut seen = self.0.gate.snapshot();
        loop {
            if self.0.inner.lock().unwrap().active_kind.is_none() {
                break;
            }
            seen = self.0.gate.wait_for_change(seen);
        }
        self.unschedule_from_run_loop(&blocking_loop, &mode);
        match self.0.inner.lock().unwrap().error.clone() {
            Some(e) => Err(e),
            None => Ok(StartOutcome::Started),
        }
    }

    /// `HostCancelInfoResolution` (§4.5): tears down the active lookup
    /// and reports a NULL-sentinel completion to the callback exactly
    /// once (P5) — cancellation is neither success nor a recorded
    /// failure, so `info[kind]` becomes `Some(None)` and `error` stays
    /// `None`, mirroring a family-restricted empty result (P9).
    pub fn cancel_info_resolution(&self, kind: QueryKind) {
        let mut inner = self.0.inner.lock().unwrap();
        if inner.active_kind != Some(kind) {
            return;
        }
        inner.info.insert(kind, None);
        teardown_lookup(&mut inner, kind, None);
        let callback = inner.callback.clone();
        let error = inner.error.clone();
        drop(inner);
        self.0.gate.bump();
        if let Some(cb) = callback {
            cb(self, kind, error.as_ref());
        }
    }

    /// Invoked by a spawned lookup task (or synchronously, for a cache
    /// hit) once a result is in hand. Tears the lookup down, installs
    /// the outcome into `info`, and notifies both the callback and any
    /// blocked synchronous waiter.
    pub(crate) fn complete(&self, kind: QueryKind, result: Result<HostInfoValue, HostError>) {
        let mut inner = self.0.inner.lock().unwrap();
        if inner.active_kind != Some(kind) {
            return;
        }
        let error = result.as_ref().err().cloned();
        // Unconditional: `info[kind]` always gets an entry once a lookup
        // completes, success or failure (§4.2 step 6, P8) — `None` on
        // error is the NULL-sentinel, not an absent key.
        inner.info.insert(kind, result.ok());
        teardown_lookup(&mut inner, kind, error);
        let callback = inner.callback.clone();
        let error = inner.error.clone();
        drop(inner);
        self.0.gate.bump();
        if let Some(cb) = callback {
            cb(self, kind, error.as_ref());
        }
    }
}

fn teardown_lookup(inner: &mut HostHandleInner, kind: QueryKind, error: Option<HostError>) {
    if let Some(lookup) = inner.lookup.take() {
        for (event_loop, mode) in inner.schedules.clone() {
            lookup.unschedule(&event_loop, &mode);
        }
        if let Some(group) = lookup.group_membership() {
            let is_leader = matches!(lookup, LookupToken::Primary(_));
            debug!(name = %group.name, ?kind, is_leader, "withdrawing from master registry group");
            MasterRegistry::global().withdraw(&group.name, &group.liveness, is_leader);
        }
        lookup.invalidate();
    }
    inner.active_kind = None;
    inner.error = error;
}

fn validate_name(name: &str) -> Result<(), HostError> {
    if name.contains('\0') {
        return Err(HostError::HostNotFound);
    }
    Ok(())
}

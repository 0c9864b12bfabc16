//! Lookup Driver (§4.1 "resolution selection" / §4.3 / §4.5): chooses,
//! for a given `QueryKind` on a given handle, whether to consult the
//! cache, join or lead a master-registry group, or spawn a dedicated
//! task — and constructs the resulting `LookupToken`.

use crate::alloc::try_clone_vec;
use crate::handle::HostHandle;
use crate::registry::{Admission, GroupOutcome, MasterRegistry};
use crate::resolver::AddressFamily;
use crate::sched::{EventLoop, EventLoopId, ModeName};
use crate::token::{GroupMembership, LookupToken, SelfSignalToken, TaskToken};
use netresolve_domain::{HostError, HostInfoValue, QueryKind};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A trivial `EventLoop` used only so the synchronous path in
/// `HostHandle::start_info_resolution` has a concrete loop object to
/// register its (loop, mode) pair against. Waking happens through the
/// handle's own completion gate, not through this loop — `wake` is a
/// no-op.
struct BlockingMarker {
    id: EventLoopId,
}

impl EventLoop for BlockingMarker {
    fn id(&self) -> EventLoopId {
        self.id
    }
    fn is_waiting(&self) -> bool {
        true
    }
    fn current_mode(&self) -> Option<ModeName> {
        None
    }
    fn wake(&self) {}
}

static BLOCKING_LOOP: OnceLock<Arc<dyn EventLoop>> = OnceLock::new();

pub(crate) fn blocking_loop() -> Arc<dyn EventLoop> {
    BLOCKING_LOOP
        .get_or_init(|| {
            Arc::new(BlockingMarker {
                id: EventLoopId::next(),
            }) as Arc<dyn EventLoop>
        })
        .clone()
}

fn seeded_name(handle: &HostHandle) -> Option<String> {
    handle
        .get_info(QueryKind::Names)
        .flatten()
        .and_then(|v| v.as_names().and_then(|names| names.first().cloned()))
}

fn seeded_address(handle: &HostHandle) -> Option<std::net::IpAddr> {
    handle
        .get_info(QueryKind::Addresses)
        .flatten()
        .and_then(|v| v.as_addresses().and_then(|addrs| addrs.first().copied()))
}

/// Sets the active lookup for `kind` on `handle`, dispatching to the
/// appropriate resolution path. Leaves `handle`'s lock released on
/// return; immediate (cache-hit) completions are delivered before this
/// function returns.
pub(crate) fn begin_resolution(handle: &HostHandle, kind: QueryKind) -> Result<(), HostError> {
    match kind {
        QueryKind::Addresses => begin_master_address_lookup(handle, kind),
        QueryKind::Ipv4Addresses => begin_family_address_lookup(handle, kind, AddressFamily::Inet),
        QueryKind::Ipv6Addresses => begin_family_address_lookup(handle, kind, AddressFamily::Inet6),
        QueryKind::Names => begin_reverse_lookup(handle, kind),
        QueryKind::Reachability => begin_reachability(handle, kind),
        QueryKind::GenericDns { class, rtype } => begin_generic_dns(handle, kind, class, rtype),
        QueryKind::MasterAddressLookup | QueryKind::ByPassMasterAddressLookup => {
            Err(HostError::NotSupported)
        }
    }
}

fn begin_master_address_lookup(handle: &HostHandle, kind: QueryKind) -> Result<(), HostError> {
    let name = seeded_name(handle).ok_or(HostError::HostNotFound)?;
    let registry = MasterRegistry::global();

    match registry.cache().lookup(&name) {
        Ok(Some(cached)) => {
            activate_self_signal(handle, kind);
            handle.complete(kind, Ok(HostInfoValue::Addresses(cached)));
            return Ok(());
        }
        Ok(None) => {}
        Err(e) => {
            activate_self_signal(handle, kind);
            handle.complete(kind, Err(e));
            return Ok(());
        }
    }

    match registry.admit_or_join(&name) {
        Admission::Leader { liveness } => {
            let data = handle.0.clone();
            let resolver = handle.0.resolver.clone();
            let name_for_task = name.clone();
            let join = tokio::spawn(async move {
                let result = resolver
                    .forward_lookup(&name_for_task, AddressFamily::Unspecified)
                    .await;
                let outcome = match &result {
                    Ok(addresses) => GroupOutcome {
                        addresses: addresses.clone(),
                        error: None,
                    },
                    Err(e) => GroupOutcome {
                        addresses: Vec::new(),
                        error: Some(e.clone()),
                    },
                };
                MasterRegistry::global().complete_leader(&name_for_task, outcome);
                HostHandle(data).complete(kind, result.map(HostInfoValue::Addresses));
            });
            registry.set_leader_task(&name, join.abort_handle());
            let group = GroupMembership {
                name: Arc::from(name.as_str()),
                liveness,
            };
            activate_task(handle, kind, TaskToken::with_group(join.abort_handle(), group), true);
        }
        Admission::Follower { rx, liveness } => {
            let data = handle.0.clone();
            let join = tokio::spawn(async move {
                let result = await_group(rx).await;
                HostHandle(data).complete(kind, result.map(HostInfoValue::Addresses));
            });
            let group = GroupMembership {
                name: Arc::from(name.as_str()),
                liveness,
            };
            activate_task(
                handle,
                kind,
                TaskToken::with_group(join.abort_handle(), group),
                false,
            );
        }
    }
    Ok(())
}

async fn await_group(
    mut rx: tokio::sync::watch::Receiver<Option<Arc<GroupOutcome>>>,
) -> Result<Vec<std::net::IpAddr>, HostError> {
    loop {
        if let Some(outcome) = rx.borrow().as_ref() {
            return match &outcome.error {
                Some(e) => Err(e.clone()),
                None => try_clone_vec(&outcome.addresses),
            };
        }
        if rx.changed().await.is_err() {
            return Err(HostError::InternalNetDb);
        }
    }
}

fn begin_family_address_lookup(
    handle: &HostHandle,
    kind: QueryKind,
    family: AddressFamily,
) -> Result<(), HostError> {
    let name = seeded_name(handle).ok_or(HostError::HostNotFound)?;
    let data = handle.0.clone();
    let resolver = handle.0.resolver.clone();
    let join = tokio::spawn(async move {
        let result = resolver.forward_lookup(&name, family).await;
        HostHandle(data).complete(kind, result.map(HostInfoValue::Addresses));
    });
    activate_task(handle, kind, TaskToken::new(join.abort_handle()), true);
    Ok(())
}

fn begin_reverse_lookup(handle: &HostHandle, kind: QueryKind) -> Result<(), HostError> {
    let address = seeded_address(handle).ok_or(HostError::HostNotFound)?;
    let data = handle.0.clone();
    let resolver = handle.0.resolver.clone();
    let join = tokio::spawn(async move {
        let result = resolver.reverse_lookup(address).await;
        HostHandle(data).complete(kind, result.map(HostInfoValue::Names));
    });
    activate_task(handle, kind, TaskToken::new(join.abort_handle()), true);
    Ok(())
}

fn begin_reachability(handle: &HostHandle, kind: QueryKind) -> Result<(), HostError> {
    let target = seeded_name(handle)
        .or_else(|| seeded_address(handle).map(|a| a.to_string()))
        .ok_or(HostError::HostNotFound)?;

    if let Ok(address) = target.parse::<std::net::IpAddr>() {
        let _ = address;
        activate_self_signal(handle, kind);
        let flags = netresolve_domain::ReachabilityFlags(
            netresolve_domain::ReachabilityFlags::REACHABLE
                | netresolve_domain::ReachabilityFlags::IS_LOCAL_ADDRESS,
        );
        handle.complete(kind, Ok(HostInfoValue::Reachability(flags)));
        return Ok(());
    }

    let data = handle.0.clone();
    let resolver = handle.0.resolver.clone();
    let join = tokio::spawn(async move {
        let result = resolver.reachability_probe(&target).await;
        HostHandle(data).complete(kind, result.map(HostInfoValue::Reachability));
    });
    activate_task(handle, kind, TaskToken::new(join.abort_handle()), true);
    Ok(())
}

fn begin_generic_dns(
    handle: &HostHandle,
    kind: QueryKind,
    class: u16,
    rtype: u16,
) -> Result<(), HostError> {
    let name = seeded_name(handle).ok_or(HostError::HostNotFound)?;
    let data = handle.0.clone();
    let resolver = handle.0.resolver.clone();
    let join = tokio::spawn(async move {
        let result = resolver.generic_dns_lookup(&name, class, rtype).await;
        HostHandle(data).complete(kind, result.map(HostInfoValue::Records));
    });
    activate_task(handle, kind, TaskToken::new(join.abort_handle()), true);
    Ok(())
}

fn activate_self_signal(handle: &HostHandle, kind: QueryKind) {
    let mut inner = handle.0.inner.lock().unwrap();
    inner.active_kind = Some(kind);
    inner.lookup = Some(LookupToken::SelfSignal(SelfSignalToken::new()));
}

/// Installs `token` as the active lookup for `kind`, re-applying any
/// (loop, mode) pairs already scheduled on the handle so a task spawned
/// after scheduling still gets woken the same as one spawned before it.
fn activate_with_token(handle: &HostHandle, kind: QueryKind, token: LookupToken) {
    let mut inner = handle.0.inner.lock().unwrap();
    inner.active_kind = Some(kind);
    for (event_loop, mode) in inner.schedules.clone() {
        token.schedule(event_loop, mode);
    }
    inner.lookup = Some(token);
}

fn activate_task(handle: &HostHandle, kind: QueryKind, token: TaskToken, is_leader: bool) {
    let wrapped = match kind {
        QueryKind::Addresses => {
            if is_leader {
                LookupToken::Primary(token)
            } else {
                LookupToken::Subscriber(token)
            }
        }
        QueryKind::Ipv4Addresses | QueryKind::Ipv6Addresses => LookupToken::Primary(token),
        QueryKind::Names => LookupToken::NameLookup(token),
        QueryKind::Reachability => LookupToken::Reachability(token),
        QueryKind::GenericDns { .. } => LookupToken::GenericDns(token),
        QueryKind::MasterAddressLookup | QueryKind::ByPassMasterAddressLookup => {
            LookupToken::Primary(token)
        }
    };
    activate_with_token(handle, kind, wrapped);
}

impl fmt::Debug for BlockingMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingMarker").field("id", &self.id).finish()
    }
}

mod helpers;

use helpers::mock_resolver::MockHostResolver;
use netresolve_core::HostHandle;
use netresolve_domain::{HostInfoValue, QueryKind};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

fn addr(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forward_resolution_populates_info() {
    let resolver = Arc::new(MockHostResolver::new());
    resolver
        .set_addresses("example.test", vec![addr(93, 184, 215, 14)])
        .await;

    let handle = HostHandle::create_with_name("example.test", resolver).unwrap();
    handle.start_info_resolution(QueryKind::Addresses).unwrap();

    match handle.get_info(QueryKind::Addresses).flatten() {
        Some(HostInfoValue::Addresses(addrs)) => {
            assert_eq!(addrs, vec![addr(93, 184, 215, 14)])
        }
        other => panic!("expected addresses, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unresolvable_name_surfaces_host_not_found() {
    let resolver = Arc::new(MockHostResolver::new());
    let handle = HostHandle::create_with_name("nowhere.invalid", resolver).unwrap();

    let err = handle
        .start_info_resolution(QueryKind::Addresses)
        .unwrap_err();
    assert_eq!(err, netresolve_domain::HostError::HostNotFound);
    assert_eq!(handle.error(), Some(netresolve_domain::HostError::HostNotFound));
    assert_eq!(
        handle.get_info(QueryKind::Addresses),
        Some(None),
        "a failed lookup still records the NULL-sentinel completion (P8)"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_lookup_of_same_name_hits_the_cache() {
    let resolver = Arc::new(MockHostResolver::new());
    resolver.set_addresses("cached.test", vec![addr(10, 0, 0, 1)]).await;

    let first = HostHandle::create_with_name("cached.test", resolver.clone()).unwrap();
    first.start_info_resolution(QueryKind::Addresses).unwrap();
    assert_eq!(resolver.forward_call_count(), 1);

    let second = HostHandle::create_with_name("cached.test", resolver.clone()).unwrap();
    second.start_info_resolution(QueryKind::Addresses).unwrap();
    assert_eq!(resolver.forward_call_count(), 1, "cache hit must not re-query");

    match second.get_info(QueryKind::Addresses).flatten() {
        Some(HostInfoValue::Addresses(addrs)) => assert_eq!(addrs, vec![addr(10, 0, 0, 1)]),
        other => panic!("expected addresses, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_lookups_of_same_name_coalesce_into_one_query() {
    let resolver = Arc::new(MockHostResolver::new());
    resolver.set_addresses("coalesce.test", vec![addr(172, 16, 0, 1)]).await;
    resolver.set_forward_delay(Duration::from_millis(100)).await;

    let a = HostHandle::create_with_name("coalesce.test", resolver.clone()).unwrap();
    let b = HostHandle::create_with_name("coalesce.test", resolver.clone()).unwrap();

    let (result_a, result_b) = tokio::join!(
        tokio::task::spawn_blocking({
            let a = a.clone();
            move || a.start_info_resolution(QueryKind::Addresses)
        }),
        tokio::task::spawn_blocking({
            let b = b.clone();
            move || b.start_info_resolution(QueryKind::Addresses)
        }),
    );
    result_a.unwrap().unwrap();
    result_b.unwrap().unwrap();

    assert_eq!(
        resolver.forward_call_count(),
        1,
        "duplicate in-flight lookups for the same name must coalesce"
    );
    assert_eq!(
        a.get_info(QueryKind::Addresses).flatten(),
        b.get_info(QueryKind::Addresses).flatten()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn re_entering_start_while_running_is_a_no_op() {
    let resolver = Arc::new(MockHostResolver::new());
    resolver.set_addresses("slow.test", vec![addr(1, 1, 1, 1)]).await;
    resolver.set_forward_delay(Duration::from_millis(200)).await;

    let handle = HostHandle::create_with_name("slow.test", resolver).unwrap();
    let notify = Arc::new(tokio::sync::Notify::new());
    let notify_clone = notify.clone();
    handle.set_client(Some(Arc::new(move |_h, _k, _e| {
        notify_clone.notify_one();
    })));

    let outcome_first = handle.start_info_resolution(QueryKind::Addresses).unwrap();
    assert_eq!(outcome_first, netresolve_core::StartOutcome::Started);

    let outcome_second = handle.start_info_resolution(QueryKind::Addresses).unwrap();
    assert_eq!(outcome_second, netresolve_core::StartOutcome::AlreadyActive);
    assert!(handle.error().is_none());

    notify.notified().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_tears_down_and_reports_completion_exactly_once() {
    let resolver = Arc::new(MockHostResolver::new());
    resolver.set_addresses("cancel.test", vec![addr(8, 8, 8, 8)]).await;
    resolver.set_forward_delay(Duration::from_millis(200)).await;

    let handle = HostHandle::create_with_name("cancel.test", resolver).unwrap();
    let fire_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let fire_count_clone = fire_count.clone();
    handle.set_client(Some(Arc::new(move |_h, _k, _e| {
        fire_count_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    })));

    handle.start_info_resolution(QueryKind::Addresses).unwrap();
    handle.cancel_info_resolution(QueryKind::Addresses);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        fire_count.load(std::sync::atomic::Ordering::SeqCst),
        1,
        "a cancelled lookup must invoke the callback exactly once (P5)"
    );
    assert_eq!(
        handle.get_info(QueryKind::Addresses),
        Some(None),
        "cancellation records a NULL-sentinel completion, not an absent key (P8)"
    );
    assert!(handle.error().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_sole_leader_releases_waiting_followers() {
    let resolver = Arc::new(MockHostResolver::new());
    resolver.set_addresses("withdraw.test", vec![addr(9, 9, 9, 9)]).await;
    resolver.set_forward_delay(Duration::from_millis(200)).await;

    let leader = HostHandle::create_with_name("withdraw.test", resolver.clone()).unwrap();
    let follower = HostHandle::create_with_name("withdraw.test", resolver).unwrap();

    // Both handles need a callback installed so `start_info_resolution`
    // takes the non-blocking path — otherwise the leader's own call would
    // block this test thread until its (cancelled) lookup tears down.
    leader.set_client(Some(Arc::new(|_h, _k, _e| {})));
    let done = Arc::new(tokio::sync::Notify::new());
    let done_clone = done.clone();
    follower.set_client(Some(Arc::new(move |_h, _k, _e| {
        done_clone.notify_one();
    })));

    leader.start_info_resolution(QueryKind::Addresses).unwrap();
    follower.start_info_resolution(QueryKind::Addresses).unwrap();
    leader.cancel_info_resolution(QueryKind::Addresses);

    tokio::time::timeout(Duration::from_secs(1), done.notified())
        .await
        .expect("a follower must not hang forever once the sole leader withdraws");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_client_callback_receives_the_result() {
    let resolver = Arc::new(MockHostResolver::new());
    resolver.set_addresses("async.test", vec![addr(203, 0, 113, 5)]).await;

    let handle = HostHandle::create_with_name("async.test", resolver).unwrap();
    let done = Arc::new(tokio::sync::Notify::new());
    let done_clone = done.clone();
    handle.set_client(Some(Arc::new(move |_h, kind, err| {
        assert_eq!(kind, QueryKind::Addresses);
        assert!(err.is_none());
        done_clone.notify_one();
    })));

    handle.start_info_resolution(QueryKind::Addresses).unwrap();
    tokio::time::timeout(Duration::from_secs(1), done.notified())
        .await
        .expect("callback should fire");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reverse_lookup_uses_seeded_address() {
    let resolver = Arc::new(MockHostResolver::new());
    let address = addr(198, 51, 100, 7);
    resolver
        .set_names(address, vec!["host.example.test".to_string()])
        .await;

    let handle = HostHandle::create_with_address(address, resolver).unwrap();
    handle.start_info_resolution(QueryKind::Names).unwrap();

    match handle.get_info(QueryKind::Names).flatten() {
        Some(HostInfoValue::Names(names)) => {
            assert_eq!(names, vec!["host.example.test".to_string()])
        }
        other => panic!("expected names, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_copy_snapshots_info_but_not_lookup_state() {
    let resolver = Arc::new(MockHostResolver::new());
    resolver.set_addresses("copy.test", vec![addr(192, 0, 2, 1)]).await;

    let original = HostHandle::create_with_name("copy.test", resolver).unwrap();
    original.start_info_resolution(QueryKind::Addresses).unwrap();

    let copy = original.create_copy();
    assert_eq!(
        copy.get_info(QueryKind::Addresses).flatten(),
        original.get_info(QueryKind::Addresses).flatten()
    );
    assert!(copy.error().is_none());
}

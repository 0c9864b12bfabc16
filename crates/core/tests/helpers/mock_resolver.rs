#![allow(dead_code)]

use async_trait::async_trait;
use netresolve_core::{AddressFamily, HostResolver};
use netresolve_domain::{GenericRecord, HostError, ReachabilityFlags};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct MockHostResolver {
    addresses: Arc<Mutex<HashMap<String, Vec<IpAddr>>>>,
    names: Arc<Mutex<HashMap<IpAddr, Vec<String>>>>,
    forward_calls: Arc<AtomicUsize>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockHostResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_addresses(&self, name: &str, addresses: Vec<IpAddr>) {
        self.addresses
            .lock()
            .await
            .insert(name.to_string(), addresses);
    }

    pub async fn set_names(&self, address: IpAddr, names: Vec<String>) {
        self.names.lock().await.insert(address, names);
    }

    pub async fn set_forward_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    pub fn forward_call_count(&self) -> usize {
        self.forward_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for MockHostResolver {
    async fn forward_lookup(
        &self,
        name: &str,
        _family: AddressFamily,
    ) -> Result<Vec<IpAddr>, HostError> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = *self.delay.lock().await {
            tokio::time::sleep(delay).await;
        }
        self.addresses
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or(HostError::HostNotFound)
    }

    async fn reverse_lookup(&self, address: IpAddr) -> Result<Vec<String>, HostError> {
        self.names
            .lock()
            .await
            .get(&address)
            .cloned()
            .ok_or(HostError::HostNotFound)
    }

    async fn reachability_probe(&self, _target: &str) -> Result<ReachabilityFlags, HostError> {
        Ok(ReachabilityFlags(ReachabilityFlags::REACHABLE))
    }

    async fn generic_dns_lookup(
        &self,
        _name: &str,
        _class: u16,
        _rtype: u16,
    ) -> Result<Vec<GenericRecord>, HostError> {
        Ok(Vec::new())
    }
}

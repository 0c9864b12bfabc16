//! The platform resolver port (§6): "Consumed from the platform resolver."
//! THE CORE only ever calls through this trait; the actual DNS I/O is an
//! external collaborator, out of scope per §1.

use async_trait::async_trait;
use netresolve_domain::{GenericRecord, HostError, ReachabilityFlags};
use std::net::IpAddr;

/// Forward resolution hint, mirroring `hints.family` in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Unspecified,
    Inet,
    Inet6,
}

#[async_trait]
pub trait HostResolver: Send + Sync {
    /// `StartAddrInfo(name, hints, sink)` — forward resolution.
    async fn forward_lookup(
        &self,
        name: &str,
        family: AddressFamily,
    ) -> Result<Vec<IpAddr>, HostError>;

    /// `StartNameInfo(sockaddr, sink)` — reverse resolution.
    async fn reverse_lookup(&self, address: IpAddr) -> Result<Vec<String>, HostError>;

    /// A reachability probe. Implementations for an address or a
    /// dotted-numeric name are expected to resolve immediately — the
    /// driver special-cases that (§4.1) rather than relying on the
    /// implementation to do so, but a real network probe still goes
    /// through here for a symbolic name.
    async fn reachability_probe(&self, target: &str) -> Result<ReachabilityFlags, HostError>;

    /// A generic DNS query by raw class/type.
    async fn generic_dns_lookup(
        &self,
        name: &str,
        class: u16,
        rtype: u16,
    ) -> Result<Vec<GenericRecord>, HostError>;
}

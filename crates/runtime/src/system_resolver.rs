//! The production `HostResolver` (§6, "platform resolver"): backed by
//! `hickory-resolver`, the same crate family the teacher uses for its
//! own DNS protocol work (`hickory-proto`/`hickory-server`).

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use netresolve_core::{AddressFamily, HostResolver};
use netresolve_domain::{GenericRecord, HostError};
use std::net::IpAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

pub struct SystemHostResolver {
    resolver: TokioAsyncResolver,
    reachability_timeout: Duration,
}

impl SystemHostResolver {
    /// Builds a resolver from the system's configured nameservers,
    /// falling back to the crate's bundled defaults when none can be
    /// read (e.g. no `/etc/resolv.conf` in a container).
    pub fn from_system_config() -> Result<Self, HostError> {
        let (config, opts) = hickory_resolver::system_conf::read_system_conf()
            .unwrap_or_else(|_| (ResolverConfig::default(), ResolverOpts::default()));
        Ok(Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            reachability_timeout: Duration::from_secs(3),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.reachability_timeout = timeout;
        self
    }
}

#[async_trait]
impl HostResolver for SystemHostResolver {
    async fn forward_lookup(
        &self,
        name: &str,
        family: AddressFamily,
    ) -> Result<Vec<IpAddr>, HostError> {
        debug!(name, ?family, "forward lookup");
        let response = self
            .resolver
            .lookup_ip(name)
            .await
            .map_err(|_| HostError::HostNotFound)?;
        // A family-restricted query that matches zero records is a
        // successful empty result (P9), not `HostNotFound` — that error
        // is reserved for the resolver itself reporting no records at all,
        // handled by the `map_err` above.
        let addresses: Vec<IpAddr> = response
            .iter()
            .filter(|addr| match family {
                AddressFamily::Unspecified => true,
                AddressFamily::Inet => addr.is_ipv4(),
                AddressFamily::Inet6 => addr.is_ipv6(),
            })
            .collect();
        Ok(addresses)
    }

    async fn reverse_lookup(&self, address: IpAddr) -> Result<Vec<String>, HostError> {
        debug!(%address, "reverse lookup");
        let response = self
            .resolver
            .reverse_lookup(address)
            .await
            .map_err(|_| HostError::HostNotFound)?;
        let names: Vec<String> = response.iter().map(|name| name.to_string()).collect();
        if names.is_empty() {
            return Err(HostError::HostNotFound);
        }
        Ok(names)
    }

    async fn reachability_probe(
        &self,
        target: &str,
    ) -> Result<netresolve_domain::ReachabilityFlags, HostError> {
        let addresses = self.forward_lookup(target, AddressFamily::Unspecified).await?;
        let Some(address) = addresses.first() else {
            return Ok(netresolve_domain::ReachabilityFlags::default());
        };
        let connect = tokio::time::timeout(
            self.reachability_timeout,
            TcpStream::connect((*address, 80)),
        )
        .await;
        let reachable = matches!(connect, Ok(Ok(_)));
        let mut flags = 0u32;
        if reachable {
            flags |= netresolve_domain::ReachabilityFlags::REACHABLE;
        }
        Ok(netresolve_domain::ReachabilityFlags(flags))
    }

    async fn generic_dns_lookup(
        &self,
        name: &str,
        class: u16,
        rtype: u16,
    ) -> Result<Vec<GenericRecord>, HostError> {
        use hickory_resolver::proto::rr::{DNSClass, RecordType};

        let record_type = RecordType::from(rtype);
        let dns_class = DNSClass::from(class);
        debug!(name, ?record_type, ?dns_class, "generic dns lookup");

        let lookup = self
            .resolver
            .lookup(name, record_type)
            .await
            .map_err(|_| HostError::HostNotFound)?;

        let records = lookup
            .record_iter()
            .filter_map(|record| {
                let rdata = record.data()?.to_string().into_bytes();
                Some(GenericRecord {
                    class: u16::from(record.dns_class()),
                    rtype: u16::from(record.record_type()),
                    ttl: record.ttl(),
                    rdata,
                })
            })
            .collect();
        Ok(records)
    }
}

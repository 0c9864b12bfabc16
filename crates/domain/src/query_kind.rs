/// Which facet of a host is being resolved.
///
/// `MasterAddressLookup` and `ByPassMasterAddressLookup` are the "master"
/// variants used internally by the registry (see `netresolve-core`'s
/// registry module) — they are deliberately not constructible outside this
/// workspace's core crate, mirroring the spec's private range of
/// `CFHostInfoType` values that callers must never see documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Names,
    Addresses,
    Reachability,
    Ipv4Addresses,
    Ipv6Addresses,
    GenericDns { class: u16, rtype: u16 },

    #[doc(hidden)]
    MasterAddressLookup,
    #[doc(hidden)]
    ByPassMasterAddressLookup,
}

impl QueryKind {
    /// Whether this kind shares the master-registry fast path (§3, QueryKind).
    pub fn is_master_family(&self) -> bool {
        matches!(
            self,
            QueryKind::Addresses
                | QueryKind::Ipv4Addresses
                | QueryKind::Ipv6Addresses
                | QueryKind::MasterAddressLookup
                | QueryKind::ByPassMasterAddressLookup
        )
    }

    pub fn is_private(&self) -> bool {
        matches!(
            self,
            QueryKind::MasterAddressLookup | QueryKind::ByPassMasterAddressLookup
        )
    }
}

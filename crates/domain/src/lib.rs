//! netresolve domain layer: the types and errors THE CORE operates on.
//! No I/O, no locking, no async — those belong to `netresolve-core` and
//! `netresolve-runtime`.

pub mod config;
pub mod errors;
pub mod host_info;
pub mod query_kind;

pub use errors::{ErrorDomain, HostError};
pub use host_info::{GenericRecord, HostInfoValue, ReachabilityFlags};
pub use query_kind::QueryKind;

/// Cache max entries (§3, Cache Entry invariant C2; §6 Constants).
pub const CACHE_MAX_ENTRIES: usize = 25;

/// Cache TTL (§3, Cache Entry invariant C3; §6 Constants).
pub const CACHE_TTL: std::time::Duration = std::time::Duration::from_millis(1000);

/// Reserved mode name for synchronous `StartInfoResolution` (§4.1, §6).
/// Must never overlap with a user-visible mode.
pub const BLOCKING_MODE: &str = "_netresolve_blocking_mode";

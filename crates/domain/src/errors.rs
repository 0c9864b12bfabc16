use thiserror::Error;

/// The error domain a `HostError` was raised in, mirroring the two
/// `CFStreamError` domains the original core distinguishes, plus an
/// internal catch-all for statuses that carry no further detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDomain {
    Posix,
    NetDb,
    Internal,
}

/// The error taxonomy of the resolver core. Every lookup failure,
/// whatever its origin, is mapped into exactly one of these before it
/// reaches `HostHandle::error` or a completion callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// A container allocation failed while materialising a result.
    #[error("out of memory")]
    OutOfMemory,

    /// The name contained an embedded NUL or non-UTF-8 bytes.
    #[error("host not found")]
    HostNotFound,

    /// The underlying resolver returned a nonzero status, mapped directly.
    #[error("resolver status {0}")]
    ResolverStatus(i32),

    /// The resolver indicated a system error; the real code came from `errno`.
    #[error("system error {0}")]
    SystemErrnoPassthrough(i32),

    /// A nonzero status was claimed but no further code is available.
    #[error("internal netdb error")]
    InternalNetDb,

    /// The requested operation has no support on this platform.
    #[error("not supported")]
    NotSupported,
}

impl HostError {
    pub fn domain(&self) -> ErrorDomain {
        match self {
            HostError::OutOfMemory
            | HostError::SystemErrnoPassthrough(_)
            | HostError::NotSupported => ErrorDomain::Posix,
            HostError::HostNotFound | HostError::ResolverStatus(_) => ErrorDomain::NetDb,
            HostError::InternalNetDb => ErrorDomain::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_mapping_covers_every_variant() {
        assert_eq!(HostError::OutOfMemory.domain(), ErrorDomain::Posix);
        assert_eq!(HostError::NotSupported.domain(), ErrorDomain::Posix);
        assert_eq!(HostError::SystemErrnoPassthrough(5).domain(), ErrorDomain::Posix);
        assert_eq!(HostError::HostNotFound.domain(), ErrorDomain::NetDb);
        assert_eq!(HostError::ResolverStatus(-2).domain(), ErrorDomain::NetDb);
        assert_eq!(HostError::InternalNetDb.domain(), ErrorDomain::Internal);
    }
}

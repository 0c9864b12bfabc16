//! Fallible deep-copy helper for the points where a single cached or
//! shared result is duplicated out to a new owner: a positive-cache hit,
//! and a master-registry group fanning its outcome out to a follower
//! (§4.3/§4.4). This is where §7's `OutOfMemory` has a real trigger.

use netresolve_domain::HostError;

pub(crate) fn try_clone_vec<T: Clone>(items: &[T]) -> Result<Vec<T>, HostError> {
    let mut out = Vec::new();
    out.try_reserve_exact(items.len())
        .map_err(|_| HostError::OutOfMemory)?;
    out.extend_from_slice(items);
    Ok(out)
}

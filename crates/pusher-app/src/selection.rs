//! Selected-device bookkeeping outside the state machine

use pusher_core::{find_device, DeviceContext, DeviceList};

/// Outcome of re-resolving a selection against a fresh list
#[derive(Debug, Clone)]
pub enum Reresolved {
    /// The device is still listed; this is its fresh copy
    Refreshed(DeviceContext),
    /// The device is gone from the list; the previous value is kept
    Kept(DeviceContext),
}

/// Re-resolve `selected` against a freshly fetched `list`.
///
/// A device still present is replaced by its fresh copy (new boot state,
/// runtime...). A device missing from the list keeps its previous value; the
/// selection is never cleared here.
pub fn reresolve(selected: Option<&DeviceContext>, list: &DeviceList) -> Option<Reresolved> {
    let selected = selected?;
    Some(match find_device(list, &selected.udid) {
        Some(fresh) => Reresolved::Refreshed(fresh.clone()),
        None => Reresolved::Kept(selected.clone()),
    })
}

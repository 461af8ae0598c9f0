//! Process-wide table of live range selectors, keyed by container.
//!
//! Entries are non-owning: a selector whose last handle is dropped tears
//! itself down and removes its entry.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock, Weak},
};

use parking_lot::RwLock;
use range_selector_host::{DocumentId, ElementId};

use super::Shared;

/// Identifies a container across documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RegistryKey {
    pub document: DocumentId,
    pub container: ElementId,
}

fn registry() -> &'static RwLock<HashMap<RegistryKey, Weak<Shared>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<RegistryKey, Weak<Shared>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Whether a live selector is bound to `key`.
pub(crate) fn is_bound(key: RegistryKey) -> bool {
    // Never upgrade here: dropping the temporary could run teardown while the
    // read lock is held.
    registry()
        .read()
        .get(&key)
        .is_some_and(|entry| entry.strong_count() > 0)
}

/// Records `shared` for `key`. Fails if another live selector holds the key.
pub(crate) fn insert(key: RegistryKey, shared: &Arc<Shared>) -> bool {
    let mut registry = registry().write();
    if registry
        .get(&key)
        .is_some_and(|entry| entry.strong_count() > 0 && !entry.ptr_eq(&Arc::downgrade(shared)))
    {
        return false;
    }
    registry.insert(key, Arc::downgrade(shared));
    true
}

/// Removes the entry for `key` if it still belongs to `owner`.
pub(crate) fn remove(key: RegistryKey, owner: &Weak<Shared>) {
    let mut registry = registry().write();
    if registry.get(&key).is_some_and(|entry| entry.ptr_eq(owner)) {
        registry.remove(&key);
    }
}

pub(crate) fn lookup(key: RegistryKey) -> Option<Arc<Shared>> {
    registry().read().get(&key).and_then(Weak::upgrade)
}

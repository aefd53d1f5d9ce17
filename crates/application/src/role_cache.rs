use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use warden_core::RoleId;
use warden_domain::Role;

#[derive(Default)]
struct RoleCacheSlot {
    snapshot: ArcSwapOption<Role>,
    write_gate: Arc<Mutex<()>>,
}

/// Read-mostly cache of role snapshots keyed by role id.
///
/// Readers load the current snapshot without waiting on writers. Writers
/// serialize per role through [`RoleCache::lock_role`] and publish a whole new
/// snapshot, so a reader sees either the previous rule set or the next one.
#[derive(Default)]
pub struct RoleCache {
    slots: RwLock<HashMap<RoleId, Arc<RoleCacheSlot>>>,
}

impl RoleCache {
    /// Creates an empty role cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot for a role.
    pub async fn get(&self, role_id: RoleId) -> Option<Arc<Role>> {
        let slots = self.slots.read().await;
        slots
            .get(&role_id)
            .and_then(|slot| slot.snapshot.load_full())
    }

    /// Acquires exclusive write access to one role's entry.
    ///
    /// Other roles are unaffected and readers of this role keep observing the
    /// published snapshot until the guard replaces it.
    pub async fn lock_role(&self, role_id: RoleId) -> RoleWriteGuard {
        loop {
            let slot = self.slot(role_id).await;
            if let Some(guard) = self.lock_slot(role_id, slot).await {
                return guard;
            }
        }
    }

    /// Drops the cached snapshot and slot for a role.
    ///
    /// Waits for any in-flight load or reconciliation of the role, so a
    /// snapshot read before the call cannot be published after it.
    pub async fn invalidate(&self, role_id: RoleId) {
        loop {
            let Some(slot) = self.slots.read().await.get(&role_id).map(Arc::clone) else {
                return;
            };
            if let Some(guard) = self.lock_slot(role_id, slot).await {
                self.evict(guard).await;
                return;
            }
        }
    }

    /// Removes a role's entry while its write gate is held.
    pub async fn evict(&self, guard: RoleWriteGuard) {
        guard.clear();

        let mut slots = self.slots.write().await;
        if slots
            .get(&guard.role_id)
            .is_some_and(|slot| Arc::ptr_eq(slot, &guard.slot))
        {
            slots.remove(&guard.role_id);
        }
    }

    #[cfg(test)]
    pub(crate) async fn slot_count(&self) -> usize {
        self.slots.read().await.len()
    }

    async fn slot(&self, role_id: RoleId) -> Arc<RoleCacheSlot> {
        if let Some(slot) = self.slots.read().await.get(&role_id) {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(role_id).or_default())
    }

    // Returns None when the slot was evicted while waiting for its gate.
    async fn lock_slot(
        &self,
        role_id: RoleId,
        slot: Arc<RoleCacheSlot>,
    ) -> Option<RoleWriteGuard> {
        let gate = Arc::clone(&slot.write_gate).lock_owned().await;

        let current = self
            .slots
            .read()
            .await
            .get(&role_id)
            .is_some_and(|published| Arc::ptr_eq(published, &slot));

        current.then_some(RoleWriteGuard {
            role_id,
            slot,
            _gate: gate,
        })
    }
}

/// Exclusive write access to one role's cache entry.
pub struct RoleWriteGuard {
    role_id: RoleId,
    slot: Arc<RoleCacheSlot>,
    _gate: OwnedMutexGuard<()>,
}

impl RoleWriteGuard {
    /// Returns the currently published snapshot.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Role>> {
        self.slot.snapshot.load_full()
    }

    /// Publishes a new snapshot.
    pub fn replace(&self, role: Arc<Role>) {
        self.slot.snapshot.store(Some(role));
    }

    /// Drops the published snapshot so the next read reloads the role.
    pub fn clear(&self) {
        self.slot.snapshot.store(None);
    }
}

//! Per-template and per-master-step lock registry.
//!
//! Locks are created lazily and never shared between ids, so operations on
//! different templates never wait on each other. Acquisition order is always
//! template first, then master step.
//!
//! An entry lives only while someone holds or waits on it: releasing the last
//! guard removes it, whether the id turned out to exist or not.

use std::hash::Hash;
use std::sync::Arc;

use buildline_core::{MasterStepId, TemplateId};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Registry of hierarchy locks keyed by id.
#[derive(Debug, Default)]
pub(crate) struct LockRegistry {
    templates: DashMap<TemplateId, Arc<RwLock<()>>>,
    master_steps: DashMap<MasterStepId, Arc<Mutex<()>>>,
}

/// A held lock that evicts its registry entry on release when no other
/// caller holds or waits on the same lock.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub(crate) struct Held<'a, K: Eq + Hash, L, G> {
    guard: Option<G>,
    id: K,
    map: &'a DashMap<K, Arc<L>>,
}

impl<K: Eq + Hash, L, G> Drop for Held<'_, K, L, G> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters clone the Arc under the shard lock, so a count of one
        // means the map holds the only reference.
        self.map
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub(crate) type TemplateWrite<'a> =
    Held<'a, TemplateId, RwLock<()>, OwnedRwLockWriteGuard<()>>;
pub(crate) type TemplateRead<'a> = Held<'a, TemplateId, RwLock<()>, OwnedRwLockReadGuard<()>>;
pub(crate) type MasterStepLock<'a> = Held<'a, MasterStepId, Mutex<()>, OwnedMutexGuard<()>>;

fn checkout<K: Eq + Hash + Copy, L: Default>(map: &DashMap<K, Arc<L>>, id: K) -> Arc<L> {
    Arc::clone(map.entry(id).or_default().value())
}

impl LockRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Exclusive scope for validate → commit → invalidate on one template.
    pub(crate) async fn write_template(&self, id: TemplateId) -> TemplateWrite<'_> {
        let lock = checkout(&self.templates, id);
        let held = Held {
            guard: None,
            id,
            map: &self.templates,
        };
        let held = Self::fill(held, lock.write_owned()).await;
        tracing::trace!(template_id = %id, "template write lock acquired");
        held
    }

    /// Shared scope for loading and caching a projection.
    pub(crate) async fn read_template(&self, id: TemplateId) -> TemplateRead<'_> {
        let lock = checkout(&self.templates, id);
        let held = Held {
            guard: None,
            id,
            map: &self.templates,
        };
        Self::fill(held, lock.read_owned()).await
    }

    /// Serializes assignment creation against deletion of the same master step.
    pub(crate) async fn lock_master_step(&self, id: MasterStepId) -> MasterStepLock<'_> {
        let lock = checkout(&self.master_steps, id);
        let held = Held {
            guard: None,
            id,
            map: &self.master_steps,
        };
        Self::fill(held, lock.lock_owned()).await
    }

    /// Wait for the guard with `held` already armed, so a caller cancelled
    /// while waiting still evicts the entry.
    async fn fill<'a, K: Eq + Hash, L, G>(
        mut held: Held<'a, K, L, G>,
        acquire: impl Future<Output = G>,
    ) -> Held<'a, K, L, G> {
        held.guard = Some(acquire.await);
        held
    }

    /// Number of template and master-step entries currently tracked.
    #[cfg(test)]
    pub(crate) fn tracked(&self) -> (usize, usize) {
        (self.templates.len(), self.master_steps.len())
    }
}

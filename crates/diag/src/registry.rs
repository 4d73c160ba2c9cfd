//! Weak side table of live tracked objects
//!
//! Objects register a non-owning reference when they are created. A census
//! walks the table, upgrades what is still alive and skips the rest, so the
//! registry never keeps anything alive by itself.
//!
//! # Thread Safety
//!
//! Entries sit behind a `parking_lot::RwLock`. A snapshot taken while other
//! threads allocate is a best-effort point-in-time view.

use std::fmt;
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::RwLock;

use crate::census::GroupKey;
use crate::tensor::{DType, Device, Element, Shape, Tensor};

/// Dead entries are swept once the table grows past this many slots.
const MIN_PRUNE_THRESHOLD: usize = 64;

/// An object the census can see
///
/// Only objects that return a key are counted; everything else is
/// filtered out of the census.
pub trait Tracked: Send + Sync {
    /// Grouping key when this object is a numeric array
    fn census_key(&self) -> Option<GroupKey>;
}

struct Entries {
    objects: Vec<Weak<dyn Tracked>>,
    prune_at: usize,
}

impl Entries {
    fn new() -> Self {
        Self {
            objects: Vec::new(),
            prune_at: MIN_PRUNE_THRESHOLD,
        }
    }

    fn prune(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|weak| weak.strong_count() > 0);
        self.prune_at = (self.objects.len() * 2).max(MIN_PRUNE_THRESHOLD);
        before - self.objects.len()
    }
}

/// Registry of tracked objects
///
/// Cloning yields another handle to the same table.
#[derive(Clone)]
pub struct TensorRegistry {
    entries: Arc<RwLock<Entries>>,
}

static GLOBAL: LazyLock<TensorRegistry> = LazyLock::new(TensorRegistry::new);

impl TensorRegistry {
    /// Create an empty, isolated registry
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::new())),
        }
    }

    /// Process-wide registry used by [`Tensor::zeros`] and friends
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Record a weak reference to `object`
    pub fn register<T: Tracked + 'static>(&self, object: &Arc<T>) {
        let weak: Weak<T> = Arc::downgrade(object);
        let weak: Weak<dyn Tracked> = weak;
        let mut entries = self.entries.write();
        if entries.objects.len() >= entries.prune_at {
            let removed = entries.prune();
            tracing::trace!(removed, remaining = entries.objects.len(), "pruned registry");
        }
        entries.objects.push(weak);
    }

    /// Strong references to every object still alive
    pub fn snapshot(&self) -> Vec<Arc<dyn Tracked>> {
        self.entries
            .read()
            .objects
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Drop entries whose object is gone; returns how many were removed
    pub fn prune(&self) -> usize {
        self.entries.write().prune()
    }

    /// Number of live objects
    pub fn live_count(&self) -> usize {
        self.entries
            .read()
            .objects
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Number of slots, including ones not yet pruned
    pub fn slot_count(&self) -> usize {
        self.entries.read().objects.len()
    }

    /// Zero-filled tensor registered here
    pub fn zeros(
        &self,
        shape: impl Into<Shape>,
        dtype: DType,
        device: Device,
    ) -> crate::Result<Tensor> {
        Tensor::zeros_in(self, shape.into(), dtype, device)
    }

    /// Tensor over host data registered here
    pub fn from_vec<T: Element>(
        &self,
        data: Vec<T>,
        shape: impl Into<Shape>,
    ) -> crate::Result<Tensor> {
        Tensor::from_vec_in(self, data, shape.into())
    }
}

impl Default for TensorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TensorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorRegistry")
            .field("slots", &self.slot_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opaque;

    impl Tracked for Opaque {
        fn census_key(&self) -> Option<GroupKey> {
            None
        }
    }

    #[test]
    fn test_registry_does_not_own_objects() {
        let registry = TensorRegistry::new();
        let object = Arc::new(Opaque);
        registry.register(&object);
        assert_eq!(registry.live_count(), 1);
        assert_eq!(Arc::strong_count(&object), 1);

        drop(object);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.slot_count(), 1);
        assert!(registry.snapshot().is_empty());
        assert_eq!(registry.prune(), 1);
        assert_eq!(registry.slot_count(), 0);
    }

    #[test]
    fn test_register_sweeps_dead_slots() {
        let registry = TensorRegistry::new();
        for _ in 0..MIN_PRUNE_THRESHOLD * 4 {
            let object = Arc::new(Opaque);
            registry.register(&object);
        }
        assert!(registry.slot_count() <= MIN_PRUNE_THRESHOLD);
    }

    #[test]
    fn test_clones_share_table() {
        let registry = TensorRegistry::new();
        let other = registry.clone();
        let _t = other.zeros([2], DType::Int8, Device::Cpu).unwrap();
        assert_eq!(registry.live_count(), 1);
        assert_eq!(TensorRegistry::new().live_count(), 0);
    }
}

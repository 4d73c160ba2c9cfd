//! Live tensor census
//!
//! A [`Census`] is a frequency table from [`GroupKey`] to the number of live
//! tensors with that key. It is rebuilt from scratch on every call and kept
//! ordered, so printing it twice over the same objects gives identical text.

use std::collections::BTreeMap;
use std::fmt;

use crate::registry::TensorRegistry;
use crate::tensor::{DType, Shape};

/// (device, element type, shape) grouping key
///
/// Ordered by device string, then element type, then shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    device: String,
    dtype: DType,
    shape: Shape,
}

impl GroupKey {
    /// Build a key
    pub fn new(device: impl Into<String>, dtype: DType, shape: impl Into<Shape>) -> Self {
        Self {
            device: device.into(),
            dtype,
            shape: shape.into(),
        }
    }

    /// Device identifier as text
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// Tuple notation: `('cpu', float32, (2, 3))`
impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', {}, {})", self.device, self.dtype, self.shape)
    }
}

/// Count of live tensors per [`GroupKey`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Census {
    groups: BTreeMap<GroupKey, usize>,
}

impl Census {
    /// Walk `registry` once and count every live tensor.
    ///
    /// Objects that are not tensors are skipped. Slots of dropped objects
    /// are pruned first.
    pub fn collect(registry: &TensorRegistry) -> Self {
        let pruned = registry.prune();
        let snapshot = registry.snapshot();
        let scanned = snapshot.len();
        let census: Self = snapshot
            .iter()
            .filter_map(|object| object.census_key())
            .collect();

        tracing::debug!(
            pruned,
            scanned,
            tensors = census.total(),
            groups = census.len(),
            "collected tensor census"
        );
        census
    }

    /// Census of the process-global registry
    pub fn global() -> Self {
        Self::collect(TensorRegistry::global())
    }

    /// Number of tensors across all groups
    pub fn total(&self) -> usize {
        self.groups.values().sum()
    }

    /// Number of distinct groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no tensors were found
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Count for one key (0 when absent)
    pub fn get(&self, key: &GroupKey) -> usize {
        self.groups.get(key).copied().unwrap_or(0)
    }

    /// Groups in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, usize)> {
        self.groups.iter().map(|(key, &count)| (key, count))
    }

    /// Per-key change from `before` to `self`, zero deltas omitted
    pub fn diff(&self, before: &Self) -> CensusDiff {
        let mut deltas = BTreeMap::new();
        for (key, count) in self.iter() {
            let delta = count as i64 - before.get(key) as i64;
            if delta != 0 {
                deltas.insert(key.clone(), delta);
            }
        }
        for (key, count) in before.iter() {
            if !self.groups.contains_key(key) {
                deltas.insert(key.clone(), -(count as i64));
            }
        }
        CensusDiff { deltas }
    }
}

impl FromIterator<GroupKey> for Census {
    fn from_iter<I: IntoIterator<Item = GroupKey>>(iter: I) -> Self {
        let mut groups = BTreeMap::new();
        for key in iter {
            *groups.entry(key).or_insert(0) += 1;
        }
        Self { groups }
    }
}

/// One `<key>\t<count>` line per group
impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, count) in self.iter() {
            writeln!(f, "{key}\t{count}")?;
        }
        Ok(())
    }
}

/// Signed per-group change between two censuses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CensusDiff {
    deltas: BTreeMap<GroupKey, i64>,
}

impl CensusDiff {
    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Change for one key (0 when unchanged)
    pub fn get(&self, key: &GroupKey) -> i64 {
        self.deltas.get(key).copied().unwrap_or(0)
    }

    /// Net change in tensor count
    pub fn net(&self) -> i64 {
        self.deltas.values().sum()
    }

    /// Changed groups in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, i64)> {
        self.deltas.iter().map(|(key, &delta)| (key, delta))
    }
}

/// One `<key>\t<+delta>` line per changed group
impl fmt::Display for CensusDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, delta) in self.iter() {
            writeln!(f, "{key}\t{delta:+}")?;
        }
        Ok(())
    }
}

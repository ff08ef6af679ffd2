//! Per-pid CPU baseline tracking.
//!
//! A CPU percent is only meaningful once a pid has been read twice. The
//! first observation reports 0 and seeds the baseline; later observations
//! pass the inspector's delta reading through. Pids missing from the latest
//! snapshot are evicted every tick so the cache never outgrows the live
//! process table.

use crate::sample::Snapshot;
use std::collections::HashSet;

/// Tracks which pids already have a CPU baseline.
#[derive(Debug, Default, Clone)]
pub struct CpuBaselineCache {
    baselined: HashSet<u32>,
}

impl CpuBaselineCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the CPU reading of every pid seen for the first time and record
    /// it as baselined. Negative or non-finite readings become 0.
    #[must_use]
    pub fn annotate(&mut self, mut snapshot: Snapshot) -> Snapshot {
        for sample in &mut snapshot.processes {
            let first_read = self.baselined.insert(sample.pid);
            if first_read || !sample.cpu_percent.is_finite() || sample.cpu_percent < 0.0 {
                sample.cpu_percent = 0.0;
            }
        }
        snapshot
    }

    /// Drop every cached pid not in `present`.
    pub fn evict(&mut self, present: &HashSet<u32>) {
        let before = self.baselined.len();
        self.baselined.retain(|pid| present.contains(pid));
        let evicted = before - self.baselined.len();
        if evicted > 0 {
            tracing::trace!(evicted, "cpu baselines evicted");
        }
    }

    /// Whether `pid` has a baseline.
    pub fn has_baseline(&self, pid: u32) -> bool {
        self.baselined.contains(&pid)
    }

    /// Number of cached pids.
    pub fn len(&self) -> usize {
        self.baselined.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.baselined.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{MemorySample, ProcessSample};
    use proptest::prelude::*;

    fn snap(entries: &[(u32, f32)]) -> Snapshot {
        Snapshot::new(
            MemorySample::default(),
            entries
                .iter()
                .map(|&(pid, cpu)| ProcessSample::new(pid, "p", 0).with_cpu(cpu))
                .collect(),
        )
    }

    #[test]
    fn test_first_read_is_zero() {
        let mut cache = CpuBaselineCache::new();
        let out = cache.annotate(snap(&[(10, 42.0)]));
        assert_eq!(out.processes[0].cpu_percent, 0.0);
        assert!(cache.has_baseline(10));
    }

    #[test]
    fn test_second_read_passes_through() {
        let mut cache = CpuBaselineCache::new();
        let _ = cache.annotate(snap(&[(10, 42.0)]));
        let out = cache.annotate(snap(&[(10, 12.5)]));
        assert_eq!(out.processes[0].cpu_percent, 12.5);
    }

    #[test]
    fn test_new_pid_among_known() {
        let mut cache = CpuBaselineCache::new();
        let _ = cache.annotate(snap(&[(1, 5.0)]));
        let out = cache.annotate(snap(&[(1, 5.0), (2, 9.0)]));
        assert_eq!(out.processes[0].cpu_percent, 5.0);
        assert_eq!(out.processes[1].cpu_percent, 0.0);
    }

    #[test]
    fn test_evict_absent_pids() {
        let mut cache = CpuBaselineCache::new();
        let _ = cache.annotate(snap(&[(1, 0.0), (2, 0.0), (3, 0.0)]));
        cache.evict(&[2].into_iter().collect());
        assert_eq!(cache.len(), 1);
        assert!(cache.has_baseline(2));
        assert!(!cache.has_baseline(1));
    }

    #[test]
    fn test_evicted_pid_reads_cold_again() {
        let mut cache = CpuBaselineCache::new();
        let _ = cache.annotate(snap(&[(7, 3.0)]));
        cache.evict(&HashSet::new());
        let out = cache.annotate(snap(&[(7, 3.0)]));
        assert_eq!(out.processes[0].cpu_percent, 0.0);
    }

    #[test]
    fn test_non_finite_reading_is_zero() {
        let mut cache = CpuBaselineCache::new();
        let _ = cache.annotate(snap(&[(1, 0.0), (2, 0.0)]));
        let out = cache.annotate(snap(&[(1, f32::NAN), (2, -4.0)]));
        assert_eq!(out.processes[0].cpu_percent, 0.0);
        assert_eq!(out.processes[1].cpu_percent, 0.0);
    }

    proptest! {
        #[test]
        fn prop_cache_bounded_by_live_pids(rounds in proptest::collection::vec(
            proptest::collection::hash_set(0u32..200, 0..40), 1..10)) {
            let mut cache = CpuBaselineCache::new();
            for pids in &rounds {
                let entries: Vec<(u32, f32)> = pids.iter().map(|&p| (p, 1.0)).collect();
                let out = cache.annotate(snap(&entries));
                cache.evict(&out.pids());
                prop_assert!(cache.len() <= pids.len());
            }
        }
    }
}

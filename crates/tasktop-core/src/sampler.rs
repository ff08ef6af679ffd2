//! One point-in-time capture of memory and processes.

use crate::cpu_cache::CpuBaselineCache;
use crate::error::{CaptureError, InspectError};
use crate::sample::{MemorySample, ProcessSample, RawProcessInfo, Snapshot};
use crate::traits::ProcessInspector;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

/// Owns an inspector and the CPU baseline cache.
pub struct Sampler<I> {
    inspector: I,
    cache: CpuBaselineCache,
}

impl<I: ProcessInspector> Sampler<I> {
    /// Create a sampler with an empty cache.
    pub fn new(inspector: I) -> Self {
        Self {
            inspector,
            cache: CpuBaselineCache::new(),
        }
    }

    /// Capture one snapshot.
    ///
    /// Processes that vanish mid-capture are omitted. An unreadable
    /// executable marks a process inaccessible; unreadable I/O counters
    /// read as zero. Only a failed enumeration fails the capture.
    pub fn capture(&mut self) -> Result<Snapshot, CaptureError> {
        let started = Instant::now();

        let raw = self.inspector.list_processes().map_err(|err| match err {
            InspectError::Other(msg) => CaptureError::Unavailable(msg),
            other => CaptureError::Inspect(other),
        })?;
        let memory = self.inspector.memory()?;

        let mut seen = HashSet::with_capacity(raw.len());
        let mut processes = Vec::with_capacity(raw.len());
        // Many processes share an executable directory; list each once.
        let mut readable_dirs = HashMap::new();
        for info in raw {
            if !seen.insert(info.pid) {
                continue;
            }
            match self.sample(&info, &memory, &mut readable_dirs) {
                Ok(sample) => processes.push(sample),
                Err(err) => tracing::trace!(pid = info.pid, %err, "process skipped"),
            }
        }

        let snapshot = self.cache.annotate(Snapshot::new(memory, processes));
        self.cache.evict(&snapshot.pids());

        tracing::debug!(
            processes = snapshot.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "capture complete"
        );
        Ok(snapshot)
    }

    fn sample(
        &self,
        info: &RawProcessInfo,
        memory: &MemorySample,
        readable_dirs: &mut HashMap<PathBuf, bool>,
    ) -> Result<ProcessSample, InspectError> {
        let accessible = match self.inspector.exe_path(info.pid) {
            Ok(path) => path.parent().is_some_and(|dir| {
                *readable_dirs
                    .entry(dir.to_path_buf())
                    .or_insert_with(|| self.inspector.is_dir_readable(dir))
            }),
            Err(InspectError::NotFound(pid)) => return Err(InspectError::NotFound(pid)),
            Err(_) => false,
        };

        let disk_io = match self.inspector.io_counters(info.pid) {
            Ok(io) => io.total(),
            Err(InspectError::NotFound(pid)) => return Err(InspectError::NotFound(pid)),
            Err(_) => 0,
        };

        Ok(ProcessSample::new(info.pid, &info.name, info.rss)
            .with_owner(info.owner.clone().unwrap_or_default())
            .with_memory_percent(memory.share_of(info.rss))
            .with_cpu(info.cpu_percent)
            .with_disk_io(disk_io)
            .with_accessible(accessible))
    }

    /// The CPU baseline cache.
    pub fn cache(&self) -> &CpuBaselineCache {
        &self.cache
    }

    /// The inspector.
    pub fn inspector(&self) -> &I {
        &self.inspector
    }
}

//! Point-in-time memory and process values.
//!
//! A [`Snapshot`] is produced once per successful capture, handed to the UI
//! thread by value and dropped after the next one is applied. Identity
//! across snapshots is the pid alone; a pid recycled by the OS for a new
//! process is indistinguishable from the process that held it before.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Process names are cut to this many characters.
pub const MAX_NAME_LEN: usize = 50;

/// Bytes per GiB, for display.
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Bytes per MiB, for display.
pub const MIB: f64 = 1024.0 * 1024.0;

// =============================================================================
// Memory
// =============================================================================

/// System memory at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MemorySample {
    /// Total physical memory in bytes.
    pub total: u64,
    /// Used memory in bytes.
    pub used: u64,
    /// Available memory in bytes.
    pub available: u64,
    /// Used share of total, 0-100.
    pub percent: f64,
}

impl MemorySample {
    /// Build a sample, deriving `percent` from `used / total`.
    #[must_use]
    pub fn new(total: u64, used: u64, available: u64) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        };
        Self {
            total,
            used,
            available,
            percent,
        }
    }

    /// Gauge level for the current usage.
    pub fn level(&self) -> MemoryLevel {
        MemoryLevel::from_percent(self.percent)
    }

    /// Share of total memory held by `rss` bytes, 0-100.
    pub fn share_of(&self, rss: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (rss as f64 / self.total as f64 * 100.0).clamp(0.0, 100.0)
        }
    }
}

/// Memory gauge color band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryLevel {
    /// Below 50%.
    Normal,
    /// 50% up to 80%.
    Warning,
    /// 80% and above.
    Critical,
}

impl MemoryLevel {
    /// Classify a usage percent.
    pub fn from_percent(percent: f64) -> Self {
        if percent < 50.0 {
            Self::Normal
        } else if percent < 80.0 {
            Self::Warning
        } else {
            Self::Critical
        }
    }

    /// Hex color used for the gauge fill.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Normal => "#27ae60",
            Self::Warning => "#f39c12",
            Self::Critical => "#e74c3c",
        }
    }
}

// =============================================================================
// Processes
// =============================================================================

/// One process as listed by a [`crate::ProcessInspector`], before
/// annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProcessInfo {
    /// Process id.
    pub pid: u32,
    /// Executable or command name.
    pub name: String,
    /// Owning account name, when resolvable.
    pub owner: Option<String>,
    /// Resident set size in bytes.
    pub rss: u64,
    /// CPU percent as reported by the inspector since its previous refresh.
    pub cpu_percent: f32,
}

impl RawProcessInfo {
    /// Create a listing entry with no owner and no CPU reading.
    #[must_use]
    pub fn new(pid: u32, name: impl Into<String>, rss: u64) -> Self {
        Self {
            pid,
            name: name.into(),
            owner: None,
            rss,
            cpu_percent: 0.0,
        }
    }

    /// Set the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the raw CPU reading.
    #[must_use]
    pub fn with_cpu(mut self, cpu_percent: f32) -> Self {
        self.cpu_percent = cpu_percent;
        self
    }
}

/// Cumulative disk I/O counters for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoCounters {
    /// Bytes read.
    pub read_bytes: u64,
    /// Bytes written.
    pub write_bytes: u64,
}

impl IoCounters {
    /// Read plus written bytes.
    pub fn total(&self) -> u64 {
        self.read_bytes.saturating_add(self.write_bytes)
    }
}

/// A process row value as carried by a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    /// Process id, unique within one snapshot.
    pub pid: u32,
    /// Name, at most [`MAX_NAME_LEN`] characters.
    pub name: String,
    /// Owning account; empty when unknown.
    pub owner: String,
    /// Resident set size in bytes.
    pub memory_bytes: u64,
    /// Share of total memory, 0-100.
    pub memory_percent: f64,
    /// Delta-based CPU percent; 0 on the first reading of a pid.
    pub cpu_percent: f32,
    /// Cumulative disk bytes read and written; 0 when unavailable.
    pub disk_io_bytes: u64,
    /// Whether the executable resolved to a readable directory.
    pub accessible: bool,
}

impl ProcessSample {
    /// Create a sample with the given identity and memory, other fields zeroed.
    #[must_use]
    pub fn new(pid: u32, name: &str, memory_bytes: u64) -> Self {
        Self {
            pid,
            name: truncate_name(name),
            owner: String::new(),
            memory_bytes,
            memory_percent: 0.0,
            cpu_percent: 0.0,
            disk_io_bytes: 0,
            accessible: true,
        }
    }

    /// Set the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Set the CPU percent.
    #[must_use]
    pub fn with_cpu(mut self, cpu_percent: f32) -> Self {
        self.cpu_percent = cpu_percent;
        self
    }

    /// Set the memory percent.
    #[must_use]
    pub fn with_memory_percent(mut self, percent: f64) -> Self {
        self.memory_percent = percent;
        self
    }

    /// Set the disk I/O total.
    #[must_use]
    pub fn with_disk_io(mut self, bytes: u64) -> Self {
        self.disk_io_bytes = bytes;
        self
    }

    /// Set accessibility.
    #[must_use]
    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    /// Resident memory in MiB.
    pub fn memory_mib(&self) -> f64 {
        self.memory_bytes as f64 / MIB
    }
}

/// Cut a name to [`MAX_NAME_LEN`] characters on a char boundary.
pub fn truncate_name(name: &str) -> String {
    match name.char_indices().nth(MAX_NAME_LEN) {
        Some((idx, _)) => name[..idx].to_string(),
        None => name.to_string(),
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Memory plus the process list from one capture.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// System memory.
    pub memory: MemorySample,
    /// Processes in enumeration order, no duplicate pids.
    pub processes: Vec<ProcessSample>,
}

impl Snapshot {
    /// Build a snapshot, keeping only the first sample seen for each pid.
    #[must_use]
    pub fn new(memory: MemorySample, processes: Vec<ProcessSample>) -> Self {
        let mut seen = HashSet::with_capacity(processes.len());
        let processes = processes
            .into_iter()
            .filter(|p| seen.insert(p.pid))
            .collect();
        Self { memory, processes }
    }

    /// Number of processes.
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Whether the snapshot holds no processes.
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Pids present in this snapshot.
    pub fn pids(&self) -> HashSet<u32> {
        self.processes.iter().map(|p| p.pid).collect()
    }
}

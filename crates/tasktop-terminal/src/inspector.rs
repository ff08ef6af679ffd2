//! sysinfo-backed host collaborators.

use std::io;
use std::path::PathBuf;
use sysinfo::{
    MemoryRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, Signal, System, UpdateKind,
    Users,
};
use tasktop_core::{
    InspectError, IoCounters, MemorySample, ProcessInspector, RawProcessInfo, TerminateError,
    TerminationService,
};

fn process_refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing()
        .with_cpu()
        .with_memory()
        .with_disk_usage()
        .with_user(UpdateKind::OnlyIfNotSet)
        .with_exe(UpdateKind::OnlyIfNotSet)
}

/// Reads memory and processes through `sysinfo`.
///
/// `list_processes` refreshes the process table; the per-process accessors
/// answer from that refresh, so they are consistent within one capture.
pub struct SysinfoInspector {
    system: System,
    users: Users,
}

impl Default for SysinfoInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoInspector {
    /// Create an inspector. Nothing is read until the first capture.
    pub fn new() -> Self {
        Self {
            system: System::new(),
            users: Users::new_with_refreshed_list(),
        }
    }
}

impl ProcessInspector for SysinfoInspector {
    fn memory(&mut self) -> Result<MemorySample, InspectError> {
        self.system
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        let total = self.system.total_memory();
        if total == 0 {
            return Err(InspectError::Other("memory totals unavailable".to_string()));
        }
        Ok(MemorySample::new(
            total,
            self.system.used_memory(),
            self.system.available_memory(),
        ))
    }

    fn list_processes(&mut self) -> Result<Vec<RawProcessInfo>, InspectError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(InspectError::Other(format!(
                "process listing is not supported on {}",
                std::env::consts::OS
            )));
        }
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, process_refresh_kind());

        // Owner lookup may reload `users`, so copy the rows out first.
        let raw: Vec<_> = self
            .system
            .processes()
            .values()
            .filter(|p| p.thread_kind().is_none())
            .map(|p| {
                (
                    p.pid().as_u32(),
                    p.name().to_string_lossy().into_owned(),
                    p.user_id().cloned(),
                    p.memory(),
                    p.cpu_usage(),
                )
            })
            .collect();

        let unknown_uid = raw.iter().any(|(_, _, uid, _, _)| {
            uid.as_ref()
                .is_some_and(|u| self.users.get_user_by_id(u).is_none())
        });
        if unknown_uid {
            self.users = Users::new_with_refreshed_list();
        }

        Ok(raw
            .into_iter()
            .map(|(pid, name, uid, rss, cpu)| {
                let owner = uid.map(|uid| {
                    self.users
                        .get_user_by_id(&uid)
                        .map_or_else(|| uid.to_string(), |u| u.name().to_string())
                });
                let mut info = RawProcessInfo::new(pid, name, rss).with_cpu(cpu);
                info.owner = owner;
                info
            })
            .collect())
    }

    fn exe_path(&self, pid: u32) -> Result<PathBuf, InspectError> {
        let process = self
            .system
            .process(Pid::from_u32(pid))
            .ok_or(InspectError::NotFound(pid))?;
        process
            .exe()
            .map(PathBuf::from)
            .ok_or(InspectError::AccessDenied(pid))
    }

    fn io_counters(&self, pid: u32) -> Result<IoCounters, InspectError> {
        let process = self
            .system
            .process(Pid::from_u32(pid))
            .ok_or(InspectError::NotFound(pid))?;
        let usage = process.disk_usage();
        Ok(IoCounters {
            read_bytes: usage.total_read_bytes,
            write_bytes: usage.total_written_bytes,
        })
    }
}

/// Sends SIGTERM (or the platform's closest equivalent) through `sysinfo`.
pub struct SysinfoTerminator {
    system: System,
}

impl Default for SysinfoTerminator {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoTerminator {
    /// Create a terminator.
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl TerminationService for SysinfoTerminator {
    fn terminate(&mut self, pid: u32) -> Result<(), TerminateError> {
        if pid == std::process::id() {
            return Err(TerminateError::Other(
                "refusing to terminate tasktop itself".to_string(),
            ));
        }

        let target = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[target]),
            true,
            ProcessRefreshKind::nothing(),
        );
        let process = self.system.process(target).ok_or(TerminateError::NotFound)?;

        // `kill_with` is `None` where SIGTERM does not exist; fall back to
        // the platform kill.
        let sent = process.kill_with(Signal::Term).unwrap_or_else(|| process.kill());
        if sent {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        Err(match err.kind() {
            io::ErrorKind::PermissionDenied => TerminateError::AccessDenied,
            io::ErrorKind::NotFound => TerminateError::NotFound,
            _ if err.raw_os_error() == Some(3) && cfg!(unix) => TerminateError::NotFound,
            _ => TerminateError::Other(err.to_string()),
        })
    }
}

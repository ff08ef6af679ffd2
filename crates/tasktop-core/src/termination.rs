//! Batch termination with classified, aggregated results.
//!
//! Every target is attempted; failures never stop the batch. Processes that
//! already exited are ignored, permission failures get an elevation hint,
//! anything else is listed with its message.

use crate::error::TerminateError;
use crate::menu::Target;
use crate::traits::TerminationService;

/// Hint appended to access-denied reports.
pub const ELEVATION_HINT: &str = "You may need to run with elevated privileges.";

/// Aggregated outcome of a terminate batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminationReport {
    /// Signalled successfully.
    pub terminated: Vec<Target>,
    /// Already gone when signalled.
    pub already_gone: Vec<Target>,
    /// Refused for lack of permission.
    pub access_denied: Vec<Target>,
    /// Failed for another reason, with the message.
    pub failed: Vec<(Target, String)>,
}

impl TerminationReport {
    /// Whether anything needs the user's attention.
    pub fn has_errors(&self) -> bool {
        !self.access_denied.is_empty() || !self.failed.is_empty()
    }

    /// One-line status text.
    pub fn status_line(&self) -> String {
        if self.terminated.is_empty() && !self.has_errors() {
            if self.already_gone.is_empty() {
                "No processes terminated".to_string()
            } else {
                format!(
                    "No processes terminated ({} already exited)",
                    self.already_gone.len()
                )
            }
        } else {
            format!("Terminated {} process(es)", self.terminated.len())
        }
    }

    /// Multi-line warning body, or `None` when there were no errors.
    pub fn warning(&self) -> Option<String> {
        if !self.has_errors() {
            return None;
        }
        let mut msg = String::new();
        if !self.access_denied.is_empty() {
            msg.push_str("Access denied for:\n");
            for t in &self.access_denied {
                msg.push_str(&t.to_string());
                msg.push('\n');
            }
            msg.push('\n');
            msg.push_str(ELEVATION_HINT);
            msg.push_str("\n\n");
        }
        if !self.failed.is_empty() {
            msg.push_str("Failed to terminate:\n");
            for (t, reason) in &self.failed {
                msg.push_str(&format!("{t}: {reason}\n"));
            }
        }
        Some(msg.trim_end().to_string())
    }

    /// Status line plus any warning; always non-empty.
    pub fn summary(&self) -> String {
        match self.warning() {
            Some(warning) => format!("{}\n\n{warning}", self.status_line()),
            None => self.status_line(),
        }
    }
}

/// Attempt to terminate every target and classify the results.
pub fn terminate_all(
    service: &mut dyn TerminationService,
    targets: &[Target],
) -> TerminationReport {
    let mut report = TerminationReport::default();
    for target in targets {
        match service.terminate(target.pid) {
            Ok(()) => report.terminated.push(target.clone()),
            Err(TerminateError::NotFound) => report.already_gone.push(target.clone()),
            Err(TerminateError::AccessDenied) => report.access_denied.push(target.clone()),
            Err(TerminateError::Other(msg)) => report.failed.push((target.clone(), msg)),
        }
    }
    tracing::info!(
        terminated = report.terminated.len(),
        already_gone = report.already_gone.len(),
        access_denied = report.access_denied.len(),
        failed = report.failed.len(),
        "terminate batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct ScriptedTerminator {
        outcomes: HashMap<u32, Result<(), TerminateError>>,
        calls: Vec<u32>,
    }

    impl TerminationService for ScriptedTerminator {
        fn terminate(&mut self, pid: u32) -> Result<(), TerminateError> {
            self.calls.push(pid);
            self.outcomes.get(&pid).cloned().unwrap_or(Ok(()))
        }
    }

    fn scripted(outcomes: Vec<(u32, Result<(), TerminateError>)>) -> ScriptedTerminator {
        ScriptedTerminator {
            outcomes: outcomes.into_iter().collect(),
            calls: Vec::new(),
        }
    }

    #[test]
    fn test_all_succeed() {
        let mut svc = scripted(vec![]);
        let report = terminate_all(&mut svc, &[Target::new(1, "a"), Target::new(2, "b")]);
        assert_eq!(report.status_line(), "Terminated 2 process(es)");
        assert_eq!(report.warning(), None);
    }

    #[test]
    fn test_not_found_is_ignored() {
        let mut svc = scripted(vec![(5, Err(TerminateError::NotFound))]);
        let report = terminate_all(&mut svc, &[Target::new(5, "gone")]);
        assert!(!report.has_errors());
        assert_eq!(report.already_gone.len(), 1);
        assert!(report.summary().contains("already exited"));
    }

    #[test]
    fn test_mixed_batch_does_not_fail_fast() {
        let mut svc = scripted(vec![
            (1, Err(TerminateError::AccessDenied)),
            (2, Err(TerminateError::Other("stuck in D state".to_string()))),
            (3, Ok(())),
        ]);
        let targets = [
            Target::new(1, "sshd"),
            Target::new(2, "nfsd"),
            Target::new(3, "vim"),
        ];
        let report = terminate_all(&mut svc, &targets);
        assert_eq!(svc.calls, vec![1, 2, 3]);

        let warning = report.warning().expect("warning expected");
        assert!(warning.starts_with("Access denied for:\nsshd (PID: 1)"));
        assert!(warning.contains(ELEVATION_HINT));
        assert!(warning.contains("Failed to terminate:\nnfsd (PID: 2): stuck in D state"));

        let summary = report.summary();
        assert!(summary.starts_with("Terminated 1 process(es)"));
    }

    #[test]
    fn test_empty_batch_summary() {
        let mut svc = scripted(vec![]);
        let report = terminate_all(&mut svc, &[]);
        assert_eq!(report.summary(), "No processes terminated");
    }
}

//! Filter and sort pipeline.
//!
//! Filters run in a fixed order (hide-system, hide-inaccessible, search) and
//! each is a pure predicate, so the pipeline is idempotent. The final order
//! is memory descending with pid ascending as tie-break, a total order.

use crate::sample::{ProcessSample, Snapshot};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Pids always treated as system processes.
pub const SYSTEM_PIDS: [u32; 3] = [0, 1, 2];

/// Privileged accounts, compared case-insensitively.
pub const PRIVILEGED_OWNERS: &[&str] = &[
    "root",
    "system",
    "local service",
    "network service",
    "localservice",
    "networkservice",
    "nt authority\\system",
    "nt authority\\local service",
    "nt authority\\network service",
];

/// User-controlled filter inputs, read fresh every tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Hide pids 0-2 and processes owned by privileged accounts.
    pub hide_system_processes: bool,
    /// Hide processes whose executable directory cannot be read.
    pub hide_inaccessible_processes: bool,
    /// Case-insensitive name substring; empty matches everything.
    pub search_query: String,
}

impl FilterState {
    /// Active filters in application order.
    pub fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::with_capacity(3);
        if self.hide_system_processes {
            filters.push(Filter::HideSystem);
        }
        if self.hide_inaccessible_processes {
            filters.push(Filter::HideInaccessible);
        }
        if !self.search_query.is_empty() {
            filters.push(Filter::Search(self.search_query.to_lowercase()));
        }
        filters
    }

    /// Whether any filter would remove rows.
    pub fn is_active(&self) -> bool {
        !self.filters().is_empty()
    }
}

/// A single row predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Drop system processes.
    HideSystem,
    /// Drop inaccessible processes.
    HideInaccessible,
    /// Keep names containing this lowercase needle.
    Search(String),
}

impl Filter {
    /// Whether `sample` survives this filter.
    pub fn keep(&self, sample: &ProcessSample) -> bool {
        match self {
            Self::HideSystem => !is_system_process(sample),
            Self::HideInaccessible => sample.accessible,
            Self::Search(needle) => sample.name.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Pid 0-2 or an owner in [`PRIVILEGED_OWNERS`].
pub fn is_system_process(sample: &ProcessSample) -> bool {
    if SYSTEM_PIDS.contains(&sample.pid) {
        return true;
    }
    let owner = sample.owner.trim().to_lowercase();
    PRIVILEGED_OWNERS.iter().any(|p| *p == owner)
}

/// Case-insensitive substring match on the name; empty query matches.
pub fn matches_search(sample: &ProcessSample, query: &str) -> bool {
    query.is_empty() || Filter::Search(query.to_lowercase()).keep(sample)
}

/// Memory descending, then pid ascending.
pub fn compare_samples(a: &ProcessSample, b: &ProcessSample) -> Ordering {
    b.memory_bytes
        .cmp(&a.memory_bytes)
        .then_with(|| a.pid.cmp(&b.pid))
}

/// Sort in display order.
pub fn sort_samples(samples: &mut [ProcessSample]) {
    samples.sort_by(compare_samples);
}

/// Filter then sort a sample slice.
pub fn apply_to(samples: &[ProcessSample], filter: &FilterState) -> Vec<ProcessSample> {
    let filters = filter.filters();
    let mut kept: Vec<ProcessSample> = samples
        .iter()
        .filter(|s| filters.iter().all(|f| f.keep(s)))
        .cloned()
        .collect();
    sort_samples(&mut kept);
    kept
}

/// Filter then sort the processes of a snapshot.
pub fn apply(snapshot: &Snapshot, filter: &FilterState) -> Vec<ProcessSample> {
    apply_to(&snapshot.processes, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(pid: u32, mem: u64) -> ProcessSample {
        ProcessSample::new(pid, "proc", mem)
    }

    fn pids(samples: &[ProcessSample]) -> Vec<u32> {
        samples.iter().map(|s| s.pid).collect()
    }

    #[test]
    fn test_sort_memory_desc_pid_asc() {
        let input = vec![sample(10, 50), sample(20, 80), sample(30, 80)];
        let out = apply_to(&input, &FilterState::default());
        assert_eq!(pids(&out), vec![20, 30, 10]);
    }

    #[test]
    fn test_sort_independent_of_input_order() {
        let a = vec![sample(30, 80), sample(10, 50), sample(20, 80)];
        let b = vec![sample(20, 80), sample(30, 80), sample(10, 50)];
        let f = FilterState::default();
        assert_eq!(apply_to(&a, &f), apply_to(&b, &f));
    }

    #[test]
    fn test_system_by_pid() {
        for pid in SYSTEM_PIDS {
            assert!(is_system_process(&sample(pid, 0)));
        }
        assert!(!is_system_process(&sample(3, 0)));
    }

    #[test]
    fn test_system_by_owner_case_insensitive() {
        assert!(is_system_process(&sample(400, 0).with_owner("root")));
        assert!(is_system_process(&sample(400, 0).with_owner("ROOT")));
        assert!(is_system_process(
            &sample(400, 0).with_owner("NT AUTHORITY\\SYSTEM")
        ));
        assert!(is_system_process(&sample(400, 0).with_owner("Local Service")));
        assert!(!is_system_process(&sample(400, 0).with_owner("alice")));
        assert!(!is_system_process(&sample(400, 0).with_owner("rooter")));
    }

    #[test]
    fn test_hide_system_example() {
        let input = vec![
            sample(1, 10),
            sample(500, 20).with_owner("root"),
            sample(600, 30).with_owner("alice"),
        ];
        let f = FilterState {
            hide_system_processes: true,
            ..Default::default()
        };
        assert_eq!(pids(&apply_to(&input, &f)), vec![600]);
    }

    #[test]
    fn test_hide_inaccessible() {
        let input = vec![
            sample(10, 10).with_accessible(false),
            sample(11, 10),
        ];
        let f = FilterState {
            hide_inaccessible_processes: true,
            ..Default::default()
        };
        assert_eq!(pids(&apply_to(&input, &f)), vec![11]);
    }

    #[test]
    fn test_search_case_insensitive_substring() {
        let input = vec![
            ProcessSample::new(1, "FireFox", 1),
            ProcessSample::new(2, "bash", 1),
        ];
        let f = FilterState {
            search_query: "fox".to_string(),
            ..Default::default()
        };
        assert_eq!(pids(&apply_to(&input, &f)), vec![1]);
        assert!(matches_search(&input[0], "FIRE"));
        assert!(matches_search(&input[1], ""));
    }

    #[test]
    fn test_filters_order() {
        let f = FilterState {
            hide_system_processes: true,
            hide_inaccessible_processes: true,
            search_query: "Ab".to_string(),
        };
        assert_eq!(
            f.filters(),
            vec![
                Filter::HideSystem,
                Filter::HideInaccessible,
                Filter::Search("ab".to_string())
            ]
        );
        assert!(f.is_active());
        assert!(!FilterState::default().is_active());
    }

    fn arb_sample() -> impl Strategy<Value = ProcessSample> {
        (
            0u32..1000,
            0u64..1000,
            prop::sample::select(vec!["root", "alice", "SYSTEM", ""]),
            prop::sample::select(vec!["bash", "Xorg", "firefox", "sshd"]),
            any::<bool>(),
        )
            .prop_map(|(pid, mem, owner, name, accessible)| {
                ProcessSample::new(pid, name, mem)
                    .with_owner(owner)
                    .with_accessible(accessible)
            })
    }

    fn arb_filter() -> impl Strategy<Value = FilterState> {
        (
            any::<bool>(),
            any::<bool>(),
            prop::sample::select(vec!["", "s", "X", "fire"]),
        )
            .prop_map(|(sys, inacc, q)| FilterState {
                hide_system_processes: sys,
                hide_inaccessible_processes: inacc,
                search_query: q.to_string(),
            })
    }

    proptest! {
        #[test]
        fn prop_apply_idempotent(samples in proptest::collection::vec(arb_sample(), 0..60), f in arb_filter()) {
            let once = apply_to(&samples, &f);
            let twice = apply_to(&once, &f);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_sort_deterministic(samples in proptest::collection::vec(arb_sample(), 0..60)) {
            let snap = Snapshot::new(crate::sample::MemorySample::default(), samples);
            let mut reversed = snap.processes.clone();
            reversed.reverse();
            let f = FilterState::default();
            prop_assert_eq!(apply_to(&snap.processes, &f), apply_to(&reversed, &f));
        }

        #[test]
        fn prop_sorted_output_is_ordered(samples in proptest::collection::vec(arb_sample(), 0..60), f in arb_filter()) {
            let out = apply_to(&samples, &f);
            for pair in out.windows(2) {
                prop_assert_ne!(compare_samples(&pair[0], &pair[1]), Ordering::Greater);
            }
        }
    }
}

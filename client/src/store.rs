//! Application State Store
//!
//! Single source of truth for everything the screens render. State is an
//! immutable snapshot replaced wholesale by [`reduce`]; readers either take
//! the latest snapshot or subscribe to changes.

use std::sync::Arc;

use shared::{InventoryItem, Job, JobId, Locale, OptimizationResult, PickingList, School};
use tokio::sync::watch;

/// Canonical client state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub schools: Vec<School>,
    pub inventory: Vec<InventoryItem>,
    /// The job this client is tracking, if any
    pub current_job: Option<Job>,
    pub is_optimizing: bool,
    /// Result of the tracked job once COMPLETED
    pub last_result: Option<OptimizationResult>,
    /// Picking list of the tracked job once COMPLETED
    pub picking_list: Option<PickingList>,
    pub locale: Locale,
}

impl AppState {
    pub fn with_locale(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    pub fn tracked_job_id(&self) -> Option<JobId> {
        self.current_job.as_ref().map(|job| job.job_id)
    }

    pub fn is_tracking(&self, job_id: JobId) -> bool {
        self.tracked_job_id() == Some(job_id)
    }
}

/// State transitions, one per gateway outcome or UI toggle
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetSchools(Vec<School>),
    SetInventory(Vec<InventoryItem>),
    /// Record a job snapshot; never regresses the status of the tracked job
    SetJob(Job),
    /// A new run is starting: drop the previous result and picking list
    BeginOptimization,
    /// Store the result of `job_id` and clear the optimizing flag
    SetResult {
        job_id: JobId,
        result: OptimizationResult,
    },
    SetPickingList {
        job_id: JobId,
        picking_list: PickingList,
    },
    /// The run for `job_id` (or a trigger that never got an id) failed
    OptimizationFailed { job_id: Option<JobId> },
    SetLocale(Locale),
}

/// Apply `action` to `state`
///
/// Total: every (state, action) pair yields a state; job-scoped actions for a
/// job other than the tracked one leave the state unchanged.
pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::SetSchools(schools) => next.schools = schools,
        Action::SetInventory(inventory) => next.inventory = inventory,
        Action::SetJob(job) => {
            let regresses = state
                .current_job
                .as_ref()
                .map(|current| {
                    current.job_id == job.job_id && !current.status.can_advance_to(job.status)
                })
                .unwrap_or(false);
            if !regresses {
                next.current_job = Some(job);
            }
        }
        Action::BeginOptimization => {
            next.current_job = None;
            next.is_optimizing = true;
            next.last_result = None;
            next.picking_list = None;
        }
        Action::SetResult { job_id, result } => {
            if state.is_tracking(job_id) {
                next.last_result = Some(result);
                next.is_optimizing = false;
            }
        }
        Action::SetPickingList {
            job_id,
            picking_list,
        } => {
            if state.is_tracking(job_id) {
                next.picking_list = Some(picking_list);
            }
        }
        Action::OptimizationFailed { job_id } => {
            let applies = match job_id {
                Some(id) => state.is_tracking(id),
                None => true,
            };
            if applies {
                next.is_optimizing = false;
            }
        }
        Action::SetLocale(locale) => next.locale = locale,
    }
    next
}

/// Shared handle to the state
///
/// Cloning the store clones the handle; all clones see the same state.
#[derive(Clone)]
pub struct Store {
    tx: Arc<watch::Sender<Arc<AppState>>>,
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    /// Latest committed snapshot
    pub fn snapshot(&self) -> Arc<AppState> {
        self.tx.borrow().clone()
    }

    /// Receiver that is notified on every committed change
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.tx.subscribe()
    }

    /// Commit `action`; subscribers are only woken if the state changed
    pub fn dispatch(&self, action: Action) {
        self.tx.send_if_modified(|state| commit(state, action));
    }

    /// Commit `action` only while `job_id` is still the tracked job
    ///
    /// The check and the commit happen under the same lock. Returns false if
    /// the job is no longer tracked and the action was dropped.
    pub fn dispatch_for_job(&self, job_id: JobId, action: Action) -> bool {
        let mut tracked = false;
        self.tx.send_if_modified(|state| {
            tracked = state.is_tracking(job_id);
            tracked && commit(state, action)
        });
        tracked
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

fn commit(state: &mut Arc<AppState>, action: Action) -> bool {
    let next = reduce(&**state, action);
    if next == **state {
        return false;
    }
    *state = Arc::new(next);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared::{JobStatus, SelectionReport};
    use std::collections::BTreeMap;

    fn job(id: u64, status: JobStatus, result: Option<OptimizationResult>) -> Job {
        Job {
            job_id: JobId(id),
            status,
            created_at: chrono::Utc::now(),
            result,
        }
    }

    fn result(selected: &[&str]) -> OptimizationResult {
        OptimizationResult {
            selection: SelectionReport {
                selected_school_ids: selected.iter().map(|s| s.to_string()).collect(),
                total_students_served: 10,
            },
            inventory_impact: vec![],
            shortages: vec![],
        }
    }

    fn tracking(id: u64) -> AppState {
        reduce(
            &reduce(&AppState::default(), Action::BeginOptimization),
            Action::SetJob(job(id, JobStatus::Pending, None)),
        )
    }

    #[test]
    fn test_set_schools_replaces_wholesale() {
        let school = |id: &str| School {
            school_id: id.into(),
            total_students: 1,
            sku_demand: BTreeMap::new(),
        };
        let state = reduce(
            &AppState::default(),
            Action::SetSchools(vec![school("A"), school("B")]),
        );
        let state = reduce(&state, Action::SetSchools(vec![school("C")]));

        assert_eq!(state.schools.len(), 1);
        assert_eq!(state.schools[0].school_id, "C");
    }

    #[test]
    fn test_begin_optimization_clears_previous_run() {
        let mut state = tracking(7);
        state = reduce(
            &state,
            Action::SetResult {
                job_id: JobId(7),
                result: result(&["A"]),
            },
        );
        state = reduce(
            &state,
            Action::SetPickingList {
                job_id: JobId(7),
                picking_list: PickingList::default(),
            },
        );
        assert!(state.last_result.is_some());
        assert!(!state.is_optimizing);

        let state = reduce(&state, Action::BeginOptimization);
        assert!(state.is_optimizing);
        assert!(state.last_result.is_none());
        assert!(state.picking_list.is_none());
        assert!(state.current_job.is_none());
    }

    #[test]
    fn test_set_job_never_regresses_status() {
        let mut state = tracking(7);
        state = reduce(&state, Action::SetJob(job(7, JobStatus::Processing, None)));
        state = reduce(&state, Action::SetJob(job(7, JobStatus::Pending, None)));
        assert_eq!(state.current_job.as_ref().unwrap().status, JobStatus::Processing);

        state = reduce(
            &state,
            Action::SetJob(job(7, JobStatus::Completed, Some(result(&["A"])))),
        );
        state = reduce(
            &state,
            Action::SetResult {
                job_id: JobId(7),
                result: result(&["A"]),
            },
        );
        state = reduce(&state, Action::SetJob(job(7, JobStatus::Processing, None)));

        assert_eq!(state.current_job.as_ref().unwrap().status, JobStatus::Completed);
        assert_eq!(state.last_result, Some(result(&["A"])));
    }

    #[test]
    fn test_results_for_untracked_job_are_ignored() {
        let state = tracking(9);
        let after = reduce(
            &state,
            Action::SetResult {
                job_id: JobId(7),
                result: result(&["A"]),
            },
        );
        let after = reduce(
            &after,
            Action::SetPickingList {
                job_id: JobId(7),
                picking_list: PickingList::default(),
            },
        );

        assert_eq!(after, state);
    }

    #[test]
    fn test_failure_clears_optimizing_flag() {
        let state = reduce(&AppState::default(), Action::BeginOptimization);
        let state = reduce(&state, Action::OptimizationFailed { job_id: None });
        assert!(!state.is_optimizing);

        let state = reduce(
            &tracking(9),
            Action::OptimizationFailed {
                job_id: Some(JobId(7)),
            },
        );
        assert!(state.is_optimizing);
    }

    #[test]
    fn test_locale_is_independent_of_domain_state() {
        let state = tracking(3);
        let toggled = reduce(&state, Action::SetLocale(state.locale.toggle()));

        assert_eq!(toggled.locale, Locale::En);
        assert_eq!(toggled.current_job, state.current_job);
    }

    #[test]
    fn test_store_dispatch_notifies_subscribers() {
        let store = Store::default();
        let mut rx = store.subscribe();

        store.dispatch(Action::SetLocale(Locale::En));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().locale, Locale::En);

        // Same value again is not a change
        store.dispatch(Action::SetLocale(Locale::En));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_dispatch_for_job_checks_tracking() {
        let store = Store::new(tracking(9));

        assert!(!store.dispatch_for_job(JobId(7), Action::SetInventory(vec![])));
        assert!(store.dispatch_for_job(
            JobId(9),
            Action::SetJob(job(9, JobStatus::Processing, None))
        ));
        assert_eq!(
            store.snapshot().current_job.as_ref().map(|j| j.status),
            Some(JobStatus::Processing)
        );
    }

    // ========================================================================
    // Property-Based Tests
    // ========================================================================

    fn any_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Pending),
            Just(JobStatus::Processing),
            Just(JobStatus::Completed),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Random status snapshots for the tracked job, with results
        /// committed in between
        #[test]
        fn prop_tracked_job_is_monotonic(
            steps in prop::collection::vec((any_status(), any::<bool>()), 0..40)
        ) {
            let mut state = tracking(7);

            for (status, commit_result) in steps {
                let before_status = state.current_job.as_ref().map(|j| j.status);
                let before_result = state.last_result.clone();

                state = reduce(&state, Action::SetJob(job(7, status, None)));

                let after_status = state.current_job.as_ref().map(|j| j.status);
                prop_assert!(after_status >= before_status);
                prop_assert_eq!(&state.last_result, &before_result);

                if commit_result {
                    state = reduce(
                        &state,
                        Action::SetResult {
                            job_id: JobId(7),
                            result: result(&["A"]),
                        },
                    );
                    prop_assert_eq!(state.last_result.clone(), Some(result(&["A"])));
                    prop_assert!(!state.is_optimizing);
                }
            }
        }
    }
}

//! App actions
//!
//! Bundles the gateway, the Store and the job controller behind the
//! operations the screens call.

use std::sync::Arc;

use shared::{
    approved_skus, check_csv_header, verify_scan, Locale, ScanVerdict, UploadKind, UploadOutcome,
};

use crate::controller::{CompletedRun, JobController, Phase, PollSchedule, RunHandle};
use crate::error::ClientResult;
use crate::gateway::Gateway;
use crate::store::{Action, AppState, Store};

pub struct App {
    gateway: Arc<dyn Gateway>,
    store: Store,
    controller: JobController,
}

impl App {
    pub fn new(gateway: Arc<dyn Gateway>, schedule: PollSchedule, locale: Locale) -> Self {
        let store = Store::new(AppState::with_locale(locale));
        let controller = JobController::new(Arc::clone(&gateway), store.clone(), schedule);
        Self {
            gateway,
            store,
            controller,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Latest committed state
    pub fn state(&self) -> Arc<AppState> {
        self.store.snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub async fn fetch_schools(&self) -> ClientResult<()> {
        let schools = self.gateway.fetch_schools().await?;
        tracing::debug!("loaded {} school(s)", schools.len());
        self.store.dispatch(Action::SetSchools(schools));
        Ok(())
    }

    pub async fn fetch_inventory(&self) -> ClientResult<()> {
        let inventory = self.gateway.fetch_inventory().await?;
        tracing::debug!("loaded {} SKU(s)", inventory.len());
        self.store.dispatch(Action::SetInventory(inventory));
        Ok(())
    }

    /// Reload schools and inventory concurrently
    ///
    /// Each half commits on its own, so one failing does not hold back the
    /// other. The first error is returned.
    pub async fn refresh(&self) -> ClientResult<()> {
        let (schools, inventory) = tokio::join!(self.fetch_schools(), self.fetch_inventory());
        schools.and(inventory)
    }

    pub fn start_optimization(&self) -> ClientResult<RunHandle> {
        self.controller.start()
    }

    pub async fn run_optimization(&self) -> ClientResult<CompletedRun> {
        self.controller.run_to_completion().await
    }

    /// Stop the in-flight optimization, if any
    pub fn cancel_optimization(&self) {
        self.controller.dispose();
    }

    pub fn toggle_locale(&self) -> Locale {
        let next = self.store.snapshot().locale.toggle();
        self.store.dispatch(Action::SetLocale(next));
        next
    }

    /// Check the header, upload, then reload the table the upload touched
    ///
    /// Row-level errors come back in the outcome and do not skip the reload.
    pub async fn upload_csv(&self, kind: UploadKind, text: &str) -> ClientResult<UploadOutcome> {
        check_csv_header(kind, text)?;

        let outcome = self.gateway.upload_csv(kind, text).await?;
        tracing::info!(
            "{} upload: {} row(s) upserted, {} row error(s)",
            kind,
            outcome.upserted,
            outcome.errors.len()
        );

        match kind {
            UploadKind::Inventory => self.fetch_inventory().await?,
            UploadKind::Students => self.fetch_schools().await?,
        }
        Ok(outcome)
    }

    /// Check a scanned code against the current picking list
    ///
    /// `None` until a run has produced a picking list.
    pub fn verify_scan(&self, code: &str) -> Option<ScanVerdict> {
        let state = self.store.snapshot();
        let list = state.picking_list.as_ref()?;
        Some(verify_scan(&approved_skus(list), code))
    }
}

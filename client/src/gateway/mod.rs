//! Remote Data Gateway
//!
//! Typed request/response wrapper around the allocation API. No retries and
//! no caching: every call is one round trip and every failure is surfaced.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use shared::{InventoryItem, Job, JobCreated, JobId, PickingList, School, UploadKind, UploadOutcome};

use crate::error::ClientResult;

/// Allocation API operations
#[mockall::automock]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// GET /schools
    async fn fetch_schools(&self) -> ClientResult<Vec<School>>;

    /// GET /inventory
    async fn fetch_inventory(&self) -> ClientResult<Vec<InventoryItem>>;

    /// POST /optimize
    ///
    /// Starts a server-side job. Not idempotent: two calls create two jobs.
    async fn trigger_optimize(&self) -> ClientResult<JobCreated>;

    /// GET /jobs/{job_id}; safe to call repeatedly
    async fn fetch_job_status(&self, job_id: JobId) -> ClientResult<Job>;

    /// GET /picking/{job_id}; only valid once the job is COMPLETED
    async fn fetch_picking_list(&self, job_id: JobId) -> ClientResult<PickingList>;

    /// POST /upload/{kind}/text
    async fn upload_csv(&self, kind: UploadKind, csv_content: &str) -> ClientResult<UploadOutcome>;
}

use serde::Serialize;

use crate::scheduler::ingest_job::{IngestRunSummary, IngestState};

#[derive(Serialize)]
pub struct TriggerIngestResponse {
    pub success: bool,
    pub message: String,
    pub summary: IngestRunSummary,
}

#[derive(Serialize)]
pub struct IngestStatusResponse {
    pub job_name: &'static str,
    pub state: IngestState,
    pub last_run: Option<IngestRunSummary>,
}

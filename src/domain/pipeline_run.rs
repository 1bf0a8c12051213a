use serde::{Deserialize, Serialize};

/// The pipeline-run ledger row (spec §3). Upserted at the end of every
/// pipeline run, successful or not; the sole globally observed mutable
/// state outside the store (spec §9 "Global state").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub pipeline: String,
    pub last_run_ts: String,
    pub status: PipelineStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStatus {
    Ok,
    Error,
    NeverRun,
}

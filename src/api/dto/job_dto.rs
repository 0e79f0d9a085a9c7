//! DTOs for scheduler job endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::scheduler::JobDefinition;

/// Query for `GET /api/v1/jobs`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobQuery {
    /// Job name prefix; empty lists every job.
    #[serde(default)]
    pub q: String,
}

/// Jobs known to the external scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobListResponse {
    /// Matching jobs.
    pub data: Vec<JobDefinition>,
}

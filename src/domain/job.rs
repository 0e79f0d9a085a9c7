//! Scheduled job types and the callback envelope exchanged with the
//! external scheduler.
//!
//! The scheduler knows nothing about recurring payments. It stores a job
//! under a name, fires an HTTP callback carrying a [`JobEnvelope`], and the
//! execution endpoint turns that envelope back into a typed
//! [`ScheduledTask`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::RegularPaymentId;
use crate::error::GatewayError;

/// Closed set of job kinds this service schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobType {
    /// Materialize one recurring payment into an expense.
    RegularPaymentApply,
}

impl JobType {
    /// Wire tag, also used as the job name prefix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RegularPaymentApply => "regular-payment-apply",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular-payment-apply" => Ok(Self::RegularPaymentApply),
            other => Err(GatewayError::UnknownJobType(other.to_string())),
        }
    }
}

/// Body the scheduler posts back to `POST /jobs/execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobEnvelope {
    /// Job type tag, e.g. `"regular-payment-apply"`.
    pub job_type: String,
    /// Name the job is registered under.
    pub job_name: String,
    /// Type-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Payload of a [`JobType::RegularPaymentApply`] job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegularPaymentApplyPayload {
    /// Payment to materialize.
    pub regular_payment_id: RegularPaymentId,
}

/// A decoded, typed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Materialize the given recurring payment.
    RegularPaymentApply {
        /// Payment to materialize.
        regular_payment_id: RegularPaymentId,
    },
}

impl ScheduledTask {
    /// Job type of this task.
    #[must_use]
    pub const fn job_type(&self) -> JobType {
        match self {
            Self::RegularPaymentApply { .. } => JobType::RegularPaymentApply,
        }
    }

    /// Deterministic job name: `"{job_type}-{target_id}"`.
    ///
    /// Upserting by this name keeps at most one job per target.
    #[must_use]
    pub fn job_name(&self) -> String {
        match self {
            Self::RegularPaymentApply { regular_payment_id } => {
                regular_payment_job_name(*regular_payment_id)
            }
        }
    }

    /// Encodes the task as a callback envelope.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the payload cannot be encoded.
    pub fn to_envelope(&self) -> Result<JobEnvelope, GatewayError> {
        let payload = match self {
            Self::RegularPaymentApply { regular_payment_id } => {
                serde_json::to_value(RegularPaymentApplyPayload {
                    regular_payment_id: *regular_payment_id,
                })
            }
        }
        .map_err(|e| GatewayError::Internal(format!("cannot encode job payload: {e}")))?;

        Ok(JobEnvelope {
            job_type: self.job_type().to_string(),
            job_name: self.job_name(),
            payload,
        })
    }

    /// Decodes a callback envelope.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownJobType`] for an unrecognized
    /// `jobType` and [`GatewayError::InvalidRequest`] if the payload does
    /// not match the job type.
    pub fn from_envelope(envelope: &JobEnvelope) -> Result<Self, GatewayError> {
        match envelope.job_type.parse::<JobType>()? {
            JobType::RegularPaymentApply => {
                let payload: RegularPaymentApplyPayload =
                    serde_json::from_value(envelope.payload.clone()).map_err(|e| {
                        GatewayError::InvalidRequest(format!(
                            "invalid {} payload: {e}",
                            JobType::RegularPaymentApply
                        ))
                    })?;
                Ok(Self::RegularPaymentApply {
                    regular_payment_id: payload.regular_payment_id,
                })
            }
        }
    }
}

/// Name of the apply job for a recurring payment.
#[must_use]
pub fn regular_payment_job_name(id: RegularPaymentId) -> String {
    format!("{}-{id}", JobType::RegularPaymentApply)
}

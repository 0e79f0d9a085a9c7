//! In-process first-of-month sweep.
//!
//! Materializes every recurring payment at once on the first day of each
//! month, independent of the per-payment scheduler jobs. Disabled unless
//! `SWEEP_ENABLED=true`.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use tokio::task::JoinHandle;

use crate::error::GatewayError;
use crate::service::RegularPaymentService;

/// Background task applying all recurring payments monthly.
#[derive(Debug, Clone)]
pub struct MonthlySweep {
    payments: RegularPaymentService,
}

impl MonthlySweep {
    /// Creates a sweep over `payments`.
    #[must_use]
    pub const fn new(payments: RegularPaymentService) -> Self {
        Self { payments }
    }

    /// Spawns the sweep loop on the current runtime.
    ///
    /// The loop sleeps until the next first-of-month midnight UTC, runs
    /// [`Self::run_once`], and repeats until the task is aborted.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next = next_first_of_month(now);
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                tracing::info!(next_run = %next, "monthly sweep scheduled");
                tokio::time::sleep(wait).await;

                // Failure is already logged; the next month retries.
                let _ = self.run_once().await;
            }
        })
    }

    /// Runs one sweep and returns the number of expenses created.
    ///
    /// # Errors
    ///
    /// Returns the store error that aborted the batch. The failure is
    /// logged here once.
    pub async fn run_once(&self) -> Result<u64, GatewayError> {
        match self.payments.apply_regular_payments().await {
            Ok(created) => {
                tracing::info!(created, "monthly sweep applied regular payments");
                Ok(created)
            }
            Err(err) => {
                tracing::error!(error = %err, "monthly sweep failed");
                Err(err)
            }
        }
    }
}

/// Returns midnight UTC of the first day of the month after `now`.
#[must_use]
pub fn next_first_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(now, |naive| Utc.from_utc_datetime(&naive))
}

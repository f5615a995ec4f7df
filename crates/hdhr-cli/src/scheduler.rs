//! Daily scheduling.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone};
use hdhr_api::HdhrClient;

use crate::config::RunSettings;
use crate::runner::run_and_evict;

/// `date` at `hour:00` in `tz`. An hour skipped by a DST jump resolves to
/// the following hour.
fn at_hour<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    tz.from_local_datetime(&naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}

/// Next run instant: today at `hour:00` if not yet past, else tomorrow.
///
/// # Errors
///
/// Returns an error if `hour` is not a valid hour or the date overflows.
pub fn next_run_at<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> Result<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();

    if let Some(candidate) = at_hour(&tz, today, hour).filter(|c| c >= now) {
        return Ok(candidate);
    }
    let tomorrow = today.succ_opt().context("date overflow")?;
    at_hour(&tz, tomorrow, hour).with_context(|| format!("invalid run hour: {hour}"))
}

/// Loops forever: sleep until `hour`, run, evict. Run errors are logged.
///
/// # Errors
///
/// Returns an error only if the next run time cannot be computed.
pub async fn run_daily(settings: &RunSettings, client: &HdhrClient, hour: u32) -> Result<()> {
    loop {
        let now = Local::now();
        let next = next_run_at(&now, hour)?;
        let wait = next.signed_duration_since(now).to_std().unwrap_or_default();
        tracing::info!(next_run = %next, wait_secs = wait.as_secs(), "Sleeping until next run");
        tokio::time::sleep(wait).await;

        if let Err(e) = run_and_evict(settings, client).await {
            tracing::error!(error = %format!("{e:#}"), "Run failed, waiting for next run");
        }
    }
}

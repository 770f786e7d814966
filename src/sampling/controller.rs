use anyhow::{bail, Context, Result};
use log::info;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::loop_worker::{sampling_loop, TickHandler};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerStatus {
    Idle,
    Running,
}

/// Periodic driver with at most one cycle in flight.
///
/// `stop` cancels the timer and the in-flight tick together; once it returns
/// the loop task has exited and nothing more will be applied.
pub struct SampleScheduler {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SampleScheduler {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        match &self.handle {
            Some(handle) if !handle.is_finished() => SchedulerStatus::Running,
            _ => SchedulerStatus::Idle,
        }
    }

    pub fn start<H: TickHandler>(&mut self, period: Duration, handler: H) -> Result<()> {
        if self.status() == SchedulerStatus::Running {
            bail!("sampling already active");
        }
        if period.is_zero() {
            bail!("sample period must be greater than zero");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(handler, period, cancel_token.clone()));

        info!("Sampling started every {}ms", period.as_millis());
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for SampleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SampleScheduler {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}

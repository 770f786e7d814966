use async_trait::async_trait;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "studysync::sampling";

use crate::{log_debug, log_info, log_warn};

/// Work done once per tick.
///
/// `run` is the part that may suspend (capture, network). `apply` is the
/// synchronous commit and is only called when the loop is still live after
/// `run` finished, so a stopped session never sees a late result.
#[async_trait]
pub trait TickHandler: Send + 'static {
    type Output: Send;

    /// `None` means nothing to apply this tick (e.g. no frame).
    async fn run(&mut self) -> Option<Self::Output>;

    fn apply(&mut self, output: Self::Output);
}

pub(crate) async fn sampling_loop<H: TickHandler>(
    mut handler: H,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_completed: Option<Instant> = None;
    let mut ticks: u64 = 0;

    loop {
        let scheduled = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            scheduled = ticker.tick() => scheduled,
        };
        ticks = ticks.wrapping_add(1);

        // The deadline passed while the previous cycle was still in flight:
        // drop this tick instead of queueing it behind the slow one.
        if last_completed.is_some_and(|done| scheduled < done) {
            log_warn!("tick {ticks} skipped: previous cycle overran the {}ms period", period.as_millis());
            continue;
        }

        let started = Instant::now();
        let output = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_debug!("tick {ticks} discarded: sampling stopped mid-cycle");
                break;
            }
            output = handler.run() => output,
        };
        last_completed = Some(Instant::now());

        if cancel_token.is_cancelled() {
            log_debug!("tick {ticks} discarded: sampling stopped before commit");
            break;
        }

        match output {
            Some(output) => {
                handler.apply(output);
                log_debug!("tick {ticks} applied in {}ms", started.elapsed().as_millis());
            }
            None => log_debug!("tick {ticks}: nothing to apply"),
        }
    }

    log_info!("sampling loop shutting down after {ticks} ticks");
}

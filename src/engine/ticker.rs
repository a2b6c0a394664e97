//! Periodic tick source for the timer engine.
//!
//! Ticks are derived from a monotonic anchor chosen by the caller when the
//! source is armed: each tick reports the whole seconds elapsed since the
//! previous report, so a late or skipped tick never loses or double-counts
//! time. An anchor in the past makes the first report come early.

use std::ops::ControlFlow;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Nominal period between ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Spawns a repeating tick loop on `runtime`, counting from `anchor`.
///
/// `on_tick` receives the whole seconds elapsed since the last call (never
/// zero) and returns `ControlFlow::Break` to stop the loop. Aborting the
/// returned handle cancels the loop at its next await point.
pub fn spawn<F>(runtime: &Handle, anchor: Instant, period: Duration, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut(u32) -> ControlFlow<()> + Send + 'static,
{
    runtime.spawn(async move {
        let mut ticker = interval_at(anchor + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut reported: u64 = 0;
        loop {
            ticker.tick().await;

            let whole = anchor.elapsed().as_secs();
            let delta = whole.saturating_sub(reported);
            if delta == 0 {
                continue;
            }
            reported = whole;

            let delta = u32::try_from(delta).unwrap_or(u32::MAX);
            if on_tick(delta).is_break() {
                break;
            }
        }
    })
}

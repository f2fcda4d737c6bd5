// Author: Dustin Pilgrim
// License: MIT

use crate::core::manager_msg::ManagerMsg;

use tokio::sync::mpsc::Sender;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Display-refresh ticker. Runs only while the timer is active; the timer
/// loop aborts it on every transition out of `Active`.
pub async fn run_ticker(tx: Sender<ManagerMsg>, period: Duration) {
    tracing::debug!("ticker started ({} ms)", period.as_millis());

    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;

        // If the timer loop is gone, stop.
        if tx.send(ManagerMsg::Tick).await.is_err() {
            tracing::debug!("ticker stopping (receiver dropped)");
            break;
        }
    }
}

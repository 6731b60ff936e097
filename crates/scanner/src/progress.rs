use std::time::Duration;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle, time};

use crate::controller::FlowSignal;

/// Periodic tick source for the progress simulation.
///
/// Ticks are tagged with the epoch they were started for. Dropping the timer
/// aborts the task, so no tick is produced after the owner lets go of it.
pub struct ProgressTimer {
    handle: JoinHandle<()>,
}

impl ProgressTimer {
    pub fn start(interval: Duration, epoch: u64, signals: UnboundedSender<FlowSignal>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                if signals.send(FlowSignal::Tick { epoch }).is_err() {
                    break;
                }
            }
        });

        Self { handle }
    }
}

impl Drop for ProgressTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

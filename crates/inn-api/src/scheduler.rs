//! Background auto-checkout sweep.

use inn_core::BookingService;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Run the auto-checkout sweep every `every`, starting immediately.
pub fn spawn_sweeper(service: BookingService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match service.run_auto_checkout_sweep().await {
                Ok(report) if report.failures.is_empty() => {
                    info!(
                        checked_out = report.checked_out,
                        rooms_freed = report.rooms_freed,
                        "auto-checkout sweep finished"
                    );
                }
                Ok(report) => {
                    warn!(
                        checked_out = report.checked_out,
                        rooms_freed = report.rooms_freed,
                        failures = report.failures.len(),
                        "auto-checkout sweep finished with failures"
                    );
                }
                Err(e) => error!(error = %e, "auto-checkout sweep failed"),
            }
        }
    })
}

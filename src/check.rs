//! Headless check: drive the controller against one URL without a screen.
//!
//! Submits, then waits for either a host outcome or the watchdog, whichever
//! the channel delivers first.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use crate::activity::LogEntry;
use crate::embed::{EmbedController, Phase};
use crate::host::{EmbedHost, HostEvent};

/// Run one check to a stable phase and return it.
pub fn run(
    controller: &mut EmbedController,
    host: &mut impl EmbedHost,
    events: &Receiver<HostEvent>,
    url: &str,
) -> Phase {
    controller.set_input(url);
    let Some(request) = controller.submit(Instant::now()) else {
        return controller.state().phase();
    };
    host.load(request);

    while let Some(deadline) = controller.deadline() {
        let wait = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(wait) {
            Ok(event) => controller.apply(&event),
            Err(RecvTimeoutError::Timeout) => {
                controller.tick(Instant::now());
            }
            Err(RecvTimeoutError::Disconnected) => {
                // No outcome can arrive any more; only the watchdog is left.
                thread::sleep(wait);
                controller.tick(Instant::now());
            }
        }
    }

    controller.state().phase()
}

/// One plain-text log line: `[12:00:00] [SUCCESS] message`.
pub fn format_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] [{}] {}",
        entry.timestamp,
        entry.severity.label(),
        entry.message
    )
}

//! Serial console transport.
//!
//! Feeds newline-terminated messages (`INFO&...`, `CMD&...`) from a byte
//! stream into the [`Intake`].  On the board the stream is the UART0
//! stdin; on the host any `BufRead` works.  Lines longer than
//! [`MAX_LINE_LEN`] are discarded whole.

use std::io::BufRead;

use futures_lite::future::block_on;
use log::{info, warn};

use crate::app::intake::{Intake, Routed};
use crate::app::ports::StoragePort;

pub const MAX_LINE_LEN: usize = 256;

/// Outcome counters for one console session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleStats {
    pub routed: usize,
    pub rejected: usize,
    pub dropped: usize,
}

/// Pump lines from `reader` into `intake` until end of stream.
pub fn run_console<R: BufRead, S: StoragePort>(
    mut reader: R,
    intake: &mut Intake<'_, S>,
) -> ConsoleStats {
    let mut stats = ConsoleStats::default();
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Console: read failed: {}", e);
                break;
            }
        }

        let msg = line.trim_end_matches(['\r', '\n']);
        if msg.is_empty() {
            continue;
        }
        if msg.len() > MAX_LINE_LEN {
            warn!("Console: {} byte line discarded", msg.len());
            stats.rejected += 1;
            continue;
        }

        match block_on(intake.handle(msg)) {
            Ok(Routed::FirmwareUpdate(host)) => {
                warn!("Console: firmware update from {} not available over serial", host);
                stats.routed += 1;
            }
            Ok(Routed::Settings { delivered, .. } | Routed::Command { delivered, .. }) => {
                if delivered {
                    stats.routed += 1;
                } else {
                    stats.dropped += 1;
                }
            }
            Err(e) => {
                warn!("Console: rejected '{}': {}", msg, e);
                stats.rejected += 1;
            }
        }
    }
    info!(
        "Console: stream closed ({} routed, {} rejected, {} dropped)",
        stats.routed, stats.rejected, stats.dropped
    );
    stats
}

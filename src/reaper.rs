//! Expiry Reaper
//!
//! Expired leases are already invisible to every read; the reaper reclaims
//! their memory on a fixed interval.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, select, tick, Sender};

use crate::engine::Engine;
use crate::error::Result;

/// Background thread purging expired records
///
/// Stops when `stop()` is called or the handle is dropped.
pub struct Reaper {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Start sweeping `engine` every `interval`
    pub fn start(engine: Arc<Engine>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let ticker = tick(interval);

        let handle = thread::Builder::new()
            .name("chanlease-reaper".to_string())
            .spawn(move || loop {
                select! {
                    recv(ticker) -> _ => {
                        let purged = engine.purge_expired();
                        if purged > 0 {
                            tracing::debug!(purged, "Evicted expired leases");
                        }
                    }
                    // Fires on disconnect as well as on an explicit send
                    recv(stop_rx) -> _ => break,
                }
            })?;

        tracing::debug!(interval_ms = interval.as_millis() as u64, "Reaper started");

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the reaper and wait for its thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Reaper thread panicked");
            }
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

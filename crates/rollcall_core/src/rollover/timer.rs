//! Periodic driver for rollover checks.

use log::{info, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const THREAD_NAME: &str = "rollcall-rollover";

/// Background timer invoking a callback every interval until stopped.
///
/// Dropping the timer stops it.
#[derive(Debug)]
pub struct RolloverTimer {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RolloverTimer {
    /// Starts ticking every `interval`; the first call happens after one
    /// full interval.
    pub fn start<F>(interval: Duration, mut on_tick: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => on_tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        info!(
            "event=rollover_timer module=rollover status=ok action=start interval_ms={}",
            interval.as_millis()
        );
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the timer and waits for an in-flight tick to finish.
    ///
    /// Calling `stop` more than once is a no-op.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("event=rollover_timer module=rollover status=error action=stop reason=tick_panicked");
                return;
            }
            info!("event=rollover_timer module=rollover status=ok action=stop");
        }
    }
}

impl Drop for RolloverTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

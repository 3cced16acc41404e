use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use ponto_core::DisplayClock;
use tracing::debug;

use crate::AppError;

/// Display clock shared between the controller and the ticker thread.
pub type SharedClock = Arc<Mutex<DisplayClock>>;

enum TickerCommand {
    Stop,
}

struct TickerRuntime {
    command_tx: Sender<TickerCommand>,
    join: JoinHandle<()>,
}

/// Background task advancing a [`SharedClock`] by one second per interval.
///
/// The worker blocks on its command channel with the tick interval as
/// timeout, so [`Ticker::stop`] returns without waiting for the next tick.
/// Dropping a running ticker stops it.
pub struct Ticker {
    clock: SharedClock,
    interval: Duration,
    runtime: Option<TickerRuntime>,
}

impl Ticker {
    /// Creates a stopped ticker.
    pub fn new(clock: SharedClock, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            runtime: None,
        }
    }

    /// Returns `true` while the worker thread is running.
    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Spawns the worker. Starting a running ticker is a no-op.
    ///
    /// # Errors
    /// Returns [`AppError::TickerSpawn`] when the thread cannot be created.
    pub fn start(&mut self) -> Result<(), AppError> {
        if self.runtime.is_some() {
            return Ok(());
        }

        let (command_tx, command_rx) = mpsc::channel::<TickerCommand>();
        let clock = Arc::clone(&self.clock);
        let interval = self.interval;

        let join = std::thread::Builder::new()
            .name("ponto-clock-ticker".to_string())
            .spawn(move || {
                loop {
                    match command_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            clock.lock().unwrap_or_else(PoisonError::into_inner).tick();
                        }
                        Ok(TickerCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(AppError::TickerSpawn)?;

        self.runtime = Some(TickerRuntime { command_tx, join });
        debug!(interval_ms = interval.as_millis() as u64, "ticker started");
        Ok(())
    }

    /// Stops the worker and joins it. Stopping a stopped ticker is a no-op.
    pub fn stop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = runtime.command_tx.send(TickerCommand::Stop);
            let _ = runtime.join.join();
            debug!("ticker stopped");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for ticker lifecycle.

    use chrono::NaiveDate;

    use super::*;

    fn shared_clock() -> SharedClock {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1)
            .and_then(|date| date.and_hms_opt(10, 30, 0))
            .expect("valid fixture time");
        Arc::new(Mutex::new(DisplayClock::new(start)))
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut ticker = Ticker::new(shared_clock(), Duration::from_secs(60));
        ticker.start().expect("ticker should start");
        ticker.start().expect("second start is a no-op");
        assert!(ticker.is_running());

        ticker.stop();
        ticker.stop();
        assert!(!ticker.is_running());
    }

    #[test]
    fn stop_does_not_wait_for_the_next_tick() {
        let clock = shared_clock();
        let before = clock.lock().expect("clock lock").now();
        let mut ticker = Ticker::new(Arc::clone(&clock), Duration::from_secs(3_600));
        ticker.start().expect("ticker should start");

        let started = std::time::Instant::now();
        ticker.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(clock.lock().expect("clock lock").now(), before);
    }
}

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel as channel;
use crossbeam_channel::RecvTimeoutError;
use tracing::debug;

use crate::collector::SampleCollector;
use crate::config::{AdaptationConfig, ConfigError};
use crate::estimator::Estimator;

/// The running adaptation engine: a sample collector shared with the
/// transport plus a background thread that drains it once per tick, runs the
/// estimator and hands `(vector, reference_throughput)` to the callback.
///
/// The callback runs on the estimator thread, once per completed tick, never
/// concurrently with itself. A callback that blocks stalls future ticks.
/// Dropping the engine (or calling [`shutdown`](Self::shutdown)) wakes the
/// end-of-tick wait immediately and joins the thread before returning, so no
/// notification fires after teardown completes.
pub struct ThroughputAdaptation {
    collector: Arc<SampleCollector>,
    stop_tx: Option<channel::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ThroughputAdaptation {
    /// Validate `config` and start the estimation thread.
    pub fn spawn<F>(config: AdaptationConfig, mut callback: F) -> Result<Self, ConfigError>
    where
        F: FnMut(f64, f64) + Send + 'static,
    {
        config.validate()?;

        let collector = Arc::new(SampleCollector::new());
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);

        let loop_collector = Arc::clone(&collector);
        let thread = thread::spawn(move || {
            let mut estimator = Estimator::new(&config);
            let mut prev = Instant::now();
            loop {
                let tick_start = Instant::now();
                let elapsed = tick_start - prev;
                prev = tick_start;

                // Independent drains: a sample racing one of them lands in
                // this tick or the next, never partially
                let sent = loop_collector.drain_sent();
                let occupancy = loop_collector.drain_occupancy();
                let total_sent: u64 = sent.iter().sum();

                let out = estimator.tick(total_sent, &occupancy, elapsed, tick_start);
                debug!(
                    total_sent,
                    occupancy_samples = occupancy.len(),
                    detected = out.detected,
                    average = out.average,
                    vector = out.vector,
                    reference = out.reference,
                    "estimation tick"
                );
                callback(out.vector, out.reference);

                // Sleep out the remainder of the period; a dropped sender
                // disconnects the channel and wakes us for shutdown
                match stop_rx.recv_deadline(tick_start + config.tick_period) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
        });

        Ok(Self {
            collector,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Recording surface for transport-side producers. Cheap to clone and
    /// safe to call from any thread.
    pub fn collector(&self) -> Arc<SampleCollector> {
        Arc::clone(&self.collector)
    }

    /// Record bytes handed to the transport since the last call.
    pub fn record_sent(&self, bytes: u64) {
        self.collector.record_sent(bytes);
    }

    /// Record an observation of the transport's pending-send buffer size.
    pub fn record_buffer_occupancy(&self, size: u64) {
        self.collector.record_buffer_occupancy(size);
    }

    /// Stop the estimation thread and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Dropping the sender wakes the timed wait without a full period
        drop(self.stop_tx.take());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ThroughputAdaptation {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn fast_config() -> AdaptationConfig {
        AdaptationConfig {
            tick_period: Duration::from_millis(20),
            ..Default::default()
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = AdaptationConfig { window: 0, ..Default::default() };
        assert!(ThroughputAdaptation::spawn(cfg, |_, _| {}).is_err());
    }

    #[test]
    fn callback_fires_once_per_tick_with_bounded_values() {
        let (tx, rx) = channel::unbounded();
        let engine = ThroughputAdaptation::spawn(fast_config(), move |vector, reference| {
            let _ = tx.send((vector, reference));
        })
        .unwrap();

        engine.record_sent(10_000);
        engine.record_buffer_occupancy(500);
        engine.record_buffer_occupancy(100);

        for _ in 0..3 {
            let (vector, reference) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert!((-1.0..=1.0).contains(&vector), "vector {vector}");
            assert!(reference >= 0.0);
        }
        engine.shutdown();
    }

    #[test]
    fn no_callback_after_shutdown_returns() {
        let (tx, rx) = channel::unbounded();
        let engine = ThroughputAdaptation::spawn(fast_config(), move |vector, reference| {
            let _ = tx.send((vector, reference));
        })
        .unwrap();

        // At least one tick has happened
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        engine.shutdown();

        let drained = rx.try_iter().count();
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(rx.try_iter().count(), 0, "tick fired after shutdown (saw {drained} before)");
    }

    #[test]
    fn shutdown_interrupts_a_long_wait() {
        let cfg = AdaptationConfig {
            tick_period: Duration::from_secs(60),
            ..Default::default()
        };
        let engine = ThroughputAdaptation::spawn(cfg, |_, _| {}).unwrap();
        // Let the first tick complete and the loop settle into its wait
        std::thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        engine.shutdown();
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "shutdown waited out the period: {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn concurrent_producers_run_clean_against_the_loop() {
        let (tx, rx) = channel::unbounded();
        let engine = ThroughputAdaptation::spawn(fast_config(), move |vector, _| {
            let _ = tx.send(vector);
        })
        .unwrap();

        let mut producers = Vec::new();
        for p in 0..4u64 {
            let collector = engine.collector();
            producers.push(std::thread::spawn(move || {
                for i in 0..500u64 {
                    collector.record_sent(100 + p);
                    if i % 5 == 0 {
                        collector.record_buffer_occupancy(i % 300);
                    }
                }
            }));
        }
        for p in producers {
            p.join().unwrap();
        }

        for _ in 0..3 {
            let vector = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert!((-1.0..=1.0).contains(&vector));
        }
        engine.shutdown();
    }
}

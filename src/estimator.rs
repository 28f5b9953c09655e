use std::f64::consts::FRAC_PI_2;
use std::time::{Duration, Instant};

use crate::config::AdaptationConfig;
use crate::filter::{BandwidthFilter, TurnWindow};

/// Result of one estimation tick.
#[derive(Clone, Copy, Debug)]
pub struct TickOutput {
    /// Adaptation vector in [-1, 1]: positive means headroom to raise the
    /// bitrate, negative means congestion, magnitude is confidence.
    pub vector: f64,
    /// Reference throughput (bytes/sec): the mean of recent turn samples, or
    /// 0 before any turnaround has been observed.
    pub reference: f64,
    /// Instantaneous throughput detected this tick (bytes/sec).
    pub detected: f64,
    /// Weighted moving average of detected throughput (bytes/sec).
    pub average: f64,
}

/// The per-tick estimation core, free of threads and clock reads.
///
/// Turn detection works off the tick's buffer-occupancy batch: a fully
/// drained buffer signals headroom (rate-limited by the turndown cooldown),
/// a growing buffer signals congestion and arms the cooldown. Throughput
/// readings taken at turnarounds feed [`TurnWindow`]; their mean normalizes
/// the deviation of the instantaneous reading from the long-window average,
/// and `atan(3a^2) / (pi/2)` maps that deviation into a confidence magnitude
/// clamped to [0.1, 1.0]. Degenerate arithmetic (zero elapsed time, huge
/// deviations) saturates through the clamp rather than erroring.
pub struct Estimator {
    filter: BandwidthFilter,
    turns: TurnWindow,
    previous_vector: f64,
    previous_turndown: Option<Instant>,
    turndown_cooldown: Duration,
}

impl Estimator {
    pub fn new(config: &AdaptationConfig) -> Self {
        Self {
            filter: BandwidthFilter::new(config.window, config.decay_weight),
            turns: TurnWindow::new(config.turn_capacity),
            previous_vector: 0.0,
            previous_turndown: None,
            turndown_cooldown: config.turndown_cooldown,
        }
    }

    /// Run one tick over the drained batches.
    ///
    /// `total_sent` is the sum of sent-bytes samples for the period,
    /// `occupancy` the period's buffer observations in arrival order,
    /// `elapsed` the wall-clock time since the previous tick and `now` the
    /// tick's timestamp (used for the turndown cooldown).
    pub fn tick(
        &mut self,
        total_sent: u64,
        occupancy: &[u64],
        elapsed: Duration,
        now: Instant,
    ) -> TickOutput {
        // A degenerate elapsed time right after startup yields an extreme
        // reading; the moving average absorbs it within a few ticks.
        let detected = total_sent as f64 / elapsed.as_secs_f64();

        self.filter.push(detected);
        let average = self.filter.average();

        let mut vector = 0.0;
        let mut reference = 0.0;

        if let (Some(&first), Some(&last)) = (occupancy.first(), occupancy.last()) {
            let buffer_delta = last as i64 - first as i64;

            let cooldown_over = self
                .previous_turndown
                .map_or(true, |t| now.duration_since(t) > self.turndown_cooldown);
            if last == 0 && cooldown_over {
                // Buffer fully drained and no recent turndown: push up
                vector = 1.0;
            } else if last > first {
                // Buffer growing: back off and arm the cooldown
                vector = -1.0;
                self.previous_turndown = Some(now);
            }

            // Transition out of a growing-buffer state
            if self.previous_vector < 0.0 && vector >= 0.0 {
                self.turns.push(detected);
            }
            // Buffer shrank this tick but is not yet empty
            if buffer_delta < 0 && last > 0 {
                self.turns.push(detected);
            }

            if let Some(turn_avg) = self.turns.mean() {
                reference = turn_avg;
                let a = (detected - average) / turn_avg;
                let slope = 3.0 * a * a;
                // max/min rather than clamp so a NaN ratio lands on the floor
                vector *= (slope.atan() / FRAC_PI_2).max(0.1).min(1.0);
            }

            self.previous_vector = vector;
        }

        TickOutput {
            vector,
            reference,
            detected,
            average,
        }
    }

    #[cfg(test)]
    pub(crate) fn history_len(&self) -> usize {
        self.filter.len()
    }

    #[cfg(test)]
    pub(crate) fn turn_len(&self) -> usize {
        self.turns.len()
    }
}

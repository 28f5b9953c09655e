use std::collections::VecDeque;

/// Weighted moving average over the most recent throughput readings.
///
/// Weights are geometric with the configured decay ratio and normalized so the
/// full window sums to 1: `w[i] = r^i / Σ_{k<N} r^k`, index 0 being the newest
/// sample. While the window is still filling only the leading weights apply,
/// biasing the average toward what has actually been observed.
pub struct BandwidthFilter {
    samples: VecDeque<f64>,
    weights: Vec<f64>,
}

impl BandwidthFilter {
    pub fn new(window: usize, decay: f64) -> Self {
        // Closed form of the geometric series sum
        let norm = (1.0 - decay.powi(window as i32)) / (1.0 - decay);
        let weights = (0..window).map(|i| decay.powi(i as i32) / norm).collect();
        Self {
            samples: VecDeque::with_capacity(window),
            weights,
        }
    }

    /// Push this tick's detected throughput, evicting the oldest reading once
    /// the window is full.
    pub fn push(&mut self, bytes_per_sec: f64) {
        self.samples.push_front(bytes_per_sec);
        if self.samples.len() > self.weights.len() {
            self.samples.pop_back();
        }
    }

    pub fn average(&self) -> f64 {
        self.samples
            .iter()
            .zip(&self.weights)
            .map(|(s, w)| s * w)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Throughput readings captured at detected buffer turnarounds.
///
/// Their plain mean is the localized reference throughput reported alongside
/// the adaptation vector, distinct from the long-window average above.
pub struct TurnWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl TurnWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, bytes_per_sec: f64) {
        self.samples.push_front(bytes_per_sec);
        if self.samples.len() > self.capacity {
            self.samples.pop_back();
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_for_any_window() {
        for window in [1, 2, 5, 30, 64] {
            let f = BandwidthFilter::new(window, 0.75);
            let sum: f64 = f.weights().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "window {window}: sum {sum}");
        }
    }

    #[test]
    fn weights_decay_monotonically() {
        let f = BandwidthFilter::new(30, 0.75);
        for pair in f.weights().windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn average_of_constant_input_stays_below_constant_until_full() {
        let mut f = BandwidthFilter::new(30, 0.75);
        f.push(1000.0);
        // One sample: only the first weight applies, no renormalization
        let one = f.average();
        assert!(one < 1000.0);
        for _ in 0..29 {
            f.push(1000.0);
        }
        assert!((f.average() - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn filter_never_exceeds_window() {
        let mut f = BandwidthFilter::new(30, 0.75);
        for i in 0..100 {
            f.push(i as f64);
        }
        assert_eq!(f.len(), 30);
    }

    #[test]
    fn recent_samples_dominate_average() {
        let mut f = BandwidthFilter::new(30, 0.75);
        for _ in 0..30 {
            f.push(100.0);
        }
        f.push(1000.0);
        // Newest weight is 0.25-ish, so one spike moves the average well up
        assert!(f.average() > 300.0);
    }

    #[test]
    fn turn_window_mean_and_cap() {
        let mut t = TurnWindow::new(5);
        assert_eq!(t.mean(), None);
        for v in [10.0, 20.0, 30.0] {
            t.push(v);
        }
        assert_eq!(t.mean(), Some(20.0));
        for v in [40.0, 50.0, 60.0, 70.0] {
            t.push(v);
        }
        assert_eq!(t.len(), 5);
        // Oldest (10, 20) evicted
        assert_eq!(t.mean(), Some(50.0));
    }
}

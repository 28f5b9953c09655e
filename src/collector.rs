use std::sync::Mutex;

/// Append-only accumulators fed by the transport between estimation ticks.
///
/// Sent-bytes and buffer-occupancy samples are unrelated observables recorded
/// at different cadences, so each gets its own lock; producers on one never
/// contend with producers on the other. The estimator drains each buffer
/// independently once per tick — a sample recorded concurrently with a drain
/// lands in either that tick or the next, which is fine for best-effort
/// sampling.
pub struct SampleCollector {
    sent: Mutex<Vec<u64>>,
    occupancy: Mutex<Vec<u64>>,
}

impl SampleCollector {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            occupancy: Mutex::new(Vec::new()),
        }
    }

    /// Record bytes successfully handed to the transport since the last call.
    pub fn record_sent(&self, bytes: u64) {
        self.sent.lock().unwrap().push(bytes);
    }

    /// Record an observation of the transport's pending-send buffer size.
    pub fn record_buffer_occupancy(&self, size: u64) {
        self.occupancy.lock().unwrap().push(size);
    }

    /// Take the pending sent-bytes batch, leaving an empty buffer.
    pub fn drain_sent(&self) -> Vec<u64> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// Take the pending occupancy batch, leaving an empty buffer.
    pub fn drain_occupancy(&self) -> Vec<u64> {
        std::mem::take(&mut *self.occupancy.lock().unwrap())
    }
}

impl Default for SampleCollector {
    fn default() -> Self {
        Self::new()
    }
}

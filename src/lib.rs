//! Adaptive-bitrate decision engine for a live-streaming pipeline.
//!
//! The transport layer feeds two raw counters — bytes handed to the socket
//! and pending-send buffer occupancy — and once per tick the engine emits a
//! signed, bounded adaptation vector plus a reference throughput. Positive
//! vector means spare capacity, negative means congestion, magnitude is
//! confidence. The encoder side consumes the signal to raise or lower the
//! stream bitrate; this crate performs no network I/O itself.
//!
//! ```no_run
//! use txadapt::{AdaptationConfig, ThroughputAdaptation};
//!
//! let engine = ThroughputAdaptation::spawn(AdaptationConfig::default(), |vector, reference| {
//!     println!("vector {vector:+.2}, reference {reference:.0} B/s");
//! })?;
//!
//! // Transport side, from any thread:
//! engine.record_sent(16_384);
//! engine.record_buffer_occupancy(2_048);
//! # Ok::<(), txadapt::ConfigError>(())
//! ```

#![forbid(unsafe_code)]

mod collector;
mod config;
mod engine;
mod estimator;
mod filter;

pub use collector::SampleCollector;
pub use config::{AdaptationConfig, ConfigError};
pub use engine::ThroughputAdaptation;
pub use estimator::{Estimator, TickOutput};
pub use filter::{BandwidthFilter, TurnWindow};

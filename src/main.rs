mod cli;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use txadapt::{AdaptationConfig, ThroughputAdaptation};

use crate::cli::{Cli, Commands, OutputFormat, Run};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let result: Result<()> = match cli.command {
        Some(Commands::Run(run)) => run_demo(run),
        None => {
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn run_demo(run: Run) -> Result<()> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    {
        let stop = stop_flag.clone();
        let _ = ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
        });
    }

    let config = AdaptationConfig {
        tick_period: Duration::from_millis(run.period_ms),
        ..Default::default()
    };
    info!(
        period_ms = run.period_ms,
        capacity = run.capacity,
        target = run.target,
        "Starting txadapt demo"
    );

    let format = run.format;
    let max_ticks = run.ticks;
    let stop_on_done = stop_flag.clone();
    let mut tick = 0u64;
    let engine = ThroughputAdaptation::spawn(config, move |vector, reference| {
        tick += 1;
        match format {
            OutputFormat::Text => {
                println!("tick {tick}\tvector {vector:+.3}\treference {reference:.0} B/s");
            }
            OutputFormat::Json => {
                #[derive(serde::Serialize)]
                struct TickOut {
                    tick: u64,
                    vector: f64,
                    reference: f64,
                }
                println!(
                    "{}",
                    serde_json::to_string(&TickOut { tick, vector, reference }).unwrap()
                );
            }
        }
        if let Some(limit) = max_ticks {
            if tick >= limit {
                stop_on_done.store(true, Ordering::Relaxed);
            }
        }
    })
    .context("Starting adaptation engine")?;

    // Simulated transport: the encoder pushes `target` bytes/sec into the
    // send buffer while the link drains `capacity`, halved for 20s out of
    // every 40s so the engine sees both congestion and recovery.
    let collector = engine.collector();
    let stop_producer = stop_flag.clone();
    let (target, capacity) = (run.target, run.capacity);
    let producer = thread::spawn(move || {
        let slice = Duration::from_millis(100);
        let mut queued: u64 = 0;
        let mut elapsed = Duration::ZERO;
        while !stop_producer.load(Ordering::Relaxed) {
            let degraded = (elapsed.as_secs() / 20) % 2 == 1;
            let drain = if degraded { capacity / 2 } else { capacity } / 10;
            let (written, remaining) = queue_step(queued, target / 10, drain);
            queued = remaining;
            collector.record_sent(written);
            collector.record_buffer_occupancy(queued);
            thread::sleep(slice);
            elapsed += slice;
        }
    });

    while !stop_flag.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(50));
    }

    info!("Shutting down");
    engine.shutdown();
    let _ = producer.join();
    Ok(())
}

// Pure queue model step for easier testing: offer bytes to the send buffer,
// let the link drain up to its per-slice budget, return (written, remaining).
pub(crate) fn queue_step(queued: u64, offered: u64, drain: u64) -> (u64, u64) {
    let queued = queued + offered;
    let written = queued.min(drain);
    (written, queued - written)
}

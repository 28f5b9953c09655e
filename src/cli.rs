use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the engine against a simulated transport
    Run(Run),
}

#[derive(Parser, Clone, Debug)]
pub struct Run {
    /// Estimation period in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub period_ms: u64,

    /// Stop after this many ticks (run until ctrl-c if omitted)
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Simulated link capacity (bytes/sec); halves for 20s out of every 40s
    #[arg(long, default_value_t = 250_000)]
    pub capacity: u64,

    /// Rate the encoder pushes into the send buffer (bytes/sec)
    #[arg(long, default_value_t = 300_000)]
    pub target: u64,

    /// Per-tick output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Text,
    Json,
}

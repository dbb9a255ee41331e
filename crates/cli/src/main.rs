use clap::{Parser, Subcommand};
use std::path::PathBuf;
use delegation_cli::commands::{checkpoint, history, inspect, list, mutate, timeline, total, verify};

#[derive(Parser)]
#[command(name = "dreg")]
#[command(about = "Delegation registry CLI: mutate, query and audit an event-sourced registry", long_about = None)]
struct Cli {
    /// Registry directory (holds events.log and index.ckpt)
    #[arg(long, short, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a delegate to a set
    Set {
        /// Acting delegator address
        #[arg(long = "as")]
        delegator: String,
        /// Space as 0x + 64 hex digits, or a label (padded to 32 bytes)
        #[arg(long, default_value = "")]
        space: String,
        delegate: String,
    },
    /// Remove one delegate from a set
    Clear {
        #[arg(long = "as")]
        delegator: String,
        #[arg(long, default_value = "")]
        space: String,
        delegate: String,
    },
    /// Remove every delegate from a set
    ClearAll {
        #[arg(long = "as")]
        delegator: String,
        #[arg(long, default_value = "")]
        space: String,
    },
    /// Count the delegates of a set
    Total {
        delegator: String,
        #[arg(long, default_value = "")]
        space: String,
    },
    /// List active delegates from the index
    List {
        delegator: String,
        #[arg(long, default_value = "")]
        space: String,
    },
    /// Show every recorded event of a delegator
    History {
        delegator: String,
    },
    /// Show the status of the log and checkpoint files
    Inspect,
    /// List events in log order
    Timeline {
        /// First sequence number to show
        #[arg(long, default_value_t = 0)]
        from: u64,
        /// Maximum number of events
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Rebuild the index from the log and cross-check everything
    Verify,
    /// Write an index checkpoint
    Checkpoint,
}

fn main() -> anyhow::Result<()> {
    delegation_node::telemetry::init_telemetry();

    let cli = Cli::parse();
    let dir = cli.dir.as_path();

    match cli.command {
        Commands::Set { delegator, space, delegate } => mutate::set(dir, &delegator, &space, &delegate).map(|_| ()),
        Commands::Clear { delegator, space, delegate } => mutate::clear(dir, &delegator, &space, &delegate).map(|_| ()),
        Commands::ClearAll { delegator, space } => mutate::clear_all(dir, &delegator, &space).map(|_| ()),
        Commands::Total { delegator, space } => total::run(dir, &delegator, &space).map(|_| ()),
        Commands::List { delegator, space } => list::run(dir, &delegator, &space).map(|_| ()),
        Commands::History { delegator } => history::run(dir, &delegator).map(|_| ()),
        Commands::Inspect => inspect::run(dir),
        Commands::Timeline { from, limit } => timeline::run(dir, from, limit),
        Commands::Verify => verify::run(dir).map(|_| ()),
        Commands::Checkpoint => checkpoint::run(dir).map(|_| ()),
    }
}

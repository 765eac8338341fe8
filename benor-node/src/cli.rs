use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "benor-node")]
#[command(about = "Ben-Or binary consensus network")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the whole network in this process and run it to a decision
    Run {
        #[arg(short, long, value_name = "FILE", default_value = "network.json")]
        config: PathBuf,

        /// Give up waiting for a decision after this many seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Serve a single node of a multi-process network
    Node {
        #[arg(short, long, value_name = "FILE", default_value = "network.json")]
        config: PathBuf,

        #[arg(long)]
        id: usize,
    },
    /// Start consensus on a running network
    Start {
        #[arg(short, long, value_name = "FILE", default_value = "network.json")]
        config: PathBuf,
    },
    /// Kill every node of a running network
    Stop {
        #[arg(short, long, value_name = "FILE", default_value = "network.json")]
        config: PathBuf,
    },
    /// Print the state of every node as JSON
    State {
        #[arg(short, long, value_name = "FILE", default_value = "network.json")]
        config: PathBuf,
    },
    /// Write a network config file
    Init {
        #[arg(short, long, value_name = "FILE", default_value = "network.json")]
        config: PathBuf,

        #[arg(long)]
        n: usize,

        #[arg(long)]
        f: usize,

        /// Initial values, one per node (e.g. 0,1,1)
        #[arg(long, value_delimiter = ',')]
        values: Vec<u8>,

        /// Indices of faulty nodes
        #[arg(long, value_delimiter = ',')]
        faulty: Vec<usize>,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 3000)]
        base_port: u16,
    },
}

impl Commands {
    pub fn config_path(&self) -> &PathBuf {
        match self {
            Commands::Run { config, .. }
            | Commands::Node { config, .. }
            | Commands::Start { config }
            | Commands::Stop { config }
            | Commands::State { config }
            | Commands::Init { config, .. } => config,
        }
    }

    /// Used to name the log file.
    pub fn label(&self) -> String {
        match self {
            Commands::Node { id, .. } => format!("node-{}", id),
            Commands::Run { .. } => "network".to_string(),
            _ => "control".to_string(),
        }
    }
}

use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use benor_common::{BenOrError, NodeId, Value};
use benor_node::{cli::Cli, cli::Commands, launch_network, launch_node, logging, NetworkConfig, Orchestrator};

const DECISION_POLL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = logging::init(&cli.command.label());

    info!("--- BEN-OR NODE ---");
    info!("Config: {}", cli.command.config_path().display());

    match cli.command {
        Commands::Run { config, timeout_secs } => {
            let config = NetworkConfig::load_from_file(&config)?;
            let network = launch_network(&config).await?;
            let orchestrator = Orchestrator::new(network.peers().clone())?;

            orchestrator.start_consensus().await?;
            let (decided, states) = orchestrator
                .wait_for_decision(&config.faulty, Duration::from_secs(timeout_secs), DECISION_POLL)
                .await?;
            if decided {
                info!("✅ every healthy node decided");
            } else {
                warn!("⚠️ no decision after {}s", timeout_secs);
            }
            println!("{}", serde_json::to_string_pretty(&states)?);

            orchestrator.stop_consensus().await?;
            network.shutdown();
        }
        Commands::Node { config, id } => {
            let config = NetworkConfig::load_from_file(&config)?;
            let (node, server) = launch_node(&config, NodeId(id)).await?;
            info!("{} ready. Press Ctrl+C to stop.", node.id());

            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    res?;
                    info!("Ctrl+C received, shutting down {}", node.id());
                }
                res = server => {
                    if let Err(e) = res {
                        error!("server task of {} failed: {}", node.id(), e);
                    }
                }
            }
            node.stop();
        }
        Commands::Start { config } => {
            let config = NetworkConfig::load_from_file(&config)?;
            Orchestrator::new(config.peer_book()?)?.start_consensus().await?;
            println!("started");
        }
        Commands::Stop { config } => {
            let config = NetworkConfig::load_from_file(&config)?;
            Orchestrator::new(config.peer_book()?)?.stop_consensus().await?;
            println!("killed");
        }
        Commands::State { config } => {
            let config = NetworkConfig::load_from_file(&config)?;
            let states = Orchestrator::new(config.peer_book()?)?.collect_states().await?;
            println!("{}", serde_json::to_string_pretty(&states)?);
        }
        Commands::Init { config: path, n, f, values, faulty, host, base_port } => {
            let initial_values = values
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<Value>, String>>()
                .map_err(BenOrError::Config)?;

            let mut config = NetworkConfig::new(n, f, initial_values, faulty);
            config.host = host;
            config.base_port = base_port;
            config.validate()?;
            config.save_to_file(&path)?;
            info!("📝 wrote {}", path.display());
        }
    }

    Ok(())
}

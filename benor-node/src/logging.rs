use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

/// Installs stdout logging plus a `logs/consensus-<label>.log` file that only
/// receives protocol `EVENT:` lines. Keep the guard alive for the file to be
/// flushed.
pub fn init(label: &str) -> WorkerGuard {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("CRASH: {}", info);
    }));

    let file_appender =
        tracing_appender::rolling::never("logs", format!("consensus-{}.log", label));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let consensus_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() == "consensus"
        }));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,benor_node=debug".into()),
        )
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() != "consensus"
        }));

    tracing_subscriber::registry()
        .with(consensus_layer)
        .with(stdout_layer)
        .init();

    guard
}

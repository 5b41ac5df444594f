use clap::Parser;
use search_engine::config::IndexCli;
use search_engine::indexer;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = IndexCli::parse();
    let cfg = cli.into_config();
    let emitted = indexer::run(&cfg)?;
    tracing::info!(emitted, "index finished");
    Ok(())
}

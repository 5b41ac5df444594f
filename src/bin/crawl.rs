use std::sync::Arc;

use clap::Parser;
use search_engine::config::CrawlCli;
use search_engine::crawler::Crawler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = CrawlCli::parse();
    let (seeds, cfg) = cli.into_config();
    let crawler = Arc::new(Crawler::new(cfg)?);

    let mut run_handle = {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move { crawler.run(seeds).await })
    };

    let total = tokio::select! {
        result = &mut run_handle => result??,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
            crawler.request_shutdown().await?;
            run_handle.await??
        }
    };

    tracing::info!(total, "crawl finished");
    Ok(())
}

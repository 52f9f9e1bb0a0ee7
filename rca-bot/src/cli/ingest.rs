use std::sync::Arc;

use rca_bot::Result;
use rca_bot::config::Config;
use rca_bot::providers::{self, WebFetcher};
use rca_bot::services::{DocumentIngestor, Indexer, RecursiveSplitter};
use serde_json::json;

use super::render;

pub async fn run(config: &Config, url: &str, json: bool) -> Result<()> {
    let ingestor = DocumentIngestor::new(
        Arc::new(WebFetcher::new(&config.fetch)?),
        RecursiveSplitter::from_config(&config.splitter)?,
    );
    let indexer = Indexer::new(providers::embedder_from_config(config)?)
        .with_batch_size(config.embedding.batch_size);

    let spinner = (!json).then(|| render::spinner(format!("Processing {url}")));
    let result = async {
        let chunks = ingestor.ingest(url).await?;
        indexer.build(chunks, &config.knowledge_base_dir).await
    }
    .await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let handle = result?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "location": handle.location(),
                "manifest": handle.manifest(),
            }))?
        );
    } else {
        render::print_indexed(&handle);
    }
    Ok(())
}

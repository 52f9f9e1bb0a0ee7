use rca_bot::Result;
use rca_bot::config::Config;
use rca_bot::store;
use serde_json::json;

pub async fn run(config: &Config, json: bool) -> Result<()> {
    let dir = &config.knowledge_base_dir;
    let (manifest, records) = store::read(dir).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "location": dir,
                "manifest": manifest,
            }))?
        );
        return Ok(());
    }

    let total_chars: usize = records.iter().map(|r| r.chunk.char_len()).sum();

    println!();
    println!("Knowledge base: {}", dir.display());
    println!("  Id:        {}", manifest.id);
    println!("  Source:    {}", manifest.source_url);
    println!("  Built:     {}", manifest.built_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Model:     {} ({} dims)", manifest.embedding_model, manifest.dimension);
    println!("  Records:   {} ({total_chars} chars)", manifest.record_count);
    println!("  Hash:      {}", manifest.content_hash);
    println!();
    Ok(())
}

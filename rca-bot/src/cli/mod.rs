use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rca_bot::Result;
use rca_bot::config::Config;

mod ask;
mod chat;
mod ingest;
mod render;
mod status;

#[derive(Parser)]
#[command(name = "rca-bot")]
#[command(about = "Answer incident root-cause questions from an indexed web page")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        help = "Knowledge base directory (default: ./vector_data_openAI)"
    )]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start an interactive chat session")]
    Chat {
        #[arg(long, help = "Knowledge base URL to process before the first message")]
        url: Option<String>,
    },

    #[command(about = "Fetch a URL and rebuild the knowledge base from it")]
    Ingest {
        #[arg(help = "URL of the document to index")]
        url: String,
    },

    #[command(about = "Ask one question against the existing knowledge base")]
    Ask {
        #[arg(help = "Question to answer")]
        question: String,
    },

    #[command(about = "Show what the knowledge base contains")]
    Status,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = with_dir_override(Config::load()?, cli.dir)?;

    match cli.command {
        Commands::Chat { url } => chat::run(&config, url, cli.json).await,
        Commands::Ingest { url } => ingest::run(&config, &url, cli.json).await,
        Commands::Ask { question } => ask::run(&config, &question, cli.json).await,
        Commands::Status => status::run(&config, cli.json).await,
    }
}

/// Applies `--dir` and re-checks the result.
fn with_dir_override(mut config: Config, dir: Option<PathBuf>) -> Result<Config> {
    if let Some(dir) = dir {
        config.knowledge_base_dir = dir;
    }
    config.validate()?;
    Ok(config)
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use verity_core::{DetectionRequest, PaperStyle, ResearchRequest};
use verity_local::model::{OpenAiCompatModel, API_KEY_ENV, BASE_URL_ENV, MODEL_ENV};
use verity_local::{detect, research, LocalFetcher};

mod server;
mod telemetry;

#[derive(Parser, Debug)]
#[command(name = "verity")]
#[command(about = "Fake-news detection and research-paper generation tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify an article (text or URL) as real or fake news.
    Detect(DetectCmd),
    /// Generate a structured research paper on a topic.
    Research(ResearchCmd),
    /// Serve the flows as an HTTP JSON API.
    Serve(ServeCmd),
    /// Diagnose configuration (json; no secrets).
    Doctor,
}

#[derive(clap::Args, Debug)]
struct DetectCmd {
    /// Article text, or an http(s):// URL to fetch it from.
    input: String,
    /// Print the full report as JSON instead of a summary.
    #[arg(long)]
    json: bool,
    /// Override the configured model identifier.
    #[arg(long)]
    model: Option<String>,
}

#[derive(clap::Args, Debug)]
struct ResearchCmd {
    /// Topic of the paper.
    topic: String,
    /// Writing style. Allowed: academic, professional, concise, detailed
    #[arg(long, default_value = "academic")]
    style: PaperStyle,
    /// Target word count.
    #[arg(long, default_value_t = 1500)]
    words: u32,
    /// Write the paper as markdown to this path instead of stdout.
    #[arg(long)]
    out: Option<std::path::PathBuf>,
    /// Override the configured model identifier.
    #[arg(long)]
    model: Option<String>,
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080", env = "VERITY_BIND")]
    bind: String,
}

fn model_from_env(model_override: Option<String>) -> Result<OpenAiCompatModel> {
    let client = reqwest::Client::new();
    OpenAiCompatModel::from_env(client, model_override)
        .context("model client configuration (see `verity doctor`)")
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(cmd) => run_detect(cmd).await,
        Commands::Research(cmd) => run_research(cmd).await,
        Commands::Serve(cmd) => run_serve(cmd).await,
        Commands::Doctor => run_doctor(),
    }
}

async fn run_detect(cmd: DetectCmd) -> Result<()> {
    let model = model_from_env(cmd.model)?;
    let fetcher = LocalFetcher::new()?;
    let req = DetectionRequest { input: cmd.input };

    let report = detect::detect_fake_news(&model, &fetcher, &req).await?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("verdict: {}", report.verdict);
        println!("score:   {:.2}", report.score);
        if let Some(reasoning) = &report.reasoning {
            println!("why:     {reasoning}");
        }
    }
    Ok(())
}

async fn run_research(cmd: ResearchCmd) -> Result<()> {
    let model = model_from_env(cmd.model)?;
    let req = ResearchRequest {
        topic: cmd.topic,
        style: cmd.style,
        word_count: cmd.words,
    };

    let paper = research::generate_research_paper(&model, &req).await?;
    let markdown = paper.to_markdown();
    match cmd.out {
        Some(path) => {
            std::fs::write(&path, markdown)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "paper written");
        }
        None => print!("{markdown}"),
    }
    Ok(())
}

async fn run_serve(cmd: ServeCmd) -> Result<()> {
    let model = model_from_env(None)?;
    let fetcher = LocalFetcher::new()?;
    let state = server::AppState::new(Arc::new(model), Arc::new(fetcher));
    let router = server::build_router(state);

    let addr: SocketAddr = cmd.bind.parse().context("invalid bind address")?;
    info!(%addr, version = env!("CARGO_PKG_VERSION"), "verity listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("ctrl-c received; shutting down");
        })
        .await?;
    Ok(())
}

fn run_doctor() -> Result<()> {
    fn set(key: &str) -> bool {
        std::env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false)
    }
    let report = serde_json::json!({
        "model_base_url_set": set(BASE_URL_ENV),
        "model_api_key_set": set(API_KEY_ENV),
        "model_set": set(MODEL_ENV),
        "version": env!("CARGO_PKG_VERSION"),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

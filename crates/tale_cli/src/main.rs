mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tale_core::{get_settings, AudioEncoding, ChildProfile, Settings, Story};
use tale_gateway::{AppState, GatewayServer};
use tale_generation::{GenerationParams, OpenRouterClient, StoryGenerator};
use tale_storage::PostgrestRepository;
use tale_voice::{VoiceProvider, VoiceService};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tale-generator", author, version, about, long_about = None)]
struct Cli {
    /// Dotenv file to load before reading settings
    #[arg(long, global = true, env = "TALE_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Override APP_HOST
        #[arg(long)]
        host: Option<String>,
        /// Override APP_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate settings and print the voice provider selection
    Check,
    /// Synthesize text to an audio file
    Speak {
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "en")]
        language: String,
        /// Defaults to VOICE_OUTPUT_FORMAT
        #[arg(long)]
        encoding: Option<AudioEncoding>,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Missing dotenv file is fine; the environment may be set directly.
    if dotenv::from_path(&cli.env_file).is_err() && cli.env_file != PathBuf::from(".env") {
        eprintln!("warning: could not load {}", cli.env_file.display());
    }

    let settings = get_settings().context("invalid configuration")?;
    let _log_guard = logging::init(&settings.logging)?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => serve(&settings, host, port).await,
        Command::Check => check(&settings),
        Command::Speak {
            text,
            language,
            encoding,
            output,
        } => speak(&settings, &text, &language, encoding, &output).await,
    }
}

async fn serve(settings: &Settings, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut app = settings.app.clone();
    if let Some(host) = host {
        app.host = host;
    }
    if let Some(port) = port {
        app.port = port;
    }

    let voice = VoiceService::from_config(&settings.voice)?;
    let generator = OpenRouterClient::from_config(&settings.ai)?;
    info!(model = %settings.ai.default_model, "Text generator ready");

    let children = Arc::new(PostgrestRepository::<ChildProfile>::new(&settings.database)?);
    let stories = Arc::new(PostgrestRepository::<Story>::new(&settings.database)?);
    let pipeline = StoryGenerator::new(
        Arc::new(generator),
        voice,
        children.clone(),
        stories.clone(),
        GenerationParams::from_config(&settings.ai),
    );

    let server = GatewayServer::new(AppState::new(app, pipeline, children, stories));
    server.serve().await.context("gateway server failed")
}

fn check(settings: &Settings) -> Result<()> {
    let voice = VoiceService::from_config(&settings.voice)?;
    let registry = voice.registry();
    let selected = registry
        .get_provider_with_fallback()
        .map(|p| p.name().to_string());

    let report = json!({
        "environment": settings.app.environment.as_str(),
        "bind_address": settings.app.bind_address(),
        "database": {
            "url": settings.database.url.as_str(),
            "schema": settings.database.schema,
        },
        "ai": {
            "base_url": settings.ai.base_url.as_str(),
            "model": settings.ai.default_model,
            "max_retries": settings.ai.max_retries,
        },
        "voice": {
            "active": settings.voice.is_active(),
            "default_provider": registry.default_provider_name(),
            "selection_order": registry.selection_order(),
            "selected": selected.as_ref().ok(),
            "error": selected.as_ref().err().map(|e| e.to_string()),
            "providers": voice.provider_status(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn speak(
    settings: &Settings,
    text: &str,
    language: &str,
    encoding: Option<AudioEncoding>,
    output: &Path,
) -> Result<()> {
    let voice = VoiceService::from_config(&settings.voice)?;
    let encoding = encoding.unwrap_or_else(|| voice.default_encoding());
    let result = voice.synthesize(text, language, encoding).await?;

    tokio::fs::write(output, &result.audio)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "{} bytes of {} from {} written to {}",
        result.audio.len(),
        result.encoding,
        result.provider,
        output.display()
    );
    Ok(())
}

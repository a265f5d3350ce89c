use anyhow::{Context, Result};
use clap::Parser;
use portfolio::application::{AppState, ImageServiceConfig};
use portfolio::infrastructure::database::Database;
use portfolio::presentation::cli::{Cli, Commands, NormalizeArgs, images};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before clap parses env vars)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    let database = Database::connect(&cli.database_url)
        .await
        .with_context(|| format!("failed to open database {}", cli.database_url))?;
    let state = AppState::from_database(&database, service_config(&cli.normalize));

    match cli.command {
        Commands::Image { command } => images::run(&state.image_service, command).await,
    }
}

fn service_config(args: &NormalizeArgs) -> ImageServiceConfig {
    ImageServiceConfig {
        max_width: args.max_width,
        max_height: args.max_height,
        jpeg_quality: args.jpeg_quality,
        ..ImageServiceConfig::default()
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // Logs go to stderr so command output on stdout stays machine-readable.
    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

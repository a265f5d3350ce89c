pub mod images;

use clap::{Parser, Subcommand};

use images::ImageCommands;

#[derive(Debug, Parser)]
#[command(author, version, about = "Manage portfolio project galleries", long_about = None)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "PORTFOLIO_DATABASE_URL",
        default_value = "sqlite://portfolio.db"
    )]
    pub database_url: String,

    #[command(flatten)]
    pub normalize: NormalizeArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage project gallery images
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },
}

/// Bounding box and JPEG quality applied to ingested images.
#[derive(Debug, clap::Args)]
pub struct NormalizeArgs {
    #[arg(
        long,
        global = true,
        env = "PORTFOLIO_MAX_WIDTH",
        default_value_t = 1920,
        value_parser = clap::value_parser!(u32).range(1..=65535)
    )]
    pub max_width: u32,

    #[arg(
        long,
        global = true,
        env = "PORTFOLIO_MAX_HEIGHT",
        default_value_t = 1024,
        value_parser = clap::value_parser!(u32).range(1..=65535)
    )]
    pub max_height: u32,

    #[arg(
        long,
        global = true,
        env = "PORTFOLIO_JPEG_QUALITY",
        default_value_t = 85,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub jpeg_quality: u8,
}

pub(crate) fn print_json<T>(value: &T) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

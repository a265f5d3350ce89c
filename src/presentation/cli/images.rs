use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::print_json;
use crate::application::ImageService;
use crate::domain::ids::{ImageId, ProjectId};
use crate::domain::images::{ImageSummary, InlineImage};

const DATA_URL_PREFIX: &str = "data:";
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Subcommand)]
pub enum ImageCommands {
    /// Add images from files or inline data URLs (all or nothing)
    Add(AddImagesCommand),
    /// List a project's images
    List(ListImagesCommand),
    /// Delete images from a project
    Delete(DeleteImagesCommand),
    /// Make an image the project's cover
    Cover(SetCoverCommand),
}

pub async fn run(service: &ImageService, cmd: ImageCommands) -> Result<()> {
    match cmd {
        ImageCommands::Add(c) => add_images(service, c).await,
        ImageCommands::List(c) => list_images(service, c).await,
        ImageCommands::Delete(c) => delete_images(service, c).await,
        ImageCommands::Cover(c) => set_cover(service, c).await,
    }
}

#[derive(Debug, Args)]
pub struct AddImagesCommand {
    #[arg(long)]
    pub project: i64,
    /// Image file paths or `data:<mime>;base64,<payload>` strings
    #[arg(required = true)]
    pub sources: Vec<String>,
}

pub async fn add_images(service: &ImageService, command: AddImagesCommand) -> Result<()> {
    let entries = command
        .sources
        .iter()
        .map(|source| load_source(source))
        .collect::<Result<Vec<_>>>()?;

    let added = service
        .add_images(ProjectId::new(command.project), &entries)
        .await?;
    let summaries: Vec<ImageSummary> = added.iter().map(ImageSummary::from).collect();
    print_json(&summaries)
}

#[derive(Debug, Args)]
pub struct ListImagesCommand {
    #[arg(long)]
    pub project: i64,
    /// Include each image as a data URL
    #[arg(long)]
    pub with_data: bool,
}

pub async fn list_images(service: &ImageService, command: ListImagesCommand) -> Result<()> {
    let project_id = ProjectId::new(command.project);
    if command.with_data {
        print_json(&service.get_images(project_id).await?)
    } else {
        print_json(&service.list_summaries(project_id).await?)
    }
}

#[derive(Debug, Args)]
pub struct DeleteImagesCommand {
    #[arg(long)]
    pub project: i64,
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

pub async fn delete_images(service: &ImageService, command: DeleteImagesCommand) -> Result<()> {
    let ids: Vec<ImageId> = command.ids.into_iter().map(ImageId::new).collect();
    let removed = service
        .delete_images(ProjectId::new(command.project), &ids)
        .await?;
    print_json(&serde_json::json!({ "removed": removed }))
}

#[derive(Debug, Args)]
pub struct SetCoverCommand {
    #[arg(long)]
    pub project: i64,
    pub image_id: i64,
}

pub async fn set_cover(service: &ImageService, command: SetCoverCommand) -> Result<()> {
    let project_id = ProjectId::new(command.project);
    service
        .set_cover(project_id, ImageId::new(command.image_id))
        .await?;
    let cover = service.cover(project_id).await?;
    print_json(&cover.as_ref().map(ImageSummary::from))
}

/// Turn a CLI source into an inline image string. Data URLs pass through;
/// anything else is read as a file.
fn load_source(source: &str) -> Result<String> {
    if source.trim_start().starts_with(DATA_URL_PREFIX) {
        return Ok(source.to_string());
    }

    let path = Path::new(source);
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mime_type = image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE);

    Ok(InlineImage::new(mime_type, bytes).to_string())
}

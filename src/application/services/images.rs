use std::collections::BTreeSet;
use std::sync::Arc;

use futures::TryStreamExt;
use futures::stream::FuturesOrdered;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::locks::ProjectLocks;
use crate::application::errors::ImageError;
use crate::domain::ids::{ImageId, ProjectId};
use crate::domain::images::{
    ImageResponse, ImageSummary, InlineImage, NewProjectImage, ProjectImage,
};
use crate::domain::repositories::{ProjectImageRepository, ProjectRepository};
use crate::infrastructure::image_processing::{NormalizeOptions, normalize_image_bytes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageServiceConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    /// Upper bound on images decoded at the same time across all callers.
    pub max_concurrent_decodes: usize,
}

impl Default for ImageServiceConfig {
    fn default() -> Self {
        let normalize = NormalizeOptions::default();
        Self {
            max_width: normalize.max_width,
            max_height: normalize.max_height,
            jpeg_quality: normalize.jpeg_quality,
            max_concurrent_decodes: 4,
        }
    }
}

impl ImageServiceConfig {
    /// Zero box sides or quality would make every encode fail, so they are
    /// raised to the smallest usable value.
    fn sanitized(self) -> Self {
        Self {
            max_width: self.max_width.max(1),
            max_height: self.max_height.max(1),
            jpeg_quality: self.jpeg_quality.clamp(1, 100),
            max_concurrent_decodes: self.max_concurrent_decodes.max(1),
        }
    }

    fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            max_width: self.max_width,
            max_height: self.max_height,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

/// Gallery operations for a project: ingest, list, delete, and cover selection.
#[derive(Clone)]
pub struct ImageService {
    projects: Arc<dyn ProjectRepository>,
    images: Arc<dyn ProjectImageRepository>,
    config: ImageServiceConfig,
    decode_permits: Arc<Semaphore>,
    locks: ProjectLocks,
}

impl ImageService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        images: Arc<dyn ProjectImageRepository>,
        config: ImageServiceConfig,
    ) -> Self {
        let config = config.sanitized();
        Self {
            projects,
            images,
            decode_permits: Arc::new(Semaphore::new(config.max_concurrent_decodes)),
            config,
            locks: ProjectLocks::new(),
        }
    }

    /// Decode, normalize and store a batch of inline images.
    ///
    /// The batch is all-or-nothing: if any entry is blank, malformed or not
    /// an image, nothing is stored.
    #[tracing::instrument(skip(self, images), fields(count = images.len()))]
    pub async fn add_images(
        &self,
        project_id: ProjectId,
        images: &[String],
    ) -> Result<Vec<ProjectImage>, ImageError> {
        self.ensure_project(project_id).await?;

        let normalized = match self.normalize_batch(images).await {
            Ok(normalized) => normalized,
            Err(err) => {
                warn!(%project_id, error = %err, "image batch rejected");
                return Err(err);
            }
        };

        let _guard = self.locks.lock(project_id).await;
        let persisted = self
            .images
            .insert_batch(project_id, normalized)
            .await
            .map_err(|err| {
                ImageError::from_repository(err, || format!("project {project_id} not found"))
            })?;

        info!(%project_id, count = persisted.len(), "project images added");
        Ok(persisted)
    }

    /// Remove the listed images from a project. Ids that belong elsewhere are
    /// ignored; if none of them belong to the project the call fails.
    #[tracing::instrument(skip(self, image_ids))]
    pub async fn delete_images(
        &self,
        project_id: ProjectId,
        image_ids: &[ImageId],
    ) -> Result<u64, ImageError> {
        self.ensure_project(project_id).await?;

        let unique: Vec<ImageId> = image_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let _guard = self.locks.lock(project_id).await;
        let removed = self.images.delete_many(project_id, &unique).await?;
        if removed == 0 {
            return Err(ImageError::NotFound(format!(
                "no matching images to delete in project {project_id}"
            )));
        }

        info!(%project_id, removed, "project images deleted");
        Ok(removed)
    }

    /// Stored images of a project as inline images, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_images(&self, project_id: ProjectId) -> Result<Vec<ImageResponse>, ImageError> {
        let images = self.images.list_by_project(project_id).await?;
        Ok(images.iter().map(ImageResponse::from).collect())
    }

    /// Payload-free listing for operators.
    pub async fn list_summaries(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ImageSummary>, ImageError> {
        let images = self.images.list_by_project(project_id).await?;
        Ok(images.iter().map(ImageSummary::from).collect())
    }

    /// Make `image_id` the only cover image of the project.
    #[tracing::instrument(skip(self))]
    pub async fn set_cover(&self, project_id: ProjectId, image_id: ImageId) -> Result<(), ImageError> {
        let _guard = self.locks.lock(project_id).await;

        let ids = self.images.image_ids(project_id).await?;
        if ids.is_empty() {
            return Err(ImageError::NotFound(format!(
                "no images for project {project_id}"
            )));
        }
        if !ids.contains(&image_id) {
            return Err(ImageError::NotFound(image_not_in_project(project_id, image_id)));
        }

        self.images
            .set_cover(project_id, image_id)
            .await
            .map_err(|err| {
                ImageError::from_repository(err, || image_not_in_project(project_id, image_id))
            })?;

        info!(%project_id, %image_id, "cover image updated");
        Ok(())
    }

    /// Current cover image of the project, if one has been chosen.
    pub async fn cover(&self, project_id: ProjectId) -> Result<Option<ProjectImage>, ImageError> {
        Ok(self.images.cover(project_id).await?)
    }

    /// Effective settings after zero values were raised.
    pub fn config(&self) -> ImageServiceConfig {
        self.config
    }

    async fn ensure_project(&self, project_id: ProjectId) -> Result<(), ImageError> {
        self.projects
            .get(project_id)
            .await
            .map(|_| ())
            .map_err(|err| ImageError::from_repository(err, || format!("project {project_id} not found")))
    }

    async fn normalize_batch(&self, entries: &[String]) -> Result<Vec<NewProjectImage>, ImageError> {
        let parsed = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry
                    .parse::<InlineImage>()
                    .map_err(|err| ImageError::from_inline(index, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Results arrive in input order, so the earliest failing entry is
        // reported and the entries still pending behind it are dropped.
        parsed
            .into_iter()
            .enumerate()
            .map(|(index, inline)| self.normalize_one(index, inline))
            .collect::<FuturesOrdered<_>>()
            .try_collect()
            .await
    }

    async fn normalize_one(
        &self,
        index: usize,
        inline: InlineImage,
    ) -> Result<NewProjectImage, ImageError> {
        let _permit = self
            .decode_permits
            .acquire()
            .await
            .map_err(|err| ImageError::Internal(err.to_string()))?;

        let options = self.config.normalize_options();
        let source_mime = inline.mime_type().to_string();
        let processed =
            match tokio::task::spawn_blocking(move || normalize_image_bytes(inline.data(), options))
                .await
            {
                Ok(Ok(processed)) => processed,
                Ok(Err(err)) => return Err(ImageError::from_processing(index, err)),
                Err(err) => {
                    return Err(ImageError::Internal(format!(
                        "image #{index}: processing task failed: {err}"
                    )));
                }
            };

        debug!(
            index,
            source_mime,
            width = processed.width,
            height = processed.height,
            bytes = processed.image_data.len(),
            "image normalized"
        );

        Ok(NewProjectImage {
            mime_type: processed.content_type.to_string(),
            image_data: processed.image_data,
        })
    }
}

fn image_not_in_project(project_id: ProjectId, image_id: ImageId) -> String {
    format!("image {image_id} not found in project {project_id}")
}

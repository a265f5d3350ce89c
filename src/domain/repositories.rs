use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::ids::{ImageId, ProjectId};
use crate::domain::images::{NewProjectImage, ProjectImage};
use crate::domain::projects::Project;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get(&self, id: ProjectId) -> Result<Project, RepositoryError>;
}

#[async_trait]
pub trait ProjectImageRepository: Send + Sync {
    /// All images of a project, ordered by id.
    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectImage>, RepositoryError>;

    /// Ids of the project's images without loading their payloads.
    async fn image_ids(&self, project_id: ProjectId) -> Result<Vec<ImageId>, RepositoryError>;

    async fn cover(&self, project_id: ProjectId) -> Result<Option<ProjectImage>, RepositoryError>;

    /// Persists the whole batch in one transaction. Either every image is
    /// written or none is.
    async fn insert_batch(
        &self,
        project_id: ProjectId,
        images: Vec<NewProjectImage>,
    ) -> Result<Vec<ProjectImage>, RepositoryError>;

    /// Deletes the given ids that belong to `project_id` and returns how many
    /// rows went away. Ids owned by other projects are ignored.
    async fn delete_many(
        &self,
        project_id: ProjectId,
        image_ids: &[ImageId],
    ) -> Result<u64, RepositoryError>;

    /// Clears the project's cover flag and sets it on `image_id` in one
    /// transaction. `NotFound` when the image is not part of the project.
    async fn set_cover(
        &self,
        project_id: ProjectId,
        image_id: ImageId,
    ) -> Result<(), RepositoryError>;
}

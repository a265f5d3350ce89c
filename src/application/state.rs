use std::sync::Arc;

use crate::application::services::{ImageService, ImageServiceConfig};
use crate::domain::repositories::{ProjectImageRepository, ProjectRepository};
use crate::infrastructure::database::Database;
use crate::infrastructure::repositories::images::SqlProjectImageRepository;
use crate::infrastructure::repositories::projects::SqlProjectRepository;

#[derive(Clone)]
pub struct AppState {
    pub image_repo: Arc<dyn ProjectImageRepository>,
    pub image_service: ImageService,
}

impl AppState {
    /// Build the repositories and the image service on top of one pool.
    pub fn from_database(database: &Database, config: ImageServiceConfig) -> Self {
        let pool = database.clone_pool();

        let project_repo: Arc<dyn ProjectRepository> =
            Arc::new(SqlProjectRepository::new(pool.clone()));
        let image_repo: Arc<dyn ProjectImageRepository> =
            Arc::new(SqlProjectImageRepository::new(pool));

        let image_service = ImageService::new(project_repo, Arc::clone(&image_repo), config);

        Self {
            image_repo,
            image_service,
        }
    }
}

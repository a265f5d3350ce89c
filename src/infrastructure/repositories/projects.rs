use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::query_as;

use crate::domain::RepositoryError;
use crate::domain::ids::ProjectId;
use crate::domain::projects::Project;
use crate::domain::repositories::ProjectRepository;
use crate::infrastructure::database::DatabasePool;

#[derive(Clone)]
pub struct SqlProjectRepository {
    pool: DatabasePool,
}

impl SqlProjectRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProjectRecord {
    id: i64,
    title: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl ProjectRepository for SqlProjectRepository {
    async fn get(&self, id: ProjectId) -> Result<Project, RepositoryError> {
        let record =
            query_as::<_, ProjectRecord>(r"SELECT id, title, created_at FROM projects WHERE id = ?")
                .bind(i64::from(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepositoryError::unexpected(e.to_string()))?
                .ok_or(RepositoryError::NotFound)?;

        Ok(Project {
            id: ProjectId::from(record.id),
            title: record.title,
            created_at: record.created_at,
        })
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, query, query_as, query_scalar};

use crate::domain::RepositoryError;
use crate::domain::ids::{ImageId, ProjectId};
use crate::domain::images::{NewProjectImage, ProjectImage};
use crate::domain::repositories::ProjectImageRepository;
use crate::infrastructure::database::DatabasePool;

#[derive(Clone)]
pub struct SqlProjectImageRepository {
    pool: DatabasePool,
}

impl SqlProjectImageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn into_domain(record: ImageRecord) -> ProjectImage {
        ProjectImage {
            id: ImageId::from(record.id),
            project_id: ProjectId::from(record.project_id),
            mime_type: record.mime_type,
            image_data: record.image_data,
            is_cover: record.is_cover,
            created_at: record.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ImageRecord {
    id: i64,
    project_id: i64,
    mime_type: String,
    image_data: Vec<u8>,
    is_cover: bool,
    created_at: DateTime<Utc>,
}

fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
        if db_err.is_unique_violation() {
            return RepositoryError::conflict("project already has a cover image");
        }
    }
    RepositoryError::unexpected(err.to_string())
}

#[async_trait]
impl ProjectImageRepository for SqlProjectImageRepository {
    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectImage>, RepositoryError> {
        let records = query_as::<_, ImageRecord>(
            r"SELECT id, project_id, mime_type, image_data, is_cover, created_at
               FROM project_images
               WHERE project_id = ?
               ORDER BY id ASC",
        )
        .bind(i64::from(project_id))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::unexpected(e.to_string()))?;

        Ok(records.into_iter().map(Self::into_domain).collect())
    }

    async fn image_ids(&self, project_id: ProjectId) -> Result<Vec<ImageId>, RepositoryError> {
        let ids: Vec<i64> =
            query_scalar(r"SELECT id FROM project_images WHERE project_id = ? ORDER BY id ASC")
                .bind(i64::from(project_id))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::unexpected(e.to_string()))?;

        Ok(ids.into_iter().map(ImageId::from).collect())
    }

    async fn cover(&self, project_id: ProjectId) -> Result<Option<ProjectImage>, RepositoryError> {
        let record = query_as::<_, ImageRecord>(
            r"SELECT id, project_id, mime_type, image_data, is_cover, created_at
               FROM project_images
               WHERE project_id = ? AND is_cover = 1",
        )
        .bind(i64::from(project_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::unexpected(e.to_string()))?;

        Ok(record.map(Self::into_domain))
    }

    async fn insert_batch(
        &self,
        project_id: ProjectId,
        images: Vec<NewProjectImage>,
    ) -> Result<Vec<ProjectImage>, RepositoryError> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let created_at = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        let mut inserted = Vec::with_capacity(images.len());
        for image in images {
            let id: i64 = query_scalar(
                r"INSERT INTO project_images (project_id, mime_type, image_data, is_cover, created_at)
                  VALUES (?, ?, ?, 0, ?)
                  RETURNING id",
            )
            .bind(i64::from(project_id))
            .bind(&image.mime_type)
            .bind(&image.image_data)
            .bind(created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?;

            inserted.push(ProjectImage {
                id: ImageId::from(id),
                project_id,
                mime_type: image.mime_type,
                image_data: image.image_data,
                is_cover: false,
                created_at,
            });
        }

        tx.commit()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(inserted)
    }

    async fn delete_many(
        &self,
        project_id: ProjectId,
        image_ids: &[ImageId],
    ) -> Result<u64, RepositoryError> {
        if image_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        let mut qb = QueryBuilder::<Sqlite>::new(r"DELETE FROM project_images WHERE project_id = ");
        qb.push_bind(i64::from(project_id));
        qb.push(" AND id IN (");
        let mut sep = qb.separated(", ");
        for id in image_ids {
            sep.push_bind(i64::from(*id));
        }
        sep.push_unseparated(")");

        let result = qb
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        tx.commit()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn set_cover(
        &self,
        project_id: ProjectId,
        image_id: ImageId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        // The first statement is a write, so SQLite grants this transaction the
        // writer lock before anything is read and holds it until commit.
        query(
            r"UPDATE project_images SET is_cover = 0
               WHERE project_id = ? AND is_cover = 1 AND id <> ?",
        )
        .bind(i64::from(project_id))
        .bind(i64::from(image_id))
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let updated = query(r"UPDATE project_images SET is_cover = 1 WHERE project_id = ? AND id = ?")
            .bind(i64::from(project_id))
            .bind(i64::from(image_id))
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?
            .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|err| RepositoryError::unexpected(err.to_string()))?;

        Ok(())
    }
}

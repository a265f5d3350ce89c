use base64::Engine;
use image::{ImageBuffer, Rgba};
use portfolio::application::{AppState, ImageService, ImageServiceConfig};
use portfolio::domain::ids::{ImageId, ProjectId};
use portfolio::infrastructure::database::{Database, DatabasePool};

pub struct TestApp {
    pub pool: DatabasePool,
    pub state: AppState,
    // Keeps a file-backed database alive for the duration of the test.
    _dir: Option<tempfile::TempDir>,
}

impl TestApp {
    pub fn service(&self) -> &ImageService {
        &self.state.image_service
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_config(ImageServiceConfig::default()).await
}

pub async fn spawn_app_with_config(config: ImageServiceConfig) -> TestApp {
    let database = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    build_app(&database, config, None)
}

/// A file-backed database with a real connection pool, for tests that need
/// concurrent connections.
pub async fn spawn_app_with_file_database() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("portfolio.db").display());
    let database = Database::connect(&url)
        .await
        .expect("Failed to connect to file database");

    build_app(&database, ImageServiceConfig::default(), Some(dir))
}

fn build_app(
    database: &Database,
    config: ImageServiceConfig,
    dir: Option<tempfile::TempDir>,
) -> TestApp {
    TestApp {
        pool: database.clone_pool(),
        state: AppState::from_database(database, config),
        _dir: dir,
    }
}

pub async fn create_project(app: &TestApp, title: &str) -> ProjectId {
    let id: i64 = sqlx::query_scalar("INSERT INTO projects (title) VALUES (?) RETURNING id")
        .bind(title)
        .fetch_one(&app.pool)
        .await
        .expect("Failed to insert project");
    ProjectId::new(id)
}

/// Encode a solid-colour RGBA PNG as a data URL.
pub fn png_data_url(width: u32, height: u32) -> String {
    let img = ImageBuffer::from_pixel(width, height, Rgba([255u8, 0, 0, 255]));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        width,
        height,
        image::ColorType::Rgba8.into(),
    )
    .expect("failed to encode test PNG");

    format!("data:image/png;base64,{}", encode(&buf))
}

pub fn tiny_png_data_url() -> String {
    png_data_url(1, 1)
}

pub fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub async fn add_tiny_images(app: &TestApp, project_id: ProjectId, count: usize) -> Vec<ImageId> {
    let entries = vec![tiny_png_data_url(); count];
    app.service()
        .add_images(project_id, &entries)
        .await
        .expect("Failed to add images")
        .into_iter()
        .map(|image| image.id)
        .collect()
}

pub async fn image_count(app: &TestApp, project_id: ProjectId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM project_images WHERE project_id = ?")
        .bind(i64::from(project_id))
        .fetch_one(&app.pool)
        .await
        .expect("Failed to count images")
}

pub async fn cover_ids(app: &TestApp, project_id: ProjectId) -> Vec<ImageId> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM project_images WHERE project_id = ? AND is_cover = 1 ORDER BY id",
    )
    .bind(i64::from(project_id))
    .fetch_all(&app.pool)
    .await
    .expect("Failed to load cover ids");
    ids.into_iter().map(ImageId::new).collect()
}

pub async fn stored_bytes(app: &TestApp, image_id: ImageId) -> Vec<u8> {
    sqlx::query_scalar("SELECT image_data FROM project_images WHERE id = ?")
        .bind(i64::from(image_id))
        .fetch_one(&app.pool)
        .await
        .expect("Failed to load image bytes")
}

/// Run raw SQL against the test database, e.g. to install a failing trigger.
pub async fn execute(app: &TestApp, sql: &str) {
    sqlx::query(sql)
        .execute(&app.pool)
        .await
        .expect("Failed to execute SQL");
}

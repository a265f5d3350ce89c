use portfolio::application::ImageError;
use portfolio::domain::ids::{ImageId, ProjectId};

use crate::helpers::{
    add_tiny_images, cover_ids, create_project, execute, image_count, spawn_app,
};

#[tokio::test]
async fn deletes_requested_images_only() {
    let app = spawn_app().await;
    let project_id = create_project(&app, "Studio").await;
    let ids = add_tiny_images(&app, project_id, 3).await;

    let removed = app
        .service()
        .delete_images(project_id, &[ids[0], ids[2]])
        .await
        .expect("delete images");

    assert_eq!(removed, 2);
    let remaining: Vec<_> = app
        .service()
        .get_images(project_id)
        .await
        .expect("get images")
        .into_iter()
        .map(|image| image.id)
        .collect();
    assert_eq!(remaining, vec![ids[1]]);
}

#[tokio::test]
async fn foreign_ids_are_not_found_and_change_nothing() {
    let app = spawn_app().await;
    let mine = create_project(&app, "Mine").await;
    let theirs = create_project(&app, "Theirs").await;
    add_tiny_images(&app, mine, 2).await;
    let their_ids = add_tiny_images(&app, theirs, 1).await;

    let err = app
        .service()
        .delete_images(mine, &[their_ids[0]])
        .await
        .unwrap_err();

    assert!(matches!(err, ImageError::NotFound(_)));
    assert_eq!(image_count(&app, mine).await, 2);
    assert_eq!(image_count(&app, theirs).await, 1);
}

#[tokio::test]
async fn foreign_and_duplicate_ids_are_ignored_alongside_own_ids() {
    let app = spawn_app().await;
    let mine = create_project(&app, "Mine").await;
    let theirs = create_project(&app, "Theirs").await;
    let my_ids = add_tiny_images(&app, mine, 2).await;
    let their_ids = add_tiny_images(&app, theirs, 1).await;

    let removed = app
        .service()
        .delete_images(
            mine,
            &[my_ids[0], my_ids[0], their_ids[0], ImageId::new(9_999)],
        )
        .await
        .expect("delete images");

    assert_eq!(removed, 1);
    assert_eq!(image_count(&app, mine).await, 1);
    assert_eq!(image_count(&app, theirs).await, 1);
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let app = spawn_app().await;

    let err = app
        .service()
        .delete_images(ProjectId::new(31), &[ImageId::new(1)])
        .await
        .unwrap_err();

    assert!(matches!(err, ImageError::NotFound(message) if message.contains("project 31")));
}

#[tokio::test]
async fn empty_id_list_is_not_found() {
    let app = spawn_app().await;
    let project_id = create_project(&app, "Studio").await;
    add_tiny_images(&app, project_id, 1).await;

    let err = app
        .service()
        .delete_images(project_id, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, ImageError::NotFound(_)));
    assert_eq!(image_count(&app, project_id).await, 1);
}

#[tokio::test]
async fn deleting_the_cover_leaves_no_cover() {
    let app = spawn_app().await;
    let project_id = create_project(&app, "Studio").await;
    let ids = add_tiny_images(&app, project_id, 2).await;
    app.service()
        .set_cover(project_id, ids[0])
        .await
        .expect("set cover");

    app.service()
        .delete_images(project_id, &[ids[0]])
        .await
        .expect("delete cover");

    assert!(cover_ids(&app, project_id).await.is_empty());
    assert!(app.service().cover(project_id).await.expect("cover").is_none());
}

#[tokio::test]
async fn deleting_a_project_cascades_to_its_images() {
    let app = spawn_app().await;
    let project_id = create_project(&app, "Doomed").await;
    add_tiny_images(&app, project_id, 2).await;

    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(i64::from(project_id))
        .execute(&app.pool)
        .await
        .expect("delete project");

    assert_eq!(image_count(&app, project_id).await, 0);
}

#[tokio::test]
async fn storage_failure_is_persistence_error_and_removes_nothing() {
    let app = spawn_app().await;
    let project_id = create_project(&app, "Studio").await;
    let ids = add_tiny_images(&app, project_id, 3).await;
    execute(
        &app,
        &format!(
            r"CREATE TRIGGER fail_delete BEFORE DELETE ON project_images
              WHEN OLD.id = {}
              BEGIN SELECT RAISE(ABORT, 'disk unavailable'); END",
            i64::from(ids[1])
        ),
    )
    .await;

    let err = app
        .service()
        .delete_images(project_id, &[ids[0], ids[1]])
        .await
        .unwrap_err();

    assert!(
        matches!(&err, ImageError::Persistence(message) if message.contains("disk unavailable")),
        "unexpected error: {err:?}"
    );
    assert_eq!(image_count(&app, project_id).await, 3);
}

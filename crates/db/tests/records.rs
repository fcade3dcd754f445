//! Integration tests for announcements, tasks and designations.

mod common;

use chrono::NaiveDate;
use common::setup_db;
use db::models::{
    announcement::{Announcement, CreateAnnouncement},
    designation::{CreateDesignation, Designation},
    task::{CreateTask, Task, TaskFilter, UpdateTask},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn task(name: &str, zone: &str, branch: &str, deadline: NaiveDate) -> CreateTask {
    CreateTask {
        task_name: Some(name.to_string()),
        date: Some(date(2025, 1, 1)),
        deadline: Some(deadline),
        zone: Some(zone.to_string()),
        branch: Some(branch.to_string()),
    }
}

#[tokio::test]
async fn test_announcements_latest_and_ordering() {
    let (db, _temp_dir) = setup_db().await;

    assert!(Announcement::find_latest(&db.pool).await.unwrap().is_none());

    Announcement::create(
        &db.pool,
        &CreateAnnouncement {
            announcement: "Office closed Friday".to_string(),
            created_by: "admin".to_string(),
        },
    )
    .await
    .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newest = Announcement::create(
        &db.pool,
        &CreateAnnouncement {
            announcement: "Audit next week".to_string(),
            created_by: "admin".to_string(),
        },
    )
    .await
    .unwrap();

    let all = Announcement::find_all(&db.pool).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].announcement, "Office closed Friday");

    let latest = Announcement::find_latest(&db.pool).await.unwrap().unwrap();
    assert_eq!(latest.id, newest.id);
}

#[tokio::test]
async fn test_task_filtering_by_zone_and_branch() {
    let (db, _temp_dir) = setup_db().await;

    for (name, zone, branch, deadline) in [
        ("Renew license", "North", "Gulberg", date(2025, 2, 1)),
        ("Fire drill", "North", "Johar", date(2025, 1, 15)),
        ("Tax filing", "South", "Clifton", date(2025, 3, 1)),
    ] {
        let fields = task(name, zone, branch, deadline).into_fields().unwrap();
        Task::create(&db.pool, &fields).await.unwrap();
    }

    let all = Task::find_filtered(
        &db.pool,
        &TaskFilter {
            zone: Some("All".to_string()),
            branch: Some("All".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].task_name, "Fire drill", "ordered by deadline");

    let north = Task::find_filtered(
        &db.pool,
        &TaskFilter {
            zone: Some("North".to_string()),
            branch: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(north.len(), 2);

    let gulberg = Task::find_filtered(
        &db.pool,
        &TaskFilter {
            zone: Some("North".to_string()),
            branch: Some("Gulberg".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(gulberg.len(), 1);
    assert_eq!(gulberg[0].task_name, "Renew license");
}

#[tokio::test]
async fn test_task_partial_update_and_delete() {
    let (db, _temp_dir) = setup_db().await;
    let fields = task("Renew license", "North", "Gulberg", date(2025, 2, 1))
        .into_fields()
        .unwrap();
    let created = Task::create(&db.pool, &fields).await.unwrap();

    let updated = Task::update(
        &db.pool,
        created.id,
        &UpdateTask {
            deadline: Some(date(2025, 4, 1)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.deadline, date(2025, 4, 1));
    assert_eq!(updated.task_name, "Renew license");
    assert!(updated.updated_at >= created.updated_at);

    assert_eq!(Task::delete(&db.pool, created.id).await.unwrap(), 1);
    assert!(Task::find_by_id(&db.pool, created.id).await.unwrap().is_none());

    let missing = Task::update(&db.pool, created.id, &UpdateTask::default()).await;
    assert!(matches!(missing, Err(sqlx::Error::RowNotFound)));
}

#[tokio::test]
async fn test_designation_names_are_unique() {
    let (db, _temp_dir) = setup_db().await;

    let manager = Designation::create(
        &db.pool,
        &CreateDesignation {
            name: "  Branch Manager ".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(manager.name, "Branch Manager");

    let duplicate = Designation::create(
        &db.pool,
        &CreateDesignation {
            name: "Branch Manager".to_string(),
        },
    )
    .await
    .expect_err("duplicate name must fail");
    assert!(db::is_unique_violation(&duplicate));

    assert_eq!(Designation::find_all(&db.pool).await.unwrap().len(), 1);
    assert_eq!(Designation::delete(&db.pool, manager.id).await.unwrap(), 1);
    assert_eq!(Designation::delete(&db.pool, manager.id).await.unwrap(), 0);
}

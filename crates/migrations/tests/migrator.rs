mod common;

use common::*;
use printdis_migrations::{
    checksum, Catalog, Dialect, Direction, Migration, MigrationError, Migrator, Target,
};

#[tokio::test]
async fn test_fresh_database_reports_version_zero() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);

    assert_eq!(migrator.current_version().await.unwrap(), 0);
    assert!(table_exists(&pool, "schema_versions").await);

    let status = migrator.status().await.unwrap();
    assert_eq!(status.len(), 3);
    assert!(status.iter().all(|row| !row.applied));
}

#[tokio::test]
async fn test_forward_backward_forward_scenario() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);

    let report = migrator.migrate_to(Target::Version(2)).await.unwrap();
    assert_eq!(report.from, 0);
    assert_eq!(report.to, 2);
    assert_eq!(report.applied, vec![1, 2]);
    assert_eq!(migrator.current_version().await.unwrap(), 2);

    let status = migrator.status().await.unwrap();
    let applied: Vec<(i64, bool)> = status.iter().map(|row| (row.version, row.applied)).collect();
    assert_eq!(applied, vec![(1, true), (2, true), (3, false)]);
    assert!(column_exists(&pool, "widgets", "color").await);

    let report = migrator.migrate_to(Target::Version(1)).await.unwrap();
    assert_eq!(report.rolled_back, vec![2]);
    assert_eq!(migrator.current_version().await.unwrap(), 1);
    assert!(table_exists(&pool, "widgets").await);
    assert!(!column_exists(&pool, "widgets", "color").await);

    let report = migrator.migrate_to(Target::from(-1_i64)).await.unwrap();
    assert_eq!(report.applied, vec![2, 3]);
    assert_eq!(migrator.current_version().await.unwrap(), 3);
    assert!(table_exists(&pool, "gadgets").await);
}

#[tokio::test]
async fn test_migrate_to_current_is_noop() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);

    migrator.up().await.unwrap();
    let before = migrator.applied_migrations().await.unwrap();

    let report = migrator.up().await.unwrap();
    assert!(report.is_noop());
    assert_eq!(report.from, 3);
    assert_eq!(report.to, 3);

    let report = migrator.migrate_to(Target::Version(3)).await.unwrap();
    assert!(report.is_noop());

    let after = migrator.applied_migrations().await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_applied_versions_stay_a_prefix() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);

    for target in [2, 3, 1, 0, 3, 2] {
        migrator.migrate_to(Target::Version(target)).await.unwrap();

        let current = migrator.current_version().await.unwrap();
        assert_eq!(current, target);

        let applied = migrator.applied_versions().await.unwrap();
        let expected: Vec<i64> = (1..=current).collect();
        assert_eq!(applied, expected);
    }
}

#[tokio::test]
async fn test_round_trip_matches_single_up() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);
    migrator.up().await.unwrap();
    let first = recorded_state(&migrator).await;

    let report = migrator.migrate_to(Target::Version(0)).await.unwrap();
    assert_eq!(report.rolled_back, vec![3, 2, 1]);
    assert!(migrator.applied_versions().await.unwrap().is_empty());
    assert!(!table_exists(&pool, "widgets").await);
    assert!(!table_exists(&pool, "gadgets").await);

    migrator.up().await.unwrap();
    assert_eq!(recorded_state(&migrator).await, first);
    assert!(table_exists(&pool, "gadgets").await);
    assert!(column_exists(&pool, "widgets", "color").await);
}

#[tokio::test]
async fn test_failed_step_keeps_earlier_steps() {
    let pool = memory_pool().await;
    let catalog = Catalog::new(vec![
        Migration::new(1, "Create widgets", WIDGETS_UP, WIDGETS_DOWN),
        Migration::new(2, "Add widget color", COLOR_UP, COLOR_DOWN),
        Migration::new(
            3,
            "Broken gadgets",
            "CREATE TABLE gadgets (id INTEGER PRIMARY KEY);\nINSERT INTO no_such_table VALUES (1);",
            GADGETS_DOWN,
        ),
        Migration::new(4, "Never reached", "CREATE TABLE sprockets (id INTEGER);", "DROP TABLE sprockets;"),
    ])
    .unwrap();
    let migrator = Migrator::with_catalog(pool.clone(), Dialect::Sqlite, catalog);

    let err = migrator.up().await.unwrap_err();
    match &err {
        MigrationError::StepFailed {
            version, direction, ..
        } => {
            assert_eq!(*version, 3);
            assert_eq!(*direction, Direction::Up);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.version(), Some(3));

    assert_eq!(migrator.current_version().await.unwrap(), 2);
    assert_eq!(migrator.applied_versions().await.unwrap(), vec![1, 2]);
    // The first statement of the failing script was rolled back with it
    assert!(!table_exists(&pool, "gadgets").await);
    assert!(!table_exists(&pool, "sprockets").await);
}

#[tokio::test]
async fn test_missing_rollback_script_stops_backward_path() {
    let pool = memory_pool().await;
    let catalog = Catalog::new(vec![
        Migration::new(1, "Create widgets", WIDGETS_UP, WIDGETS_DOWN),
        Migration::irreversible(2, "Add widget color", COLOR_UP),
        Migration::new(3, "Create gadgets", GADGETS_UP, GADGETS_DOWN),
    ])
    .unwrap();
    let migrator = Migrator::with_catalog(pool.clone(), Dialect::Sqlite, catalog);
    migrator.up().await.unwrap();

    let err = migrator.migrate_to(Target::Version(0)).await.unwrap_err();
    assert!(matches!(err, MigrationError::NoRollback { version: 2 }));

    // Version 3 was unwound before the irreversible step was reached
    assert_eq!(migrator.current_version().await.unwrap(), 2);
    assert!(!table_exists(&pool, "gadgets").await);
    assert!(column_exists(&pool, "widgets", "color").await);
}

#[tokio::test]
async fn test_unknown_target_is_rejected_before_any_change() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);

    let err = migrator.migrate_to(Target::Version(9)).await.unwrap_err();
    assert!(matches!(err, MigrationError::UnknownTarget { target: 9, latest: 3 }));

    let err = migrator.migrate_to(Target::Version(-5)).await.unwrap_err();
    assert!(matches!(err, MigrationError::UnknownTarget { target: -5, .. }));

    assert_eq!(migrator.current_version().await.unwrap(), 0);
    assert!(!table_exists(&pool, "widgets").await);
}

#[tokio::test]
async fn test_empty_catalog_is_a_noop() {
    let pool = memory_pool().await;
    let migrator = Migrator::with_catalog(pool, Dialect::Sqlite, Catalog::new(Vec::new()).unwrap());

    let report = migrator.up().await.unwrap();
    assert!(report.is_noop());
    assert_eq!(report.to, 0);
    assert!(migrator.status().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_status_lists_every_catalog_entry_in_order() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);
    migrator.migrate_to(Target::Version(1)).await.unwrap();

    let status = migrator.status().await.unwrap();
    let versions: Vec<i64> = status.iter().map(|row| row.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
    assert_eq!(status[0].description, "Create widgets");

    let applied = migrator.applied_versions().await.unwrap();
    for row in &status {
        assert_eq!(row.applied, applied.contains(&row.version));
    }
    assert_eq!(migrator.pending_versions().await.unwrap(), vec![2, 3]);
}

#[tokio::test]
async fn test_applied_records_carry_description_timestamp_and_checksum() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);
    migrator.migrate_to(Target::Version(1)).await.unwrap();

    let records = migrator.applied_migrations().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].version, 1);
    assert_eq!(records[0].description, "Create widgets");
    assert_eq!(records[0].checksum, checksum(WIDGETS_UP));
    assert!(records[0].applied_at.is_some());
}

#[tokio::test]
async fn test_validate_passes_for_untouched_catalog() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);

    assert_eq!(migrator.validate().await.unwrap(), 0);
    migrator.up().await.unwrap();
    assert_eq!(migrator.validate().await.unwrap(), 3);
}

#[tokio::test]
async fn test_validate_detects_edited_forward_script() {
    let pool = memory_pool().await;
    widget_migrator(&pool).up().await.unwrap();

    let edited_color = "ALTER TABLE widgets ADD COLUMN colour TEXT;";
    let tampered = Catalog::new(vec![
        Migration::new(1, "Create widgets", WIDGETS_UP, WIDGETS_DOWN),
        Migration::new(2, "Add widget color", edited_color, COLOR_DOWN),
        Migration::new(3, "Create gadgets", GADGETS_UP, GADGETS_DOWN),
    ])
    .unwrap();
    let migrator = Migrator::with_catalog(pool, Dialect::Sqlite, tampered);

    match migrator.validate().await.unwrap_err() {
        MigrationError::ChecksumMismatch {
            version,
            expected,
            actual,
        } => {
            assert_eq!(version, 2);
            assert_eq!(expected, checksum(edited_color));
            assert_eq!(actual, checksum(COLOR_UP));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_validate_reports_missing_checksum_as_mismatch() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool);
    migrator.up().await.unwrap();

    sqlx::query("UPDATE schema_versions SET checksum = NULL, applied_at = NULL WHERE version = 2")
        .execute(&pool)
        .await
        .unwrap();

    let records = migrator.applied_migrations().await.unwrap();
    assert_eq!(records[1].version, 2);
    assert_eq!(records[1].checksum, "");
    assert!(records[1].applied_at.is_none());
    assert!(records[0].applied_at.is_some());

    match migrator.validate().await.unwrap_err() {
        MigrationError::ChecksumMismatch {
            version,
            expected,
            actual,
        } => {
            assert_eq!(version, 2);
            assert_eq!(expected, checksum(COLOR_UP));
            assert_eq!(actual, "");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_validate_rejects_versions_missing_from_catalog() {
    let pool = memory_pool().await;
    widget_migrator(&pool).up().await.unwrap();

    let older = Catalog::new(vec![
        Migration::new(1, "Create widgets", WIDGETS_UP, WIDGETS_DOWN),
        Migration::new(2, "Add widget color", COLOR_UP, COLOR_DOWN),
    ])
    .unwrap();
    let migrator = Migrator::with_catalog(pool, Dialect::Sqlite, older);

    let err = migrator.validate().await.unwrap_err();
    assert!(matches!(err, MigrationError::NotInCatalog { version: 3 }));

    // The database is ahead of this catalog; moving it is refused too
    let err = migrator.up().await.unwrap_err();
    assert!(matches!(err, MigrationError::NotInCatalog { version: 3 }));
}

#[tokio::test]
async fn test_custom_version_table() {
    let pool = memory_pool().await;
    let migrator = widget_migrator(&pool).with_version_table("widget_versions");

    migrator.up().await.unwrap();
    assert!(table_exists(&pool, "widget_versions").await);
    assert!(!table_exists(&pool, "schema_versions").await);
    assert_eq!(migrator.current_version().await.unwrap(), 3);
}

#[tokio::test]
async fn test_unknown_dialect_fails_construction() {
    let pool = memory_pool().await;
    let err = Migrator::from_dialect_name(pool, "oracle").err().unwrap();
    assert!(matches!(err, MigrationError::UnsupportedDialect(name) if name == "oracle"));
}

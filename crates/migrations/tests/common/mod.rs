#![allow(dead_code)]

use printdis_migrations::{connect, Catalog, Dialect, Migration, Migrator};
use sqlx::{AnyPool, Row};

pub const WIDGETS_UP: &str = "CREATE TABLE widgets (id INTEGER PRIMARY KEY, name TEXT NOT NULL);";
pub const WIDGETS_DOWN: &str = "DROP TABLE widgets;";
pub const COLOR_UP: &str = "ALTER TABLE widgets ADD COLUMN color TEXT;\n\
                            CREATE INDEX idx_widgets_color ON widgets(color);";
pub const COLOR_DOWN: &str = "DROP INDEX idx_widgets_color;\n\
                              ALTER TABLE widgets DROP COLUMN color;";
pub const GADGETS_UP: &str =
    "CREATE TABLE gadgets (id INTEGER PRIMARY KEY, widget_id INTEGER REFERENCES widgets(id));";
pub const GADGETS_DOWN: &str = "DROP TABLE gadgets;";

/// Fresh private in-memory database
pub async fn memory_pool() -> AnyPool {
    connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite")
}

/// Three reversible migrations over `widgets` and `gadgets`
pub fn widget_catalog() -> Catalog {
    Catalog::new(vec![
        Migration::new(1, "Create widgets", WIDGETS_UP, WIDGETS_DOWN),
        Migration::new(2, "Add widget color", COLOR_UP, COLOR_DOWN),
        Migration::new(3, "Create gadgets", GADGETS_UP, GADGETS_DOWN),
    ])
    .expect("valid catalog")
}

pub fn widget_migrator(pool: &AnyPool) -> Migrator {
    Migrator::with_catalog(pool.clone(), Dialect::Sqlite, widget_catalog())
}

pub async fn table_exists(pool: &AnyPool, name: &str) -> bool {
    let row = sqlx::query("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("query sqlite_master");
    row.try_get::<i64, _>(0).expect("decode count") > 0
}

pub async fn column_exists(pool: &AnyPool, table: &str, column: &str) -> bool {
    let sql = format!("SELECT COUNT(*) FROM pragma_table_info('{}') WHERE name = ?", table);
    let row = sqlx::query(&sql)
        .bind(column)
        .fetch_one(pool)
        .await
        .expect("query pragma_table_info");
    row.try_get::<i64, _>(0).expect("decode count") > 0
}

pub async fn count_rows(pool: &AnyPool, table: &str) -> i64 {
    let row = sqlx::query(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("count rows");
    row.try_get::<i64, _>(0).expect("decode count")
}

/// (version, checksum) pairs currently recorded
pub async fn recorded_state(migrator: &Migrator) -> Vec<(i64, String)> {
    migrator
        .applied_migrations()
        .await
        .expect("read applied migrations")
        .into_iter()
        .map(|record| (record.version, record.checksum))
        .collect()
}

//! Migration manager against a live database.
//!
//! Each test works inside its own schema (via `search_path`) so the
//! bookkeeping table never collides with the real one.

mod common;

use std::path::Path;
use std::time::{Duration, Instant};

use common::{ctx, migrations_dir, settings, unique};
use roster_db::{CallContext, ConnectionPool, DbError, MigrationState};
use sqlx::migrate::Migrate;
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::Connection;
use tempfile::TempDir;

struct Scratch {
    admin: ConnectionPool,
    pool: ConnectionPool,
    schema: String,
}

impl Scratch {
    async fn new() -> Self {
        let settings = settings();
        let admin = ConnectionPool::initialize(&settings).await.unwrap();
        let schema = format!("migrate_{}", unique());
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(admin.inner())
            .await
            .unwrap();

        let options = settings
            .connect_options()
            .unwrap()
            .options([("search_path", schema.as_str())]);
        let scoped = PgPoolOptions::new()
            .max_connections(3)
            .connect_with(options)
            .await
            .unwrap();

        Self {
            admin,
            pool: ConnectionPool::from_pool(scoped, settings.pool.clone()),
            schema,
        }
    }

    async fn teardown(self) {
        self.pool.close().await;
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(self.admin.inner())
            .await
            .unwrap();
        self.admin.close().await;
    }

    async fn column_exists(&self, table: &str, column: &str) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM information_schema.columns \
             WHERE table_schema = $1 AND table_name = $2 AND column_name = $3)",
        )
        .bind(&self.schema)
        .bind(table)
        .bind(column)
        .fetch_one(self.admin.inner())
        .await
        .unwrap()
    }
}

fn write(dir: &Path, file: &str, sql: &str) {
    std::fs::write(dir.join(file), sql).unwrap();
}

fn widget_migrations() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "1_widgets.up.sql", "CREATE TABLE widgets (id INT PRIMARY KEY);");
    write(dir.path(), "1_widgets.down.sql", "DROP TABLE widgets;");
    write(dir.path(), "2_widget_name.up.sql", "ALTER TABLE widgets ADD COLUMN name TEXT;");
    write(dir.path(), "2_widget_name.down.sql", "ALTER TABLE widgets DROP COLUMN name;");
    dir
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_apply_is_idempotent_and_rolls_back_one_at_a_time() {
    let scratch = Scratch::new().await;
    let manager = scratch.pool.migrations();
    let ctx = ctx();
    let dir = widget_migrations();

    assert_eq!(
        manager.current_version(&ctx, dir.path()).await.unwrap(),
        MigrationState::default()
    );

    assert_eq!(manager.run_migrations(&ctx, dir.path()).await.unwrap(), vec![1, 2]);
    assert!(scratch.column_exists("widgets", "name").await);

    // Second run is a no-op.
    assert!(manager.run_migrations(&ctx, dir.path()).await.unwrap().is_empty());
    let state = manager.current_version(&ctx, dir.path()).await.unwrap();
    assert_eq!(state, MigrationState { version: Some(2), dirty: false });

    assert_eq!(manager.rollback_one(&ctx, dir.path()).await.unwrap(), Some(2));
    assert!(!scratch.column_exists("widgets", "name").await);
    assert_eq!(
        manager.current_version(&ctx, dir.path()).await.unwrap().version,
        Some(1)
    );

    assert_eq!(manager.rollback_one(&ctx, dir.path()).await.unwrap(), Some(1));
    assert!(!scratch.column_exists("widgets", "id").await);
    assert_eq!(manager.current_version(&ctx, dir.path()).await.unwrap().version, None);

    assert_eq!(manager.rollback_one(&ctx, dir.path()).await.unwrap(), None);

    scratch.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_failed_migration_leaves_dirty_state_until_forced() {
    let scratch = Scratch::new().await;
    let manager = scratch.pool.migrations();
    let ctx = ctx();
    let dir = widget_migrations();
    write(dir.path(), "3_broken.up.sql", "ALTER TABLE missing_table ADD COLUMN x INT;");
    write(dir.path(), "3_broken.down.sql", "SELECT 1;");

    let err = manager.run_migrations(&ctx, dir.path()).await.unwrap_err();
    assert!(matches!(err, DbError::MigrationDirty { version: 3, .. }));

    let state = manager.current_version(&ctx, dir.path()).await.unwrap();
    assert_eq!(state, MigrationState { version: Some(3), dirty: true });

    // Dirty blocks both directions.
    assert!(manager.run_migrations(&ctx, dir.path()).await.unwrap_err().is_migration_dirty());
    assert!(manager.rollback_one(&ctx, dir.path()).await.unwrap_err().is_migration_dirty());

    manager.force(&ctx, dir.path(), Some(2)).await.unwrap();
    let state = manager.current_version(&ctx, dir.path()).await.unwrap();
    assert_eq!(state, MigrationState { version: Some(2), dirty: false });

    scratch.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_force_rejects_unknown_version() {
    let scratch = Scratch::new().await;
    let manager = scratch.pool.migrations();
    let ctx = ctx();
    let dir = widget_migrations();

    assert!(manager.force(&ctx, dir.path(), Some(42)).await.is_err());
    manager.force(&ctx, dir.path(), None).await.unwrap();
    assert_eq!(
        manager.current_version(&ctx, dir.path()).await.unwrap(),
        MigrationState::default()
    );

    scratch.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_project_migrations_apply_and_revert_cleanly() {
    let scratch = Scratch::new().await;
    let manager = scratch.pool.migrations();
    let ctx = ctx();
    let dir = migrations_dir();

    let applied = manager.run_migrations(&ctx, &dir).await.unwrap();
    assert_eq!(applied, vec![1, 2]);
    assert!(scratch.column_exists("employees", "manager_id").await);

    while manager.rollback_one(&ctx, &dir).await.unwrap().is_some() {}
    assert!(!scratch.column_exists("employees", "id").await);
    assert!(!scratch.column_exists("sites", "id").await);

    scratch.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_waiting_for_a_held_migration_lock_times_out() {
    let scratch = Scratch::new().await;
    let dir = widget_migrations();

    // Another migrator's session holds the lock.
    let options = settings().connect_options().unwrap();
    let mut holder = PgConnection::connect_with(&options).await.unwrap();
    holder.lock().await.unwrap();

    // No caller deadline: the manager's default bounds the wait.
    let manager = scratch
        .pool
        .migrations()
        .with_default_timeout(Duration::from_millis(500));
    let started = Instant::now();
    let err = manager
        .run_migrations(&CallContext::background(), dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Timeout { operation: "run_migrations" }));
    assert!(started.elapsed() >= Duration::from_millis(450));

    // A caller deadline bounds it too.
    let err = scratch
        .pool
        .migrations()
        .force(&CallContext::with_timeout(Duration::from_millis(300)), dir.path(), None)
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    holder.unlock().await.unwrap();
    holder.close().await.unwrap();

    let applied = scratch.pool.migrations().run_migrations(&ctx(), dir.path()).await.unwrap();
    assert_eq!(applied, vec![1, 2]);

    scratch.teardown().await;
}

//! # Database Migrations
//!
//! Versioned SQL change-sets applied from a directory at runtime.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  run_migrations(ctx, "migrations/postgres")                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sqlx Migrator resolves {version}_{name}.up.sql / .down.sql            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Dedicated connection + sqlx migration lock (one migrator at a time)   │
//! │       │                                                                 │
//! │       ├── schema_migrations missing? Create it                         │
//! │       ├── dirty? ──► MigrationDirty (operator runs `migrate force`)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  For every version above the recorded one:                             │
//! │       │   1. record (v, dirty = true)                                  │
//! │       │   2. BEGIN; run up.sql; record (v, dirty = false); COMMIT      │
//! │       │      failure between 1 and 2 leaves the state dirty           │
//! │       ▼                                                                 │
//! │  Close the connection (releases the lock)                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bookkeeping
//! `schema_migrations(version BIGINT PRIMARY KEY, dirty BOOLEAN NOT NULL)`
//! holds at most one row. No row means no migration has been applied.
//!
//! ## Adding New Migrations
//!
//! 1. Run `migrate create <name>` to scaffold an empty up/down pair
//! 2. Put the forward change in `.up.sql` and its reverse in `.down.sql`
//! 3. **NEVER** modify applied migrations - always add new ones
//!
//! ## Timeouts
//! Every entry point runs under the caller's deadline, or
//! [`DEFAULT_MIGRATION_TIMEOUT`] when the context has none. Waiting for the
//! lock held by another migrator counts against that deadline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::migrate::{Migrate, MigrationType, Migrator};
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::{debug, info, warn};

use crate::context::CallContext;
use crate::error::{DbError, DbResult};
use crate::pool::ConnectionPool;

/// Name of the bookkeeping table.
pub const MIGRATIONS_TABLE: &str = "schema_migrations";

/// Bound applied to a migration call whose context has no deadline.
pub const DEFAULT_MIGRATION_TIMEOUT: Duration = Duration::from_secs(300);

const UP_SUFFIX: &str = ".up.sql";
const DOWN_SUFFIX: &str = ".down.sql";

// =============================================================================
// Migration Source
// =============================================================================

/// One change-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: u64,
    pub name: String,
    pub up_sql: String,
    pub down_sql: Option<String>,
}

/// All change-sets found in a directory, ordered by version.
#[derive(Debug, Clone, Default)]
pub struct MigrationSource {
    migrations: Vec<Migration>,
}

impl MigrationSource {
    /// Resolves `path` with sqlx's [`Migrator`] and pairs up and down files
    /// by version.
    ///
    /// Files that are not `{version}_{name}.up.sql`, `.down.sql` or `.sql`
    /// are ignored. A plain `.sql` file is an up migration without a down.
    ///
    /// ## Errors
    /// * `DbError::MigrationSource` - unreadable directory or file, a
    ///   version prefix that is not an integer, two files for the same
    ///   version and direction, a down file with no up file, or a negative
    ///   version
    pub async fn discover(path: &Path) -> DbResult<Self> {
        let source_error = |reason: String| DbError::MigrationSource {
            path: path.display().to_string(),
            reason,
        };

        let migrator = Migrator::new(path)
            .await
            .map_err(|e| source_error(e.to_string()))?;

        let mut found: BTreeMap<u64, (String, Option<String>, Option<String>)> = BTreeMap::new();

        for file in migrator.iter() {
            let version = u64::try_from(file.version)
                .map_err(|_| source_error(format!("version {} is negative", file.version)))?;

            let slot = found.entry(version).or_default();
            let (direction, target) = match file.migration_type {
                MigrationType::ReversibleDown => ("down", &mut slot.2),
                _ => {
                    slot.0 = file.description.to_string();
                    ("up", &mut slot.1)
                }
            };
            if target.is_some() {
                return Err(source_error(format!(
                    "duplicate {direction} migration for version {version}"
                )));
            }
            *target = Some(file.sql.to_string());
        }

        let mut migrations = Vec::with_capacity(found.len());
        for (version, (name, up_sql, down_sql)) in found {
            let up_sql = up_sql.ok_or_else(|| {
                source_error(format!("version {version} has a down file but no up file"))
            })?;
            migrations.push(Migration {
                version,
                name,
                up_sql,
                down_sql,
            });
        }

        debug!(path = %path.display(), count = migrations.len(), "Discovered migrations");
        Ok(MigrationSource { migrations })
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn get(&self, version: u64) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.version == version)
    }

    pub fn latest(&self) -> Option<u64> {
        self.migrations.last().map(|m| m.version)
    }

    /// Change-sets above `current`, in ascending order.
    pub fn pending(&self, current: Option<u64>) -> Vec<&Migration> {
        self.migrations
            .iter()
            .filter(|m| current.map_or(true, |v| m.version > v))
            .collect()
    }

    /// Highest version below `version`, if any.
    pub fn previous_version(&self, version: u64) -> Option<u64> {
        self.migrations
            .iter()
            .map(|m| m.version)
            .filter(|v| *v < version)
            .last()
    }
}

/// Lowercases `name` and turns every run of other characters into one `_`.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            normalized.push(c.to_ascii_lowercase());
        } else if !normalized.ends_with('_') {
            normalized.push('_');
        }
    }
    normalized.trim_matches('_').to_string()
}

/// Writes an empty `{version}_{name}.up.sql` / `.down.sql` pair into `dir`.
///
/// ## Errors
/// * `DbError::MigrationFailed` - the name normalizes to nothing, or either
///   file already exists
pub async fn scaffold(dir: &Path, name: &str, version: u64) -> DbResult<(PathBuf, PathBuf)> {
    let name = normalize_name(name);
    if name.is_empty() {
        return Err(DbError::MigrationFailed(
            "migration name must contain letters or digits".to_string(),
        ));
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DbError::MigrationFailed(format!("cannot create {}: {e}", dir.display())))?;

    let up = dir.join(format!("{version}_{name}{UP_SUFFIX}"));
    let down = dir.join(format!("{version}_{name}{DOWN_SUFFIX}"));

    for path in [&up, &down] {
        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| {
                DbError::MigrationFailed(format!("cannot create {}: {e}", path.display()))
            })?;
    }

    Ok((up, down))
}

/// [`scaffold`] with the current Unix time as version. Needs no database.
pub async fn create_migration(dir: &Path, name: &str) -> DbResult<(PathBuf, PathBuf)> {
    let version = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
    let files = scaffold(dir, name, version).await?;
    info!(version, up = %files.0.display(), "Migration files created");
    Ok(files)
}

/// Change-sets made only of blank lines and `--` comments are skipped.
fn is_blank_sql(sql: &str) -> bool {
    sql.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

// =============================================================================
// Migration State
// =============================================================================

/// What `schema_migrations` currently records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationState {
    /// Last applied version; `None` when nothing has been applied.
    pub version: Option<u64>,
    /// Set when an apply or rollback was interrupted mid-change-set.
    pub dirty: bool,
}

impl MigrationState {
    fn ensure_clean(&self) -> DbResult<()> {
        if self.dirty {
            return Err(DbError::MigrationDirty {
                version: self.version.unwrap_or(0),
                reason: "a previous migration failed; repair the schema and run `migrate force`"
                    .to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Migration Manager
// =============================================================================

/// Applies and reverts change-sets against the pool's database.
///
/// ## Usage
/// ```rust,ignore
/// let ctx = CallContext::with_timeout(Duration::from_secs(60));
/// let applied = pool.migrations().run_migrations(&ctx, "migrations/postgres".as_ref()).await?;
/// info!(?applied, "Schema up to date");
/// ```
#[derive(Debug, Clone)]
pub struct MigrationManager {
    pool: ConnectionPool,
    default_timeout: Duration,
}

impl MigrationManager {
    pub fn new(pool: ConnectionPool) -> Self {
        MigrationManager {
            pool,
            default_timeout: DEFAULT_MIGRATION_TIMEOUT,
        }
    }

    /// Replaces [`DEFAULT_MIGRATION_TIMEOUT`] for calls without a deadline.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Applies every pending change-set in `path`, in version order.
    ///
    /// ## Returns
    /// * `Ok(versions)` - Versions applied by this call; empty when the
    ///   schema was already current
    /// * `Err(DbError::MigrationDirty)` - The state was dirty before the
    ///   call, or a change-set failed during it
    pub async fn run_migrations(&self, ctx: &CallContext, path: &Path) -> DbResult<Vec<u64>> {
        let source = MigrationSource::discover(path).await?;
        let ctx = &ctx.or_timeout(self.default_timeout);

        ctx.run("run_migrations", async {
            let mut conn = self.lock(ctx).await?;
            let result = apply_pending(&mut conn, &source).await;
            unlock(conn).await;
            result
        })
        .await
    }

    /// Reverts the most recently applied change-set with its down file.
    ///
    /// ## Returns
    /// * `Ok(Some(version))` - The version that was reverted
    /// * `Ok(None)` - Nothing was applied
    pub async fn rollback_one(&self, ctx: &CallContext, path: &Path) -> DbResult<Option<u64>> {
        let source = MigrationSource::discover(path).await?;
        let ctx = &ctx.or_timeout(self.default_timeout);

        ctx.run("rollback_migration", async {
            let mut conn = self.lock(ctx).await?;
            let result = revert_latest(&mut conn, &source, path).await;
            unlock(conn).await;
            result
        })
        .await
    }

    /// Reports the recorded version and dirty flag without changing them.
    ///
    /// A database that has never been migrated reports `version: None`; the
    /// bookkeeping table is not created.
    pub async fn current_version(&self, ctx: &CallContext, path: &Path) -> DbResult<MigrationState> {
        MigrationSource::discover(path).await?;
        let ctx = &ctx.or_timeout(self.default_timeout);

        let mut conn = self.pool.acquire(ctx).await?;
        ctx.run("current_version", async {
            if !table_exists(&mut conn).await? {
                return Ok(MigrationState::default());
            }
            read_state(&mut conn).await
        })
        .await
    }

    /// Records `version` (or no version) as clean without running any SQL.
    ///
    /// Operator remediation after a failed migration has been repaired by
    /// hand.
    pub async fn force(&self, ctx: &CallContext, path: &Path, version: Option<u64>) -> DbResult<()> {
        let source = MigrationSource::discover(path).await?;

        if let Some(v) = version {
            if source.get(v).is_none() {
                return Err(DbError::MigrationSource {
                    path: path.display().to_string(),
                    reason: format!("no migration with version {v}"),
                });
            }
        }

        let ctx = &ctx.or_timeout(self.default_timeout);
        ctx.run("force_migration", async {
            let mut conn = self.lock(ctx).await?;
            let result = async {
                ensure_table(&mut conn).await?;
                record_state(&mut conn, version, false).await
            }
            .await;
            unlock(conn).await;
            result
        })
        .await?;

        warn!(?version, "Migration version forced");
        Ok(())
    }

    /// Scaffolds an empty up/down pair versioned with the current Unix time.
    pub async fn create(&self, path: &Path, name: &str) -> DbResult<(PathBuf, PathBuf)> {
        create_migration(path, name).await
    }

    /// A connection outside the pool holding the sqlx migration lock.
    ///
    /// The lock is a session-level advisory lock keyed on the database name,
    /// so dropping the connection also releases it.
    async fn lock(&self, ctx: &CallContext) -> DbResult<PgConnection> {
        let mut conn = self.pool.acquire(ctx).await?.detach();

        Migrate::lock(&mut conn)
            .await
            .map_err(|e| DbError::MigrationFailed(format!("cannot acquire migration lock: {e}")))?;

        debug!("Migration lock acquired");
        Ok(conn)
    }
}

async fn unlock(mut conn: PgConnection) {
    if let Err(e) = Migrate::unlock(&mut conn).await {
        warn!(error = %e, "Releasing migration lock failed");
    }
    if let Err(e) = conn.close().await {
        warn!(error = %e, "Closing migration connection failed");
    }
}

async fn apply_pending(conn: &mut PgConnection, source: &MigrationSource) -> DbResult<Vec<u64>> {
    ensure_table(conn).await?;
    let state = read_state(conn).await?;
    state.ensure_clean()?;

    let pending = source.pending(state.version);
    if pending.is_empty() {
        info!(version = ?state.version, "No pending migrations");
        return Ok(Vec::new());
    }

    let mut applied = Vec::with_capacity(pending.len());
    for migration in pending {
        info!(version = migration.version, name = %migration.name, "Applying migration");
        run_change_set(conn, migration.version, &migration.up_sql, Some(migration.version))
            .await?;
        applied.push(migration.version);
    }

    info!(count = applied.len(), version = ?applied.last(), "Migrations applied");
    Ok(applied)
}

async fn revert_latest(
    conn: &mut PgConnection,
    source: &MigrationSource,
    path: &Path,
) -> DbResult<Option<u64>> {
    ensure_table(conn).await?;
    let state = read_state(conn).await?;
    state.ensure_clean()?;

    let Some(current) = state.version else {
        info!("No applied migration to roll back");
        return Ok(None);
    };

    let migration = source.get(current).ok_or_else(|| {
        DbError::MigrationFailed(format!(
            "version {current} is applied but has no migration in {}",
            path.display()
        ))
    })?;
    let down_sql = migration.down_sql.as_deref().ok_or_else(|| {
        DbError::MigrationFailed(format!("migration {current} has no down file"))
    })?;
    let previous = source.previous_version(current);

    info!(version = current, name = %migration.name, "Rolling back migration");
    run_change_set(conn, current, down_sql, previous).await?;
    info!(version = ?previous, "Migration rolled back");

    Ok(Some(current))
}

/// Marks `version` dirty, then runs `sql` and records `record_after` as
/// clean in one transaction. Any failure after the dirty mark leaves it set.
async fn run_change_set(
    conn: &mut PgConnection,
    version: u64,
    sql: &str,
    record_after: Option<u64>,
) -> DbResult<()> {
    record_state(conn, Some(version), true).await?;

    let dirty = |reason: String| DbError::MigrationDirty { version, reason };

    let mut tx = conn.begin().await.map_err(|e| dirty(e.to_string()))?;
    if !is_blank_sql(sql) {
        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| dirty(e.to_string()))?;
    }
    write_state(&mut tx, record_after, false)
        .await
        .map_err(|e| dirty(e.to_string()))?;
    tx.commit().await.map_err(|e| dirty(e.to_string()))?;

    Ok(())
}

async fn ensure_table(conn: &mut PgConnection) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations \
         (version BIGINT NOT NULL PRIMARY KEY, dirty BOOLEAN NOT NULL)",
    )
    .execute(&mut *conn)
    .await
    .map_err(|e| bookkeeping("create", e))?;
    Ok(())
}

async fn table_exists(conn: &mut PgConnection) -> DbResult<bool> {
    sqlx::query_scalar::<_, bool>("SELECT to_regclass($1) IS NOT NULL")
        .bind(MIGRATIONS_TABLE)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| bookkeeping("inspect", e))
}

async fn read_state(conn: &mut PgConnection) -> DbResult<MigrationState> {
    let row: Option<(i64, bool)> =
        sqlx::query_as("SELECT version, dirty FROM schema_migrations LIMIT 1")
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| bookkeeping("read", e))?;

    Ok(match row {
        Some((version, dirty)) => MigrationState {
            version: Some(u64::try_from(version).map_err(|_| {
                DbError::MigrationFailed(format!("recorded version {version} is negative"))
            })?),
            dirty,
        },
        None => MigrationState::default(),
    })
}

/// Replaces the recorded state in its own transaction.
async fn record_state(conn: &mut PgConnection, version: Option<u64>, dirty: bool) -> DbResult<()> {
    let mut tx = conn.begin().await.map_err(|e| bookkeeping("write", e))?;
    write_state(&mut tx, version, dirty)
        .await
        .map_err(|e| bookkeeping("write", e))?;
    tx.commit().await.map_err(|e| bookkeeping("write", e))
}

async fn write_state(
    conn: &mut PgConnection,
    version: Option<u64>,
    dirty: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM schema_migrations")
        .execute(&mut *conn)
        .await?;

    if let Some(version) = version {
        let version = i64::try_from(version).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query("INSERT INTO schema_migrations (version, dirty) VALUES ($1, $2)")
            .bind(version)
            .bind(dirty)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

fn bookkeeping(action: &str, err: sqlx::Error) -> DbError {
    DbError::MigrationFailed(format!("cannot {action} {MIGRATIONS_TABLE}: {err}"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, sql: &str) {
        fs::write(dir.join(name), sql).unwrap();
    }

    #[tokio::test]
    async fn test_discover_orders_and_pairs_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "10_second.up.sql", "CREATE TABLE b ();");
        write(dir.path(), "2_first.up.sql", "CREATE TABLE a ();");
        write(dir.path(), "2_first.down.sql", "DROP TABLE a;");
        write(dir.path(), "notes.txt", "ignored");
        write(dir.path(), "1.up.sql", "ignored too");

        let source = MigrationSource::discover(dir.path()).await.unwrap();
        let versions: Vec<u64> = source.migrations().iter().map(|m| m.version).collect();

        assert_eq!(versions, vec![2, 10]);
        assert_eq!(source.migrations()[0].name, "first");
        assert_eq!(source.migrations()[0].down_sql.as_deref(), Some("DROP TABLE a;"));
        assert!(source.migrations()[1].down_sql.is_none());
        assert_eq!(source.latest(), Some(10));
    }

    #[tokio::test]
    async fn test_empty_directory_has_no_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let source = MigrationSource::discover(dir.path()).await.unwrap();

        assert!(source.migrations().is_empty());
        assert!(source.pending(None).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1_a.up.sql", "SELECT 1;");
        write(dir.path(), "1_b.up.sql", "SELECT 2;");

        let err = MigrationSource::discover(dir.path()).await.unwrap_err();
        assert!(matches!(err, DbError::MigrationSource { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_down_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1_a.up.sql", "SELECT 1;");
        write(dir.path(), "1_a.down.sql", "SELECT 1;");
        write(dir.path(), "1_b.down.sql", "SELECT 2;");

        let err = MigrationSource::discover(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("duplicate down migration for version 1"));
    }

    #[tokio::test]
    async fn test_plain_sql_file_is_up_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "4_seed_lookup.sql", "INSERT INTO t VALUES (1);");

        let source = MigrationSource::discover(dir.path()).await.unwrap();
        let migration = source.get(4).unwrap();

        assert_eq!(migration.up_sql, "INSERT INTO t VALUES (1);");
        assert!(migration.down_sql.is_none());
    }

    #[tokio::test]
    async fn test_down_without_up_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "3_orphan.down.sql", "DROP TABLE x;");

        let err = MigrationSource::discover(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("version 3 has a down file but no up file"));
    }

    #[tokio::test]
    async fn test_oversized_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "18446744073709551615_huge.up.sql", "SELECT 1;");

        let err = MigrationSource::discover(dir.path()).await.unwrap_err();
        assert!(matches!(err, DbError::MigrationSource { .. }));
    }

    #[tokio::test]
    async fn test_missing_directory_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = MigrationSource::discover(&missing).await.unwrap_err();
        assert!(matches!(err, DbError::MigrationSource { .. }));
    }

    #[tokio::test]
    async fn test_pending_and_previous_versions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1_a.up.sql", "SELECT 1;");
        write(dir.path(), "2_b.up.sql", "SELECT 1;");
        write(dir.path(), "5_c.up.sql", "SELECT 1;");
        let source = MigrationSource::discover(dir.path()).await.unwrap();

        let pending = |current| {
            source
                .pending(current)
                .iter()
                .map(|m| m.version)
                .collect::<Vec<_>>()
        };
        assert_eq!(pending(None), vec![1, 2, 5]);
        assert_eq!(pending(Some(1)), vec![2, 5]);
        assert_eq!(pending(Some(3)), vec![5]);
        assert!(pending(Some(5)).is_empty());

        assert_eq!(source.previous_version(5), Some(2));
        assert_eq!(source.previous_version(1), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Add Employee Index"), "add_employee_index");
        assert_eq!(normalize_name("  drop--old   table! "), "drop_old_table");
        assert_eq!(normalize_name("***"), "");
    }

    #[tokio::test]
    async fn test_scaffold_writes_discoverable_pair() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("migrations");

        let (up, down) = scaffold(&target, "Add Sites", 1_700_000_000).await.unwrap();
        assert!(up.ends_with("1700000000_add_sites.up.sql"));
        assert!(down.ends_with("1700000000_add_sites.down.sql"));

        let source = MigrationSource::discover(&target).await.unwrap();
        assert_eq!(source.latest(), Some(1_700_000_000));
        assert!(is_blank_sql(&source.migrations()[0].up_sql));

        // Same version again must not overwrite.
        assert!(scaffold(&target, "add sites", 1_700_000_000).await.is_err());
    }

    #[tokio::test]
    async fn test_scaffold_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scaffold(dir.path(), "  ", 1).await.is_err());
    }

    #[test]
    fn test_dirty_state_blocks() {
        let dirty = MigrationState {
            version: Some(4),
            dirty: true,
        };
        assert!(dirty.ensure_clean().unwrap_err().is_migration_dirty());
        assert!(MigrationState::default().ensure_clean().is_ok());
    }

    #[test]
    fn test_blank_sql_detection() {
        assert!(is_blank_sql(""));
        assert!(is_blank_sql("-- nothing yet\n\n"));
        assert!(!is_blank_sql("-- add column\nALTER TABLE sites ADD COLUMN x INT;"));
    }
}

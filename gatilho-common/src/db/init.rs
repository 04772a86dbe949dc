//! Database initialization
//!
//! Opens (or creates) the SQLite store and creates every table the
//! pipeline writes to. Schema creation is idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the database file, creating it and its schema if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers while a sequencer writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with schema, for tests and demos
///
/// Every SQLite `:memory:` connection is its own database, so the pool is
/// pinned to one connection.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    // Foreign keys are per-connection in SQLite
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    create_analyses_table(pool).await?;
    create_mental_drivers_table(pool).await?;
    create_objections_table(pool).await?;
    create_provi_systems_table(pool).await?;
    create_reports_table(pool).await?;

    info!("Database tables initialized (analyses, mental_drivers, objections, provi_systems, reports)");

    Ok(())
}

async fn create_analyses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
            id TEXT PRIMARY KEY,
            product_name TEXT NOT NULL,
            target_audience TEXT NOT NULL,
            competitors TEXT,
            additional_details TEXT,
            analysis_type TEXT NOT NULL DEFAULT 'complete',
            priority TEXT NOT NULL DEFAULT 'normal',
            status TEXT NOT NULL DEFAULT 'queued',
            progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
            current_phase TEXT NOT NULL DEFAULT 'PENDING',
            quality_score INTEGER NOT NULL DEFAULT 0,
            word_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            completed_at TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_analyses_created_at ON analyses(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_mental_drivers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mental_drivers (
            id TEXT PRIMARY KEY,
            analysis_id TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
            driver_name TEXT NOT NULL,
            driver_category TEXT NOT NULL,
            trigger_phrase TEXT NOT NULL,
            activation_phrase TEXT NOT NULL,
            effectiveness_score INTEGER NOT NULL,
            examples TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_mental_drivers_analysis ON mental_drivers(analysis_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_objections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS objections (
            id TEXT PRIMARY KEY,
            analysis_id TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
            objection_type TEXT NOT NULL,
            objection_content TEXT NOT NULL,
            frequency_percentage INTEGER NOT NULL,
            is_hidden INTEGER NOT NULL DEFAULT 0,
            neutralization_strategy TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_objections_analysis ON objections(analysis_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_provi_systems_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS provi_systems (
            id TEXT PRIMARY KEY,
            analysis_id TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
            provi_name TEXT NOT NULL,
            concept TEXT NOT NULL,
            materials TEXT NOT NULL DEFAULT '[]',
            execution_steps TEXT NOT NULL,
            impact_level TEXT NOT NULL,
            memorability_score INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_provi_systems_analysis ON provi_systems(analysis_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_reports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id TEXT PRIMARY KEY,
            analysis_id TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
            executive_summary TEXT NOT NULL,
            psychological_analysis TEXT NOT NULL,
            objection_framework TEXT NOT NULL,
            provi_system TEXT NOT NULL,
            market_intelligence TEXT NOT NULL,
            implementation_roadmap TEXT NOT NULL,
            success_metrics TEXT NOT NULL,
            full_report_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_analysis ON reports(analysis_id)")
        .execute(pool)
        .await?;

    Ok(())
}

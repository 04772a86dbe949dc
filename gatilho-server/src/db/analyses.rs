//! Analysis record persistence
//!
//! The sequencer writes progress and phase at every phase entry, so the
//! stored record always reflects the last phase reached.

use gatilho_common::db::{AnalysisRequest, AnalysisStatus, AnalysisType, Priority};
use gatilho_common::{time, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const SELECT_COLUMNS: &str = r#"
    SELECT id, product_name, target_audience, competitors, additional_details,
           analysis_type, priority, status, progress, current_phase,
           quality_score, word_count, created_at, completed_at, updated_at
    FROM analyses
"#;

/// Insert a new analysis record
pub async fn insert_analysis(pool: &SqlitePool, analysis: &AnalysisRequest) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO analyses (
            id, product_name, target_audience, competitors, additional_details,
            analysis_type, priority, status, progress, current_phase,
            quality_score, word_count, created_at, completed_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(analysis.id.to_string())
    .bind(&analysis.product_name)
    .bind(&analysis.target_audience)
    .bind(&analysis.competitors)
    .bind(&analysis.additional_details)
    .bind(analysis.analysis_type.as_str())
    .bind(analysis.priority.as_str())
    .bind(analysis.status.as_str())
    .bind(i64::from(analysis.progress))
    .bind(&analysis.current_phase)
    .bind(analysis.quality_score)
    .bind(analysis.word_count)
    .bind(time::to_db(&analysis.created_at))
    .bind(analysis.completed_at.as_ref().map(time::to_db))
    .bind(time::to_db(&analysis.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one analysis by ID
pub async fn load_analysis(pool: &SqlitePool, id: Uuid) -> Result<Option<AnalysisRequest>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_analysis).transpose()
}

/// All analyses, newest first
pub async fn list_analyses(pool: &SqlitePool) -> Result<Vec<AnalysisRequest>> {
    let rows = sqlx::query(&format!("{} ORDER BY created_at DESC", SELECT_COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_analysis).collect()
}

/// Move a queued record into processing at its first phase
pub async fn mark_processing(pool: &SqlitePool, id: Uuid, phase: &str, progress: u8) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE analyses
        SET status = ?, current_phase = ?, progress = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(AnalysisStatus::Processing.as_str())
    .bind(phase)
    .bind(i64::from(progress))
    .bind(time::to_db(&time::now()))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    expect_one_row(result.rows_affected(), id)
}

/// Record phase entry
pub async fn update_phase(pool: &SqlitePool, id: Uuid, phase: &str, progress: u8) -> Result<()> {
    let result = sqlx::query(
        "UPDATE analyses SET current_phase = ?, progress = ?, updated_at = ? WHERE id = ?",
    )
    .bind(phase)
    .bind(i64::from(progress))
    .bind(time::to_db(&time::now()))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    expect_one_row(result.rows_affected(), id)
}

/// Terminal success: progress 100 plus the report scalars
pub async fn mark_completed(
    pool: &SqlitePool,
    id: Uuid,
    phase: &str,
    quality_score: i64,
    word_count: i64,
) -> Result<()> {
    let now = time::to_db(&time::now());
    let result = sqlx::query(
        r#"
        UPDATE analyses
        SET status = ?, current_phase = ?, progress = 100,
            quality_score = ?, word_count = ?, completed_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(AnalysisStatus::Completed.as_str())
    .bind(phase)
    .bind(quality_score)
    .bind(word_count)
    .bind(&now)
    .bind(&now)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    expect_one_row(result.rows_affected(), id)
}

/// Terminal failure; progress keeps the last phase reached
pub async fn mark_error(pool: &SqlitePool, id: Uuid, phase: &str) -> Result<()> {
    let result = sqlx::query(
        "UPDATE analyses SET status = ?, current_phase = ?, updated_at = ? WHERE id = ?",
    )
    .bind(AnalysisStatus::Error.as_str())
    .bind(phase)
    .bind(time::to_db(&time::now()))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    expect_one_row(result.rows_affected(), id)
}

/// Delete an analysis and, through the foreign keys, its children
///
/// Returns false when no record had this ID.
pub async fn delete_analysis(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM analyses WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn expect_one_row(rows_affected: u64, id: Uuid) -> Result<()> {
    if rows_affected == 0 {
        return Err(Error::NotFound(format!("Analysis not found: {}", id)));
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::InvalidRecord(format!("Invalid UUID '{}': {}", value, e)))
}

fn row_to_analysis(row: &SqliteRow) -> Result<AnalysisRequest> {
    let id: String = row.get("id");
    let progress: i64 = row.get("progress");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let analysis_type: String = row.get("analysis_type");
    let priority: String = row.get("priority");
    let status: String = row.get("status");

    Ok(AnalysisRequest {
        id: parse_uuid(&id)?,
        product_name: row.get("product_name"),
        target_audience: row.get("target_audience"),
        competitors: row.get("competitors"),
        additional_details: row.get("additional_details"),
        analysis_type: AnalysisType::parse(&analysis_type)?,
        priority: Priority::parse(&priority)?,
        status: AnalysisStatus::parse(&status)?,
        progress: u8::try_from(progress)
            .map_err(|_| Error::InvalidRecord(format!("Progress out of range: {}", progress)))?,
        current_phase: row.get("current_phase"),
        quality_score: row.get("quality_score"),
        word_count: row.get("word_count"),
        created_at: time::from_db(&created_at)?,
        completed_at: time::from_db_opt(row.get("completed_at"))?,
        updated_at: time::from_db(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatilho_common::db::{init_memory_database, PENDING_PHASE};

    fn sample(product: &str) -> AnalysisRequest {
        AnalysisRequest::new(
            product,
            "Empreendedores",
            Some("ConcA, ConcB".to_string()),
            None,
            AnalysisType::Complete,
            Priority::High,
        )
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let pool = init_memory_database().await.unwrap();
        let analysis = sample("Curso X");
        insert_analysis(&pool, &analysis).await.unwrap();

        let loaded = load_analysis(&pool, analysis.id).await.unwrap().unwrap();
        assert_eq!(loaded.product_name, "Curso X");
        assert_eq!(loaded.priority, Priority::High);
        assert_eq!(loaded.status, AnalysisStatus::Queued);
        assert_eq!(loaded.current_phase, PENDING_PHASE);
        assert!(loaded.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_load_unknown_returns_none() {
        let pool = init_memory_database().await.unwrap();
        assert!(load_analysis(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_updates() {
        let pool = init_memory_database().await.unwrap();
        let analysis = sample("Curso X");
        insert_analysis(&pool, &analysis).await.unwrap();

        mark_processing(&pool, analysis.id, "INITIALIZATION", 5).await.unwrap();
        update_phase(&pool, analysis.id, "DATA_COLLECTION", 15).await.unwrap();
        let loaded = load_analysis(&pool, analysis.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, AnalysisStatus::Processing);
        assert_eq!(loaded.progress, 15);

        mark_completed(&pool, analysis.id, "COMPLETE", 95, 12_000).await.unwrap();
        let loaded = load_analysis(&pool, analysis.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, AnalysisStatus::Completed);
        assert_eq!(loaded.progress, 100);
        assert_eq!(loaded.quality_score, 95);
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_error_keeps_progress() {
        let pool = init_memory_database().await.unwrap();
        let analysis = sample("Curso X");
        insert_analysis(&pool, &analysis).await.unwrap();

        update_phase(&pool, analysis.id, "AI_ANALYSIS", 35).await.unwrap();
        mark_error(&pool, analysis.id, "ERROR").await.unwrap();

        let loaded = load_analysis(&pool, analysis.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, AnalysisStatus::Error);
        assert_eq!(loaded.current_phase, "ERROR");
        assert_eq!(loaded.progress, 35);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let pool = init_memory_database().await.unwrap();
        let err = update_phase(&pool, Uuid::new_v4(), "AI_ANALYSIS", 35).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first_and_delete() {
        let pool = init_memory_database().await.unwrap();
        let mut older = sample("A");
        older.created_at = older.created_at - chrono::Duration::minutes(5);
        let newer = sample("B");
        insert_analysis(&pool, &older).await.unwrap();
        insert_analysis(&pool, &newer).await.unwrap();

        let listed = list_analyses(&pool).await.unwrap();
        assert_eq!(listed[0].product_name, "B");
        assert_eq!(listed[1].product_name, "A");

        assert!(delete_analysis(&pool, older.id).await.unwrap());
        assert!(!delete_analysis(&pool, older.id).await.unwrap());
        assert_eq!(list_analyses(&pool).await.unwrap().len(), 1);
    }
}

//! Child records of an analysis: drivers, objections, visual demos, report
//!
//! Rows are inserted one at a time as each phase finishes. Nothing here
//! is transactional, so a failed analysis keeps the children already
//! written.

use crate::db::analyses::parse_uuid;
use gatilho_common::db::{MentalDriverRecord, ObjectionRecord, ReportRecord, VisualDemoRecord};
use gatilho_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub async fn insert_driver(pool: &SqlitePool, driver: &MentalDriverRecord) -> Result<()> {
    let examples = serde_json::to_string(&driver.examples)?;

    sqlx::query(
        r#"
        INSERT INTO mental_drivers (
            id, analysis_id, driver_name, driver_category, trigger_phrase,
            activation_phrase, effectiveness_score, examples, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(driver.id.to_string())
    .bind(driver.analysis_id.to_string())
    .bind(&driver.driver_name)
    .bind(&driver.driver_category)
    .bind(&driver.trigger_phrase)
    .bind(&driver.activation_phrase)
    .bind(driver.effectiveness_score)
    .bind(&examples)
    .bind(time::to_db(&driver.created_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Drivers of one analysis in insertion order
pub async fn list_drivers(pool: &SqlitePool, analysis_id: Uuid) -> Result<Vec<MentalDriverRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, analysis_id, driver_name, driver_category, trigger_phrase,
               activation_phrase, effectiveness_score, examples, created_at
        FROM mental_drivers
        WHERE analysis_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(analysis_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_driver).collect()
}

fn row_to_driver(row: &SqliteRow) -> Result<MentalDriverRecord> {
    let id: String = row.get("id");
    let analysis_id: String = row.get("analysis_id");
    let examples: String = row.get("examples");
    let created_at: String = row.get("created_at");

    Ok(MentalDriverRecord {
        id: parse_uuid(&id)?,
        analysis_id: parse_uuid(&analysis_id)?,
        driver_name: row.get("driver_name"),
        driver_category: row.get("driver_category"),
        trigger_phrase: row.get("trigger_phrase"),
        activation_phrase: row.get("activation_phrase"),
        effectiveness_score: row.get("effectiveness_score"),
        examples: serde_json::from_str(&examples)?,
        created_at: time::from_db(&created_at)?,
    })
}

pub async fn insert_objection(pool: &SqlitePool, objection: &ObjectionRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO objections (
            id, analysis_id, objection_type, objection_content,
            frequency_percentage, is_hidden, neutralization_strategy, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(objection.id.to_string())
    .bind(objection.analysis_id.to_string())
    .bind(&objection.objection_type)
    .bind(&objection.objection_content)
    .bind(objection.frequency_percentage)
    .bind(objection.is_hidden)
    .bind(&objection.neutralization_strategy)
    .bind(time::to_db(&objection.created_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Objections of one analysis, primary before hidden
pub async fn list_objections(pool: &SqlitePool, analysis_id: Uuid) -> Result<Vec<ObjectionRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, analysis_id, objection_type, objection_content,
               frequency_percentage, is_hidden, neutralization_strategy, created_at
        FROM objections
        WHERE analysis_id = ?
        ORDER BY is_hidden, rowid
        "#,
    )
    .bind(analysis_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_objection).collect()
}

fn row_to_objection(row: &SqliteRow) -> Result<ObjectionRecord> {
    let id: String = row.get("id");
    let analysis_id: String = row.get("analysis_id");
    let created_at: String = row.get("created_at");

    Ok(ObjectionRecord {
        id: parse_uuid(&id)?,
        analysis_id: parse_uuid(&analysis_id)?,
        objection_type: row.get("objection_type"),
        objection_content: row.get("objection_content"),
        frequency_percentage: row.get("frequency_percentage"),
        is_hidden: row.get("is_hidden"),
        neutralization_strategy: row.get("neutralization_strategy"),
        created_at: time::from_db(&created_at)?,
    })
}

pub async fn insert_demo(pool: &SqlitePool, demo: &VisualDemoRecord) -> Result<()> {
    let materials = serde_json::to_string(&demo.materials)?;

    sqlx::query(
        r#"
        INSERT INTO provi_systems (
            id, analysis_id, provi_name, concept, materials,
            execution_steps, impact_level, memorability_score, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(demo.id.to_string())
    .bind(demo.analysis_id.to_string())
    .bind(&demo.provi_name)
    .bind(&demo.concept)
    .bind(&materials)
    .bind(&demo.execution_steps)
    .bind(&demo.impact_level)
    .bind(demo.memorability_score)
    .bind(time::to_db(&demo.created_at))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_demos(pool: &SqlitePool, analysis_id: Uuid) -> Result<Vec<VisualDemoRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, analysis_id, provi_name, concept, materials,
               execution_steps, impact_level, memorability_score, created_at
        FROM provi_systems
        WHERE analysis_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(analysis_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_demo).collect()
}

fn row_to_demo(row: &SqliteRow) -> Result<VisualDemoRecord> {
    let id: String = row.get("id");
    let analysis_id: String = row.get("analysis_id");
    let materials: String = row.get("materials");
    let created_at: String = row.get("created_at");

    Ok(VisualDemoRecord {
        id: parse_uuid(&id)?,
        analysis_id: parse_uuid(&analysis_id)?,
        provi_name: row.get("provi_name"),
        concept: row.get("concept"),
        materials: serde_json::from_str(&materials)?,
        execution_steps: row.get("execution_steps"),
        impact_level: row.get("impact_level"),
        memorability_score: row.get("memorability_score"),
        created_at: time::from_db(&created_at)?,
    })
}

pub async fn insert_report(pool: &SqlitePool, report: &ReportRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reports (
            id, analysis_id, executive_summary, psychological_analysis,
            objection_framework, provi_system, market_intelligence,
            implementation_roadmap, success_metrics, full_report_json, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.id.to_string())
    .bind(report.analysis_id.to_string())
    .bind(serde_json::to_string(&report.executive_summary)?)
    .bind(serde_json::to_string(&report.psychological_analysis)?)
    .bind(serde_json::to_string(&report.objection_framework)?)
    .bind(serde_json::to_string(&report.provi_system)?)
    .bind(serde_json::to_string(&report.market_intelligence)?)
    .bind(serde_json::to_string(&report.implementation_roadmap)?)
    .bind(serde_json::to_string(&report.success_metrics)?)
    .bind(serde_json::to_string(&report.full_report_json)?)
    .bind(time::to_db(&report.created_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// The report of one analysis, if it completed
pub async fn load_report(pool: &SqlitePool, analysis_id: Uuid) -> Result<Option<ReportRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, analysis_id, executive_summary, psychological_analysis,
               objection_framework, provi_system, market_intelligence,
               implementation_roadmap, success_metrics, full_report_json, created_at
        FROM reports
        WHERE analysis_id = ?
        ORDER BY rowid DESC
        LIMIT 1
        "#,
    )
    .bind(analysis_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_report).transpose()
}

fn json_column(row: &SqliteRow, column: &str) -> Result<serde_json::Value> {
    let raw: String = row.get(column);
    Ok(serde_json::from_str(&raw)?)
}

fn row_to_report(row: &SqliteRow) -> Result<ReportRecord> {
    let id: String = row.get("id");
    let analysis_id: String = row.get("analysis_id");
    let created_at: String = row.get("created_at");

    Ok(ReportRecord {
        id: parse_uuid(&id)?,
        analysis_id: parse_uuid(&analysis_id)?,
        executive_summary: json_column(row, "executive_summary")?,
        psychological_analysis: json_column(row, "psychological_analysis")?,
        objection_framework: json_column(row, "objection_framework")?,
        provi_system: json_column(row, "provi_system")?,
        market_intelligence: json_column(row, "market_intelligence")?,
        implementation_roadmap: json_column(row, "implementation_roadmap")?,
        success_metrics: json_column(row, "success_metrics")?,
        full_report_json: json_column(row, "full_report_json")?,
        created_at: time::from_db(&created_at)?,
    })
}

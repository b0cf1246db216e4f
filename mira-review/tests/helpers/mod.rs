//! Shared fixtures for mira-review integration tests

#![allow(dead_code)]

pub mod fake_sheet;

use mira_common::config::ReviewConfig;
use mira_review::importer::{import_spreadsheet, ImportSummary};
use mira_review::sync::SyncBridge;
use mira_review::{build_router, AppState};
use sqlx::SqlitePool;

/// Canonical session header row, in export order
pub const SESSION_HEADERS: [&str; 18] = [
    "session_id",
    "user_id",
    "age",
    "gender",
    "rating",
    "summary",
    "kundli",
    "kundli_json",
    "major_dasha",
    "minor_dasha",
    "sub_minor_dasha",
    "dasha_json",
    "manglik_dosha",
    "pitra_dosha",
    "dosha_json",
    "chat",
    "marking",
    "analysis",
];

/// Three sessions in canonical flattened form (compact JSON, sorted keys)
pub fn sample_rows() -> Vec<Vec<String>> {
    let rows: [[&str; 18]; 3] = [
        [
            "S1",
            "U1",
            "32",
            "female",
            "4.5",
            "Career question",
            "Leo ascendant",
            r#"{"houses":{"house_1":{"planets":["Sun","Venus"],"sign":"Leo"},"house_10":{"planets":["Saturn"],"sign":"Taurus"}}}"#,
            "Jupiter",
            "Saturn",
            "Mercury",
            r#"{"major":"Jupiter","minor":"Saturn","sub_minor":"Mercury"}"#,
            "true",
            "false",
            r#"{"manglik":true,"pitra":false}"#,
            r#"[{"speaker":"user","text":"Will I get a job?"},{"speaker":"astrologer","text":"Yes, in spring."}]"#,
            "accurate",
            "Timing matches the dasha",
        ],
        [
            "S2", "U2", "45", "male", "3", "Marriage timing", "", "", "Venus", "", "", "", "false", "true", "",
            r#"[{"speaker":"user","text":"When will I marry?"}]"#,
            "", "",
        ],
        [
            "S3", "U3", "28", "other", "5", "", "", "", "", "", "", "", "false", "false", "", "", "", "",
        ],
    ];
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

/// Serialize a header row and data rows as CSV
pub fn csv_bytes(headers: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}

pub fn sample_csv() -> Vec<u8> {
    csv_bytes(&SESSION_HEADERS, &sample_rows())
}

/// Header row plus records of a CSV document
pub fn parse_csv(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

pub async fn test_pool() -> SqlitePool {
    mira_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database")
}

pub async fn import_csv(pool: &SqlitePool, bytes: Vec<u8>) -> ImportSummary {
    import_spreadsheet(pool, &ReviewConfig::default(), "sessions.csv", bytes)
        .await
        .expect("Import failed")
}

/// Pool with the three sample sessions loaded
pub async fn seeded_pool() -> SqlitePool {
    let pool = test_pool().await;
    import_csv(&pool, sample_csv()).await;
    pool
}

pub fn test_config() -> ReviewConfig {
    ReviewConfig {
        secret_key: "test-secret".to_string(),
        ..ReviewConfig::default()
    }
}

pub fn test_app(pool: SqlitePool) -> axum::Router {
    build_router(AppState::new(pool, test_config()))
}

pub fn test_app_with_sync(pool: SqlitePool, bridge: SyncBridge) -> axum::Router {
    build_router(AppState::new(pool, test_config()).with_sync(bridge))
}

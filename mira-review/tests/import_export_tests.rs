//! Importer and exporter against a real (in-memory) database

mod helpers;

use helpers::*;
use mira_common::config::ReviewConfig;
use mira_common::db::{ReviewStatus, Verdict};
use mira_review::db::sessions;
use mira_review::exporter::{export_csv, ExportFilter};
use mira_review::importer::{import_spreadsheet, ImportError, SkipReason};
use mira_review::review::{submit_review, ReviewSubmission};

#[tokio::test]
async fn test_import_then_export_reproduces_rows() {
    let pool = test_pool().await;
    let summary = import_csv(&pool, sample_csv()).await;
    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.skipped, 0);

    let exported = export_csv(&pool, ExportFilter::All).await.unwrap();
    let (headers, rows) = parse_csv(&exported);

    assert_eq!(&headers[..SESSION_HEADERS.len()], &SESSION_HEADERS.map(String::from)[..]);
    assert_eq!(rows.len(), 3);
    for (exported_row, original) in rows.iter().zip(sample_rows()) {
        assert_eq!(&exported_row[..SESSION_HEADERS.len()], &original[..]);
        // No review yet
        assert!(exported_row[SESSION_HEADERS.len()..].iter().all(|c| c.is_empty()));
    }
}

#[tokio::test]
async fn test_reimport_of_export_yields_same_sessions() {
    let pool = seeded_pool().await;
    let exported = export_csv(&pool, ExportFilter::All).await.unwrap();

    let other = test_pool().await;
    let summary = import_csv(&other, exported).await;
    assert_eq!(summary.inserted, 3);

    for id in ["S1", "S2", "S3"] {
        let a = sessions::get_session(&pool, id).await.unwrap().unwrap();
        let b = sessions::get_session(&other, id).await.unwrap().unwrap();
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn test_loosely_formatted_sheet_survives_export_and_reimport() {
    let headers = [
        "Session ID", "User ID", "Age", "Gender", "Rating", "Manglik Dosha", "Pitra Dosha", "Dosha JSON", "Chat",
    ];
    let rows = vec![
        vec!["S7", "U7", "31.0", "F", "4", "", "", r#"{"manglik":true,"pitra_dosha":false}"#, "[10:00] User: hi\n[10:01] Astrologer: hello"],
        vec!["S8", "U8", "50", "M", "2", "Yes", "", r#"{"pitra":true}"#, ""],
    ]
    .into_iter()
    .map(|row| row.into_iter().map(String::from).collect())
    .collect::<Vec<Vec<String>>>();

    let pool = test_pool().await;
    let first = import_csv(&pool, csv_bytes(&headers, &rows)).await;
    assert_eq!(first.inserted, 2);
    assert_eq!(first.skipped, 0);

    let s7 = sessions::get_session(&pool, "S7").await.unwrap().unwrap();
    assert!(s7.manglik_dosha);
    assert!(!s7.pitra_dosha);
    assert_eq!(s7.chat.len(), 2);
    let s8 = sessions::get_session(&pool, "S8").await.unwrap().unwrap();
    assert!(s8.manglik_dosha && s8.pitra_dosha);

    let exported = export_csv(&pool, ExportFilter::All).await.unwrap();
    let other = test_pool().await;
    let second = import_csv(&other, exported).await;
    assert_eq!(second.inserted, 2);
    assert_eq!(second.skipped, 0, "{:?}", second.skips);

    for id in ["S7", "S8"] {
        let a = sessions::get_session(&pool, id).await.unwrap().unwrap();
        let b = sessions::get_session(&other, id).await.unwrap().unwrap();
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn test_reimport_replaces_by_identifier_and_keeps_reviews() {
    let pool = seeded_pool().await;
    submit_review(
        &pool,
        &ReviewSubmission {
            session_id: "S2".to_string(),
            verdict: Some(Verdict::Correct),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let mut rows = sample_rows();
    rows[1][5] = "Updated summary".to_string();
    let summary = import_csv(&pool, csv_bytes(&SESSION_HEADERS, &rows[1..2])).await;

    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.replaced, 1);
    assert_eq!(sessions::count_sessions(&pool, &Default::default()).await.unwrap(), 3);

    let session = sessions::get_session(&pool, "S2").await.unwrap().unwrap();
    assert_eq!(session.summary, "Updated summary");

    let review = mira_review::db::reviews::get_review(&pool, "S2").await.unwrap().unwrap();
    assert_eq!(review.verdict, Verdict::Correct);
}

#[tokio::test]
async fn test_bad_rows_are_skipped_with_reasons() {
    let pool = test_pool().await;
    let headers = ["Session ID", "User ID", "Age", "Gender", "Rating", "Manglik Dosha", "Chat"];
    let rows: Vec<Vec<String>> = [
        ["A1", "U1", "30", "f", "4", "yes", "User: hello\nAstrologer: hi"],
        ["", "U2", "31", "m", "4", "no", ""],
        ["A3", "U3", "thirty", "m", "4", "no", ""],
        ["A4", "U4", "33", "m", "4", "maybe", ""],
        ["A1", "U5", "34", "f", "4", "no", ""],
        ["", "", "", "", "", "", ""],
        ["A6", "U6", "36", "f", "", "", ""],
    ]
    .iter()
    .map(|r| r.iter().map(|c| c.to_string()).collect())
    .collect();

    let summary = import_csv(&pool, csv_bytes(&headers, &rows)).await;

    assert_eq!(summary.total_rows, 6, "fully empty rows are not counted");
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.skipped, 4);

    let reasons: Vec<(usize, &SkipReason)> = summary.skips.iter().map(|s| (s.row, &s.reason)).collect();
    assert!(matches!(reasons[0], (3, SkipReason::MissingSessionId)));
    assert!(matches!(reasons[1], (4, SkipReason::InvalidNumber { .. })));
    assert!(matches!(reasons[2], (5, SkipReason::InvalidFlag { .. })));
    assert!(matches!(reasons[3], (6, SkipReason::DuplicateSessionId)));
    assert_eq!(summary.skips[3].session_id.as_deref(), Some("A1"));

    let first = sessions::get_session(&pool, "A1").await.unwrap().unwrap();
    assert!(first.manglik_dosha);
    assert_eq!(first.chat.len(), 2);
    assert_eq!(first.chat[1].speaker, "Astrologer");

    let last = sessions::get_session(&pool, "A6").await.unwrap().unwrap();
    assert_eq!(last.rating, None);
    assert!(!last.manglik_dosha);
}

#[tokio::test]
async fn test_missing_required_columns_abort_import() {
    let pool = test_pool().await;
    let bytes = csv_bytes(&["session_id", "user_id", "summary"], &[vec!["S1".into(), "U1".into(), "x".into()]]);

    let err = import_spreadsheet(&pool, &ReviewConfig::default(), "s.csv", bytes)
        .await
        .unwrap_err();
    match err {
        ImportError::MissingColumns(missing) => {
            assert_eq!(missing, vec!["age", "gender", "rating"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sessions::count_sessions(&pool, &Default::default()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_payload_mismatch_is_skipped() {
    let pool = test_pool().await;
    let mut rows = sample_rows();
    rows[0][8] = "Mars".to_string();

    let summary = import_csv(&pool, sample_csv_with(rows)).await;
    assert_eq!(summary.inserted, 2);
    assert!(matches!(summary.skips[0].reason, SkipReason::PayloadMismatch { .. }));
}

fn sample_csv_with(rows: Vec<Vec<String>>) -> Vec<u8> {
    csv_bytes(&SESSION_HEADERS, &rows)
}

#[tokio::test]
async fn test_rejected_extension_and_size() {
    let pool = test_pool().await;
    let config = ReviewConfig {
        max_upload_bytes: 10,
        ..ReviewConfig::default()
    };

    let err = import_spreadsheet(&pool, &config, "notes.txt", b"abc".to_vec()).await.unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedExtension(_)));

    let err = import_spreadsheet(&pool, &config, "s.csv", sample_csv()).await.unwrap_err();
    assert!(matches!(err, ImportError::TooLarge { .. }));
}

#[tokio::test]
async fn test_export_completed_filter() {
    let pool = seeded_pool().await;
    submit_review(
        &pool,
        &ReviewSubmission {
            session_id: "S1".to_string(),
            verdict: Some(Verdict::Incorrect),
            comment: Some("wrong dasha".to_string()),
            status: Some(ReviewStatus::Completed),
            astrologer_name: Some("Asha".to_string()),
        },
    )
    .await
    .unwrap();
    submit_review(
        &pool,
        &ReviewSubmission {
            session_id: "S3".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let completed = export_csv(&pool, ExportFilter::Status(ReviewStatus::Completed)).await.unwrap();
    let (headers, rows) = parse_csv(&completed);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "S1");

    let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
    assert_eq!(rows[0][col("astrologer_name")], "Asha");
    assert_eq!(rows[0][col("verdict")], "incorrect");
    assert_eq!(rows[0][col("comment")], "wrong dasha");
    assert_eq!(rows[0][col("review_status")], "completed");

    let not_started = export_csv(&pool, ExportFilter::Status(ReviewStatus::NotStarted)).await.unwrap();
    let (_, rows) = parse_csv(&not_started);
    let ids: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["S2"]);
}

#[tokio::test]
async fn test_imported_sessions_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("mira.db");

    let pool = mira_common::db::init_database(&path).await.unwrap();
    import_csv(&pool, sample_csv()).await;
    pool.close().await;

    let reopened = mira_common::db::init_database(&path).await.unwrap();
    assert_eq!(sessions::count_sessions(&reopened, &Default::default()).await.unwrap(), 3);
    let session = sessions::get_session(&reopened, "S1").await.unwrap().unwrap();
    assert_eq!(session.chat.len(), 2);
}

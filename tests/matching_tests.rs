/// Integration tests for manual match scans
///
/// This file covers `POST /items/{id}/match`: thresholds, excluded
/// candidates, and behaviour when AI is unavailable.

use axum::http::StatusCode;
use lostfound::ai::DisabledVision;
use lostfound::create_app;
use serde_json::json;
use std::sync::Arc;

mod common;
use common::*;

/// Tests a manual scan that finds a match
#[tokio::test]
async fn test_manual_scan_reports_matches() {
    let mut app = create_test_app();
    let lost = report_item(&mut app, "LOST", "Calculator").await;
    let found = report_item(&mut app, "FOUND", "Calculator").await;
    // Let the automatic scan for the found report finish first
    wait_for_notifications(&mut app, 1).await;

    let (status, body) = post(&mut app, &format!("/items/{}/match", lost.get_id()), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["match_count"], 1);
    assert_eq!(
        body["notification"]["message"],
        "Deep-scan successful: 1 probable match(es) for Calculator."
    );
    assert_eq!(body["notification"]["matches"][0]["item_id"], found.get_id());
}

/// Tests that a confidence equal to the threshold is not a match
#[tokio::test]
async fn test_threshold_is_exclusive() {
    let mut app = create_app(create_test_state(Arc::new(TitleVision::new(75.0))));
    let lost = report_item(&mut app, "LOST", "Headphones").await;
    report_item(&mut app, "FOUND", "Headphones").await;

    let (status, body) = post(&mut app, &format!("/items/{}/match", lost.get_id()), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["match_count"], 0);
    assert!(body["notification"].is_null());
}

/// Tests that resolved reports are not offered as candidates
#[tokio::test]
async fn test_resolved_candidates_are_skipped() {
    let mut app = create_test_app();
    let found = report_item(&mut app, "FOUND", "Glasses").await;
    post(&mut app, &format!("/items/{}/resolve", found.get_id()), json!({})).await;
    let lost = report_item(&mut app, "LOST", "Glasses").await;

    let (_, body) = post(&mut app, &format!("/items/{}/match", lost.get_id()), json!({})).await;

    assert_eq!(body["match_count"], 0);
}

/// Tests that a scan without AI configured finds nothing rather than failing
#[tokio::test]
async fn test_scan_without_ai_finds_nothing() {
    let mut app = create_app(create_test_state(Arc::new(DisabledVision)));
    let lost = report_item(&mut app, "LOST", "Backpack").await;
    report_item(&mut app, "FOUND", "Backpack").await;

    let (status, body) = post(&mut app, &format!("/items/{}/match", lost.get_id()), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["match_count"], 0);
}

/// Tests scanning a report that does not exist
#[tokio::test]
async fn test_scan_nonexistent_item() {
    let mut app = create_test_app();

    let (status, _) = post(&mut app, "/items/nonexistent-id/match", json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

//! Integration tests for the two-stage approval workflow.

mod common;

use assert_matches::assert_matches;
use chrono::{Datelike, Utc};
use ipledger_core::application_number;
use ipledger_core::approval::{ApprovalStatus, ApprovalStep, Decision};
use ipledger_core::error::CoreError;
use ipledger_db::models::asset::AssetKey;
use ipledger_db::repositories::AssetRepo;
use ipledger_service::approval::{advance_approval, AdvanceRequest};
use ipledger_service::assets::get_asset;
use ipledger_service::error::ServiceError;
use sqlx::PgPool;

use common::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn decide(decision: Decision, comment: &str) -> AdvanceRequest {
    AdvanceRequest {
        decision,
        comment: Some(comment.to_string()),
        expected_version: None,
    }
}

fn decide_at(decision: Decision, version: i32) -> AdvanceRequest {
    AdvanceRequest {
        decision,
        comment: None,
        expected_version: Some(version),
    }
}

// ---------------------------------------------------------------------------
// Test: transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invention_patent_full_review(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let applicant = new_user(&pool, "Applicant").await;
    let first_reviewer = new_user(&pool, "First reviewer").await;
    let second_reviewer = new_user(&pool, "Second reviewer").await;

    let reg = new_patent(&ctx, "Phase-change memory cell", &[applicant]).await;
    let number = &reg.asset.application_number;
    assert_eq!(number.len(), 15);
    assert!(number.starts_with(&format!("CN{}1", Utc::now().year())));
    assert!(number[7..14].bytes().all(|b| b.is_ascii_digit()));
    application_number::validate(number).unwrap();

    let id = reg.asset.id;
    let after_initial = advance_approval(
        &ctx,
        &reviewer(first_reviewer),
        id,
        &decide(Decision::Approve, "  Claims are clear  "),
    )
    .await
    .unwrap();
    assert_eq!(after_initial.step().unwrap(), ApprovalStep::Final);
    assert_eq!(after_initial.status().unwrap(), ApprovalStatus::InProgress);
    assert_eq!(after_initial.initial_reviewer_id, Some(first_reviewer));
    assert_eq!(after_initial.initial_comment.as_deref(), Some("Claims are clear"));
    assert_eq!(after_initial.initial_approved, Some(true));
    assert!(after_initial.initial_reviewed_at.is_some());

    let after_final = advance_approval(
        &ctx,
        &reviewer(second_reviewer),
        id,
        &decide(Decision::Approve, "Granted"),
    )
    .await
    .unwrap();
    assert_eq!(after_final.step().unwrap(), ApprovalStep::Final);
    assert_eq!(after_final.status().unwrap(), ApprovalStatus::Approved);
    assert_eq!(after_final.final_reviewer_id, Some(second_reviewer));
    assert_eq!(after_final.final_approved, Some(true));
    assert_eq!(after_final.version, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_initial_reject_is_read_back(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let applicant = new_user(&pool, "Applicant").await;
    let examiner = new_user(&pool, "Examiner").await;
    let reg = new_patent(&ctx, "Perpetual motion engine", &[applicant]).await;

    advance_approval(
        &ctx,
        &reviewer(examiner),
        reg.asset.id,
        &decide(Decision::Reject, "Violates thermodynamics"),
    )
    .await
    .unwrap();

    let detail = get_asset(&ctx, &AssetKey::Id(reg.asset.id)).await.unwrap();
    assert_eq!(detail.asset.status().unwrap(), ApprovalStatus::Rejected);
    assert_eq!(detail.asset.step().unwrap(), ApprovalStep::Initial);
    assert_eq!(detail.asset.initial_approved, Some(false));
    assert_eq!(
        detail.asset.initial_comment.as_deref(),
        Some("Violates thermodynamics")
    );
    assert!(detail.asset.final_reviewer_id.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_final_reject(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let applicant = new_user(&pool, "Applicant").await;
    let examiner = new_user(&pool, "Examiner").await;
    let reg = new_patent(&ctx, "Folding bicycle hinge", &[applicant]).await;

    advance_approval(&ctx, &reviewer(examiner), reg.asset.id, &decide(Decision::Approve, "ok"))
        .await
        .unwrap();
    let rejected =
        advance_approval(&ctx, &reviewer(examiner), reg.asset.id, &decide(Decision::Reject, "prior art"))
            .await
            .unwrap();
    assert_eq!(rejected.status().unwrap(), ApprovalStatus::Rejected);
    assert_eq!(rejected.step().unwrap(), ApprovalStep::Final);
    assert_eq!(rejected.final_approved, Some(false));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_terminal_asset_cannot_advance(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let applicant = new_user(&pool, "Applicant").await;
    let examiner = new_user(&pool, "Examiner").await;
    let reg = new_patent(&ctx, "Closed case", &[applicant]).await;

    let rejected =
        advance_approval(&ctx, &reviewer(examiner), reg.asset.id, &decide(Decision::Reject, "no"))
            .await
            .unwrap();

    let err = advance_approval(&ctx, &reviewer(examiner), reg.asset.id, &decide(Decision::Approve, "yes"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::InvalidState(_)));
    assert_eq!(err.code(), "INVALID_STATE");

    let reloaded = AssetRepo::find_by_id(&pool, reg.asset.id).await.unwrap().unwrap();
    assert_eq!(reloaded.version, rejected.version);
    assert_eq!(reloaded.status().unwrap(), ApprovalStatus::Rejected);
}

// ---------------------------------------------------------------------------
// Test: optimistic concurrency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_advance_has_one_winner(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let applicant = new_user(&pool, "Applicant").await;
    let alice = new_user(&pool, "Alice").await;
    let bob = new_user(&pool, "Bob").await;
    let reg = new_patent(&ctx, "Contested", &[applicant]).await;
    let id = reg.asset.id;

    // Both reviewers act on the version they loaded.
    let approve = decide_at(Decision::Approve, reg.asset.version);
    let reject = decide_at(Decision::Reject, reg.asset.version);
    let alice_principal = reviewer(alice);
    let bob_principal = reviewer(bob);
    let (a, b) = tokio::join!(
        advance_approval(&ctx, &alice_principal, id, &approve),
        advance_approval(&ctx, &bob_principal, id, &reject),
    );

    let outcomes = [a, b];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_matches!(
        loser,
        ServiceError::Core(CoreError::ConcurrencyConflict { entity: "Asset", .. })
    );

    let reloaded = AssetRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(reloaded.version, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stale_version_is_rejected(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let applicant = new_user(&pool, "Applicant").await;
    let examiner = new_user(&pool, "Examiner").await;
    let reg = new_patent(&ctx, "Moving target", &[applicant]).await;

    advance_approval(&ctx, &reviewer(examiner), reg.asset.id, &decide_at(Decision::Approve, 0))
        .await
        .unwrap();

    let err = advance_approval(&ctx, &reviewer(examiner), reg.asset.id, &decide_at(Decision::Approve, 0))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::ConcurrencyConflict { .. }));

    let reloaded = AssetRepo::find_by_id(&pool, reg.asset.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status().unwrap(), ApprovalStatus::InProgress);
    assert!(reloaded.final_reviewer_id.is_none());
}

// ---------------------------------------------------------------------------
// Test: failure modes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_asset_and_reviewer(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let applicant = new_user(&pool, "Applicant").await;
    let reg = new_patent(&ctx, "Unreviewed", &[applicant]).await;

    assert_matches!(
        advance_approval(&ctx, &reviewer(applicant), -5, &decide(Decision::Approve, "")).await,
        Err(ServiceError::Core(CoreError::NotFound { .. }))
    );

    // Reviewer ids reference users; an unknown one is a validation failure.
    let err = advance_approval(&ctx, &reviewer(999_999), reg.asset.id, &decide(Decision::Approve, ""))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Core(CoreError::Validation(_)));

    let reloaded = AssetRepo::find_by_id(&pool, reg.asset.id).await.unwrap().unwrap();
    assert_eq!(reloaded.version, 0);
}

//! Integration tests for the statistics dashboards.

mod common;

use chrono::{Datelike, Utc};
use ipledger_core::asset_kind::AssetKind;
use ipledger_core::fees::PaymentStatus;
use ipledger_service::assets::create_asset;
use ipledger_service::statistics::{
    fee_statistics, overview, tech_domains, top_applicants, type_distribution, yearly_trends,
};
use sqlx::PgPool;

use common::*;

// ---------------------------------------------------------------------------
// Test: fee figures
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fee_statistics_figures(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let alice = new_user(&pool, "Alice").await;
    let paid = new_patent(&ctx, "Paid", &[alice]).await;
    new_patent(&ctx, "Open", &[alice]).await;
    create_asset(&ctx, &request(AssetKind::Trademark, "goods", "Mark", &[alice]))
        .await
        .unwrap();

    sqlx::query(
        "UPDATE fees SET payment_status_id = $2, actual_pay_date = CURRENT_DATE WHERE id = $1",
    )
    .bind(paid.fee.id)
    .bind(PaymentStatus::Paid.id())
    .execute(&pool)
    .await
    .unwrap();

    let patents = fee_statistics(&ctx, Some(AssetKind::Patent)).await.unwrap();
    assert_eq!(patents.current_year, Utc::now().year());
    assert_eq!(patents.pending_count, 1);
    assert_eq!(patents.paid_amount, 90_000);
    assert_eq!(patents.overdue_count, 0);
    assert_eq!(patents.total_annual_fee, 180_000);

    let all = fee_statistics(&ctx, None).await.unwrap();
    assert_eq!(all.pending_count, 2);
    assert_eq!(all.total_annual_fee, 180_100);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fee_statistics_counts_past_deadlines_as_overdue(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let alice = new_user(&pool, "Alice").await;
    let reg = new_patent(&ctx, "Forgotten", &[alice]).await;

    // Deadlines are fixed once written; backdate this one with the guard off.
    sqlx::query("ALTER TABLE fees DISABLE TRIGGER trg_fees_keep_deadline")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE fees SET deadline_date = CURRENT_DATE - 1 WHERE id = $1")
        .bind(reg.fee.id)
        .execute(&pool)
        .await
        .unwrap();

    let stats = fee_statistics(&ctx, Some(AssetKind::Patent)).await.unwrap();
    assert_eq!(stats.overdue_count, 1);
    assert_eq!(stats.pending_count, 0);
}

// ---------------------------------------------------------------------------
// Test: asset figures
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_yearly_trends_are_five_filled_years(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let alice = new_user(&pool, "Alice").await;
    new_patent(&ctx, "One", &[alice]).await;
    new_patent(&ctx, "Two", &[alice]).await;

    let trends = yearly_trends(&ctx, Some(AssetKind::Patent)).await.unwrap();
    let year = Utc::now().year();
    assert_eq!(trends.len(), 5);
    assert_eq!(trends[0].year, year - 4);
    assert!(trends.windows(2).all(|w| w[0].year + 1 == w[1].year));
    assert!(trends[..4].iter().all(|t| t.count == 0));
    assert_eq!(trends[4].year, year);
    assert_eq!(trends[4].count, 2);

    let articles = yearly_trends(&ctx, Some(AssetKind::Article)).await.unwrap();
    assert_eq!(articles.len(), 5);
    assert!(articles.iter().all(|t| t.count == 0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_type_distribution_percentages(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let alice = new_user(&pool, "Alice").await;
    for (sub_type, title) in [("invention", "A"), ("invention", "B"), ("design", "C")] {
        create_asset(&ctx, &request(AssetKind::Patent, sub_type, title, &[alice]))
            .await
            .unwrap();
    }

    let shares = type_distribution(&ctx, AssetKind::Patent).await.unwrap();
    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].type_name, "invention");
    assert_eq!(shares[0].count, 2);
    assert_eq!(shares[0].percentage, 66.67);
    assert_eq!(shares[1].type_name, "design");
    assert_eq!(shares[1].percentage, 33.33);

    assert!(type_distribution(&ctx, AssetKind::Article).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_top_applicants_skip_blank_names(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let alice = new_user(&pool, "Alice").await;
    let bob = new_user(&pool, "Bob").await;
    let nameless = new_user(&pool, "   ").await;
    new_patent(&ctx, "A1", &[alice]).await;
    new_patent(&ctx, "A2", &[alice, bob]).await;
    new_patent(&ctx, "B1", &[bob]).await;
    new_patent(&ctx, "N1", &[nameless]).await;

    let ranking = top_applicants(&ctx, None).await.unwrap();
    let names: Vec<(&str, i64)> = ranking
        .iter()
        .map(|r| (r.applicant.as_str(), r.count))
        .collect();
    assert_eq!(names, vec![("Alice", 2), ("Bob", 1)]);
}

// ---------------------------------------------------------------------------
// Test: technical domains
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tech_domains_ranked_by_count(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let alice = new_user(&pool, "Alice").await;
    new_patent(&ctx, "Lithium battery separator", &[alice]).await;
    new_patent(&ctx, "Solar battery charger", &[alice]).await;
    new_patent(&ctx, "Neural network compiler", &[alice]).await;

    let domains = tech_domains(&ctx, Some(AssetKind::Patent)).await.unwrap();
    assert!(!domains.is_empty());
    assert_eq!(domains[0].count, 2);
    assert!(domains.windows(2).all(|w| w[0].count >= w[1].count));
    assert!(domains.iter().any(|d| d.count == 1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tech_domains_read_chinese_titles(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let alice = new_user(&pool, "Alice").await;
    new_patent(&ctx, "一种锂电池储能装置", &[alice]).await;
    new_patent(&ctx, "Image interpolation method for general displays", &[alice]).await;
    create_asset(&ctx, &request(AssetKind::Trademark, "goods", "基于深度学习的商标检索", &[alice]))
        .await
        .unwrap();

    let patents = tech_domains(&ctx, Some(AssetKind::Patent)).await.unwrap();
    assert_eq!(patents.len(), 1);
    assert_eq!(patents[0].domain, "new_energy");
    assert_eq!(patents[0].count, 1);

    let all = tech_domains(&ctx, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|d| d.domain == "artificial_intelligence"));
}

// ---------------------------------------------------------------------------
// Test: overview
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_overview_totals_and_trend(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = test_context(pool.clone(), dir.path());
    let alice = new_user(&pool, "Alice").await;
    new_patent(&ctx, "P1", &[alice]).await;
    new_patent(&ctx, "P2", &[alice]).await;
    create_asset(&ctx, &request(AssetKind::Article, "book", "Handbook", &[alice]))
        .await
        .unwrap();

    let summary = overview(&ctx).await.unwrap();
    assert_eq!(summary.patent_count, 2);
    assert_eq!(summary.trademark_count, 0);
    assert_eq!(summary.article_count, 1);
    assert_eq!(summary.pending_approval, 3);

    assert_eq!(summary.patent_trend.len(), 6);
    assert!(summary
        .patent_trend
        .windows(2)
        .all(|w| w[0].month < w[1].month));
    let latest = summary.patent_trend.last().unwrap();
    assert_eq!(latest.month.month(), Utc::now().month());
    assert_eq!(latest.count, 2);
    assert!(summary.patent_trend[..5].iter().all(|p| p.count == 0));
}

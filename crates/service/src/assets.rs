//! Asset registration, lookup, listing, attachment backfill and deletion.

use chrono::{Datelike, Utc};
use ipledger_core::approval::{ApprovalStatus, ApprovalStep};
use ipledger_core::asset_kind::{AssetKind, AssetType};
use ipledger_core::error::CoreError;
use ipledger_core::fees::fee_deadline;
use ipledger_core::search::{like_pattern, PageWindow};
use ipledger_core::types::DbId;
use ipledger_db::models::asset::{Asset, AssetFilter, AssetKey, CreateAsset, Registration};
use ipledger_db::models::author::AssetAuthor;
use ipledger_db::models::fee::{CreateFee, Fee};
use ipledger_db::repositories::{AssetRepo, AuthorRepo, FeeRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::context::LedgerContext;
use crate::error::{is_unique_violation, ServiceResult};
use crate::response::Page;

/// Attempts at drawing an unused application number before giving up.
const MAX_NUMBER_ATTEMPTS: usize = 3;

const UQ_APPLICATION_NUMBER: &str = "uq_assets_application_number";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssetRequest {
    pub kind: AssetKind,
    /// Sub-type name (`"invention"`) or code (`"1"`).
    #[validate(length(min = 1, max = 50))]
    pub sub_type: String,
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[serde(rename = "abstract")]
    #[validate(length(min = 1, max = 20000))]
    pub abstract_text: String,
    #[validate(length(min = 1, max = 100))]
    pub author_ids: Vec<DbId>,
    pub first_author_id: DbId,
    /// Initial `attachment_url`; usually empty until the upload lands.
    #[serde(default)]
    pub attachment_placeholder: Option<String>,
}

impl CreateAssetRequest {
    /// Field-level validation plus the checks the derive cannot express.
    fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Title must not be blank".into()));
        }
        if self.abstract_text.trim().is_empty() {
            return Err(CoreError::Validation("Abstract must not be blank".into()));
        }
        if !self.author_ids.contains(&self.first_author_id) {
            return Err(CoreError::Validation(format!(
                "First author {} is not among the listed authors",
                self.first_author_id
            )));
        }
        Ok(())
    }

    /// Author ids in submission order with duplicates dropped.
    fn distinct_authors(&self) -> Vec<DbId> {
        let mut seen = Vec::with_capacity(self.author_ids.len());
        for id in &self.author_ids {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }
}

/// An asset with its author links and fee history.
#[derive(Debug, Clone, Serialize)]
pub struct AssetDetail {
    #[serde(flatten)]
    pub asset: Asset,
    pub type_name: &'static str,
    pub authors: Vec<AssetAuthor>,
    pub fees: Vec<Fee>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetQuery {
    pub kind: Option<AssetKind>,
    pub status: Option<ApprovalStatus>,
    pub step: Option<ApprovalStep>,
    pub first_author_id: Option<DbId>,
    /// Case-insensitive substring of the title or application number.
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Register a new asset with its first fee and author links.
///
/// All three writes share one transaction. An application number that
/// collides with an existing one is redrawn up to [`MAX_NUMBER_ATTEMPTS`]
/// times.
pub async fn create_asset(
    ctx: &LedgerContext,
    req: &CreateAssetRequest,
) -> ServiceResult<Registration> {
    req.check()?;
    let asset_type = AssetType::parse(req.kind, &req.sub_type)?;
    let authors = req.distinct_authors();

    let missing = UserRepo::missing_ids(&ctx.pool, &authors).await?;
    if !missing.is_empty() {
        return Err(CoreError::Validation(format!("Unknown author ids: {missing:?}")).into());
    }

    let now = Utc::now();
    let year = now.year().to_string();
    let fee = CreateFee {
        fee_year: now.year(),
        amount_cents: asset_type.review_fee(),
        deadline_date: fee_deadline(now)?,
        created_at: now,
    };

    for attempt in 1..=MAX_NUMBER_ATTEMPTS {
        let application_number = ctx.numbers.generate(
            &ctx.config.country_code,
            &year,
            &asset_type.digit().to_string(),
        )?;
        let input = CreateAsset {
            kind_id: req.kind.id(),
            type_code: asset_type.code(),
            title: req.title.trim().to_string(),
            abstract_text: req.abstract_text.trim().to_string(),
            application_number,
            apply_date: now.date_naive(),
            attachment_url: req.attachment_placeholder.clone().unwrap_or_default(),
            first_author_id: req.first_author_id,
            created_at: now,
        };

        match AssetRepo::register(&ctx.pool, &input, &fee, &authors).await {
            Ok(registration) => {
                tracing::info!(
                    asset_id = registration.asset.id,
                    application_number = %registration.asset.application_number,
                    kind = req.kind.name(),
                    sub_type = asset_type.name(),
                    fee_cents = registration.fee.amount_cents,
                    "Asset registered"
                );
                return Ok(registration);
            }
            Err(e) if is_unique_violation(&e, UQ_APPLICATION_NUMBER) => {
                tracing::warn!(
                    attempt,
                    application_number = %input.application_number,
                    "Application number already taken, drawing another"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(CoreError::Conflict(format!(
        "No free application number after {MAX_NUMBER_ATTEMPTS} attempts"
    ))
    .into())
}

/// Load an asset by id or application number, with authors and fees.
pub async fn get_asset(ctx: &LedgerContext, key: &AssetKey) -> ServiceResult<AssetDetail> {
    let asset = find_asset(ctx, key).await?;
    let (authors, fees) = tokio::try_join!(
        AuthorRepo::list_for_asset(&ctx.pool, asset.id),
        FeeRepo::list_for_asset(&ctx.pool, asset.id),
    )?;
    Ok(AssetDetail {
        type_name: asset.type_name()?,
        asset,
        authors,
        fees,
    })
}

/// List assets, newest first.
pub async fn list_assets(ctx: &LedgerContext, query: &AssetQuery) -> ServiceResult<Page<Asset>> {
    let window = PageWindow::new(query.page, query.page_size);
    let filter = AssetFilter {
        kind_id: query.kind.map(AssetKind::id),
        approval_status_id: query.status.map(ApprovalStatus::id),
        current_step_id: query.step.map(ApprovalStep::id),
        first_author_id: query.first_author_id,
        keyword_pattern: like_pattern(query.keyword.as_deref()),
    };
    let (items, total) = tokio::try_join!(
        AssetRepo::list(&ctx.pool, &filter, window.limit, window.offset),
        AssetRepo::count(&ctx.pool, &filter),
    )?;
    Ok(Page::new(items, total, window))
}

/// Point `attachment_url` at the asset's directory in the attachment store.
pub async fn record_attachment(ctx: &LedgerContext, asset_id: DbId) -> ServiceResult<Asset> {
    let asset = find_asset(ctx, &AssetKey::Id(asset_id)).await?;
    let path = ctx
        .attachments
        .base_path(asset.kind()?, &asset.application_number)
        .map_err(|e| CoreError::Internal(e.to_string()))?;

    let updated = AssetRepo::set_attachment_url(&ctx.pool, asset_id, &path)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Asset",
            id: asset_id,
        })?;
    tracing::info!(asset_id, attachment_url = %path, "Attachment path recorded");
    Ok(updated)
}

/// Delete an asset, its author links and its fees, then clean up its
/// attachments.
///
/// Cleanup runs after the commit; a failure there is logged and does not
/// fail the call.
pub async fn delete_asset(ctx: &LedgerContext, asset_id: DbId) -> ServiceResult<Asset> {
    let deleted = AssetRepo::delete(&ctx.pool, asset_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Asset",
            id: asset_id,
        })?;
    tracing::info!(
        asset_id,
        application_number = %deleted.application_number,
        "Asset deleted"
    );

    let kind = deleted.kind()?;
    if let Err(e) = ctx.attachments.remove(kind, &deleted.application_number).await {
        tracing::warn!(
            asset_id,
            application_number = %deleted.application_number,
            error = %e,
            "Attachment cleanup failed"
        );
    }
    Ok(deleted)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn find_asset(ctx: &LedgerContext, key: &AssetKey) -> ServiceResult<Asset> {
    let found = match key {
        AssetKey::Id(id) => AssetRepo::find_by_id(&ctx.pool, *id).await?,
        AssetKey::ApplicationNumber(number) => {
            AssetRepo::find_by_application_number(&ctx.pool, number).await?
        }
    };
    found.ok_or_else(|| not_found(key).into())
}

fn not_found(key: &AssetKey) -> CoreError {
    match key {
        AssetKey::Id(id) => CoreError::NotFound {
            entity: "Asset",
            id: *id,
        },
        AssetKey::ApplicationNumber(number) => CoreError::NotFoundByKey {
            entity: "Asset",
            key: number.clone(),
        },
    }
}

//! Reviewer actions on the two-stage approval workflow.
//!
//! Each advance is a compare-and-swap on the asset's `version`. The version
//! a reviewer acted on can be passed explicitly, so two reviewers working
//! from the same snapshot cannot both succeed even if their calls do not
//! overlap in time.

use chrono::Utc;
use ipledger_core::approval::{plan_advance, Decision};
use ipledger_core::error::CoreError;
use ipledger_core::types::DbId;
use ipledger_db::models::asset::{Asset, AssetKey, ReviewUpdate};
use ipledger_db::repositories::AssetRepo;
use serde::Deserialize;
use validator::Validate;

use crate::assets::find_asset;
use crate::context::LedgerContext;
use crate::error::ServiceResult;
use crate::identity::Principal;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdvanceRequest {
    pub decision: Decision,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    /// Version of the asset the reviewer looked at. `None` means "whatever
    /// is current".
    #[serde(default)]
    pub expected_version: Option<i32>,
}

/// Record a reviewer's decision on the stage the asset is waiting for.
///
/// Fails with `InvalidState` if the review has already concluded and with
/// `ConcurrencyConflict` if the asset changed since `expected_version` (or
/// since it was read); nothing is written in either case.
pub async fn advance_approval(
    ctx: &LedgerContext,
    principal: &Principal,
    asset_id: DbId,
    req: &AdvanceRequest,
) -> ServiceResult<Asset> {
    req.validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let asset = find_asset(ctx, &AssetKey::Id(asset_id)).await?;

    // A stale snapshot is a conflict even if the asset has since concluded.
    let expected_version = req.expected_version.unwrap_or(asset.version);
    if expected_version != asset.version {
        return Err(conflict(asset_id));
    }
    let transition = plan_advance(asset.step()?, asset.status()?, req.decision)?;

    let update = ReviewUpdate {
        stage: transition.stage,
        next_step: transition.next_step,
        next_status: transition.next_status,
        reviewer_id: principal.user_id,
        comment: req
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        approved: transition.approved,
        reviewed_at: Utc::now(),
    };

    match AssetRepo::apply_review(&ctx.pool, asset_id, expected_version, &update).await? {
        Some(updated) => {
            tracing::info!(
                asset_id,
                reviewer_id = principal.user_id,
                role = ?principal.role,
                stage = transition.stage.name(),
                approved = transition.approved,
                status = transition.next_status.name(),
                version = updated.version,
                "Approval advanced"
            );
            Ok(updated)
        }
        None => {
            // Lost the swap: tell "deleted" apart from "changed underneath us".
            if AssetRepo::find_by_id(&ctx.pool, asset_id).await?.is_none() {
                return Err(CoreError::NotFound {
                    entity: "Asset",
                    id: asset_id,
                }
                .into());
            }
            tracing::info!(
                asset_id,
                reviewer_id = principal.user_id,
                expected_version,
                "Approval lost a concurrent update"
            );
            Err(conflict(asset_id))
        }
    }
}

fn conflict(asset_id: DbId) -> crate::error::ServiceError {
    CoreError::ConcurrencyConflict {
        entity: "Asset",
        id: asset_id,
    }
    .into()
}

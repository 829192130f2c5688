//! Asset entity model and DTOs.

use chrono::NaiveDate;
use ipledger_core::approval::{ApprovalStatus, ApprovalStep};
use ipledger_core::asset_kind::{type_name, AssetKind};
use ipledger_core::error::CoreError;
use ipledger_core::status::StatusId;
use ipledger_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::author::AssetAuthor;
use crate::models::fee::Fee;

/// A row from the `assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub kind_id: StatusId,
    pub type_code: StatusId,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub application_number: String,
    pub apply_date: NaiveDate,
    pub attachment_url: String,
    pub first_author_id: DbId,
    pub current_step_id: StatusId,
    pub approval_status_id: StatusId,
    pub initial_reviewer_id: Option<DbId>,
    pub initial_comment: Option<String>,
    pub initial_reviewed_at: Option<Timestamp>,
    pub initial_approved: Option<bool>,
    pub final_reviewer_id: Option<DbId>,
    pub final_comment: Option<String>,
    pub final_reviewed_at: Option<Timestamp>,
    pub final_approved: Option<bool>,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Asset {
    pub fn kind(&self) -> Result<AssetKind, CoreError> {
        AssetKind::from_id(self.kind_id)
    }

    pub fn step(&self) -> Result<ApprovalStep, CoreError> {
        ApprovalStep::from_id(self.current_step_id)
    }

    pub fn status(&self) -> Result<ApprovalStatus, CoreError> {
        ApprovalStatus::from_id(self.approval_status_id)
    }

    /// Display name of the sub-type, `"other"` if the code is unknown.
    pub fn type_name(&self) -> Result<&'static str, CoreError> {
        Ok(type_name(self.kind()?, self.type_code))
    }
}

/// Insert DTO for a new asset. Values are validated by the caller.
#[derive(Debug, Clone)]
pub struct CreateAsset {
    pub kind_id: StatusId,
    pub type_code: StatusId,
    pub title: String,
    pub abstract_text: String,
    pub application_number: String,
    pub apply_date: NaiveDate,
    pub attachment_url: String,
    pub first_author_id: DbId,
    pub created_at: Timestamp,
}

/// An asset together with the rows written alongside it at registration.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub asset: Asset,
    pub fee: Fee,
    pub authors: Vec<AssetAuthor>,
}

/// Review fields written by one workflow transition.
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    /// Stage whose reviewer columns receive the decision.
    pub stage: ApprovalStep,
    pub next_step: ApprovalStep,
    pub next_status: ApprovalStatus,
    pub reviewer_id: DbId,
    pub comment: Option<String>,
    pub approved: bool,
    pub reviewed_at: Timestamp,
}

/// Identifies an asset by primary key or by application number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKey {
    Id(DbId),
    ApplicationNumber(String),
}

impl AssetKey {
    /// All-digit input is an id; anything else is an application number.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<DbId>() {
            Ok(id) => AssetKey::Id(id),
            Err(_) => AssetKey::ApplicationNumber(trimmed.to_string()),
        }
    }

    pub(crate) fn id(&self) -> Option<DbId> {
        match self {
            AssetKey::Id(id) => Some(*id),
            AssetKey::ApplicationNumber(_) => None,
        }
    }

    pub(crate) fn application_number(&self) -> Option<&str> {
        match self {
            AssetKey::Id(_) => None,
            AssetKey::ApplicationNumber(n) => Some(n),
        }
    }
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKey::Id(id) => write!(f, "{id}"),
            AssetKey::ApplicationNumber(n) => f.write_str(n),
        }
    }
}

/// Filters for [`AssetRepo::list`](crate::repositories::AssetRepo::list).
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub kind_id: Option<StatusId>,
    pub approval_status_id: Option<StatusId>,
    pub current_step_id: Option<StatusId>,
    pub first_author_id: Option<DbId>,
    /// `ILIKE` pattern matched against title and application number.
    pub keyword_pattern: Option<String>,
}

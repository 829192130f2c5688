//! Asset kinds, their sub-types, and the per-type review fee schedule.
//!
//! Patents, trademarks and copyrighted works share one workflow and one fee
//! ledger. What differs per kind is captured here: the set of valid sub-type
//! codes (the single digit embedded in the application number), the review
//! fee charged at creation, and the storage prefix attachments live under.

use crate::error::CoreError;
use crate::status::{define_status_enum, StatusId};
use crate::types::Cents;

define_status_enum! {
    /// Top-level asset kind, backed by the `asset_kinds` lookup table.
    AssetKind ("asset_kinds") {
        Patent = 1 => "patent",
        Trademark = 2 => "trademark",
        Article = 3 => "article",
    }
}

impl AssetKind {
    /// Directory prefix under which the file-storage collaborator keeps
    /// attachments for this kind.
    pub fn storage_prefix(self) -> &'static str {
        self.name()
    }
}

/// One row of a kind's sub-type table.
struct SubType {
    code: StatusId,
    name: &'static str,
    fee: Cents,
}

const PATENT_TYPES: &[SubType] = &[
    SubType { code: 1, name: "invention", fee: 90_000 },
    SubType { code: 2, name: "utility_model", fee: 60_000 },
    SubType { code: 3, name: "design", fee: 60_000 },
    SubType { code: 8, name: "pct_invention", fee: 90_000 },
    SubType { code: 9, name: "pct_utility_model", fee: 60_000 },
];

const TRADEMARK_TYPES: &[SubType] = &[
    SubType { code: 1, name: "goods", fee: 100 },
    SubType { code: 2, name: "service", fee: 200 },
    SubType { code: 3, name: "collective", fee: 100 },
    SubType { code: 4, name: "certification", fee: 100 },
];

const ARTICLE_TYPES: &[SubType] = &[
    SubType { code: 0, name: "book", fee: 100 },
    SubType { code: 1, name: "journal_paper", fee: 100 },
    SubType { code: 2, name: "conference_paper", fee: 200 },
    SubType { code: 3, name: "degree_thesis", fee: 100 },
    SubType { code: 4, name: "technology_standard", fee: 100 },
    SubType { code: 5, name: "web_resource", fee: 100 },
];

fn table(kind: AssetKind) -> &'static [SubType] {
    match kind {
        AssetKind::Patent => PATENT_TYPES,
        AssetKind::Trademark => TRADEMARK_TYPES,
        AssetKind::Article => ARTICLE_TYPES,
    }
}

/// A validated (kind, sub-type) pair.
///
/// Construct through [`AssetType::new`] or [`AssetType::parse`]; both reject
/// codes that are not in the kind's table, so every value carries a fee and a
/// single-digit application-number code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetType {
    kind: AssetKind,
    index: usize,
}

impl AssetType {
    pub fn new(kind: AssetKind, code: StatusId) -> Result<Self, CoreError> {
        if let Some(index) = table(kind).iter().position(|t| t.code == code) {
            Ok(Self { kind, index })
        } else {
            Err(CoreError::Validation(format!(
                "Invalid {} type code {code}. Must be one of: {}",
                kind.name(),
                table(kind)
                    .iter()
                    .map(|t| t.code.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    /// Parse a sub-type from either its name (`"goods"`) or its numeric code (`"1"`).
    pub fn parse(kind: AssetKind, input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        if let Ok(code) = trimmed.parse::<StatusId>() {
            return Self::new(kind, code);
        }
        let needle = trimmed.to_ascii_lowercase();
        table(kind)
            .iter()
            .position(|t| t.name == needle)
            .map(|index| Self { kind, index })
            .ok_or_else(|| {
                CoreError::Validation(format!("Unrecognised {} type '{input}'", kind.name()))
            })
    }

    pub fn kind(self) -> AssetKind {
        self.kind
    }

    pub fn code(self) -> StatusId {
        self.row().code
    }

    /// The single character embedded at position 7 of the application number.
    pub fn digit(self) -> char {
        // Every table code is in 0..=9.
        char::from(b'0' + self.code() as u8)
    }

    fn row(self) -> &'static SubType {
        &table(self.kind)[self.index]
    }

    pub fn name(self) -> &'static str {
        self.row().name
    }

    /// Review fee charged when an asset of this type is registered.
    pub fn review_fee(self) -> Cents {
        self.row().fee
    }
}

/// Display name for a stored (kind, code) pair, falling back to `"other"` for
/// codes that are no longer in the table.
pub fn type_name(kind: AssetKind, code: StatusId) -> &'static str {
    AssetType::new(kind, code).map(AssetType::name).unwrap_or("other")
}

//! Domain logic for the IP ledger: application numbering, the two-stage
//! approval workflow, the fee schedule, and the statistics helpers shared
//! by the persistence and service layers.
//!
//! Nothing in this crate touches the database.

pub mod application_number;
pub mod approval;
pub mod asset_kind;
pub mod error;
pub mod fees;
pub mod search;
pub mod statistics;
pub mod status;
pub mod tech_domain;
pub mod types;

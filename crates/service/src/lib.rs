//! IP ledger service layer.
//!
//! Exposes the operations over assets, the approval workflow, the fee ledger
//! and the statistics dashboards, plus the config, context and error types
//! shared by integration tests and the reporting binary.

pub mod approval;
pub mod assets;
pub mod config;
pub mod context;
pub mod error;
pub mod fees;
pub mod identity;
pub mod response;
pub mod statistics;
pub mod storage;

//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Insert DTOs carrying already-validated values
//! - Filter structs for list queries

pub mod asset;
pub mod author;
pub mod fee;
pub mod statistics;
pub mod user;

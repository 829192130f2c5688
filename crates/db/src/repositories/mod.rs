//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod asset_repo;
pub mod author_repo;
pub mod fee_repo;
pub mod statistics_repo;
pub mod user_repo;

pub use asset_repo::AssetRepo;
pub use author_repo::AuthorRepo;
pub use fee_repo::FeeRepo;
pub use statistics_repo::StatisticsRepo;
pub use user_repo::UserRepo;

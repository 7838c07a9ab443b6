//! Generic ORM layer
//!
//! One engine maps any `#[derive(Entity)]` record type to its table,
//! compiles filter conditions into parameterized SQL, hides soft-deleted rows
//! and computes pagination windows:
//! - Table resolution (lowercase type name)
//! - WHERE compilation (AND-only, operator allowlist, mandatory `status != 0`)
//! - Page windows (`LIMIT offset, size` plus ceiling page count)
//! - Row decoding (positional, all-or-nothing)
//!
//! # Usage
//!
//! ```rust,ignore
//! use spx_backend::db::orm::{FilterCondition, QueryEngine};
//!
//! let engine = QueryEngine::new(pool.clone());
//! let costumes = engine
//!     .query_select::<Asset>(&[FilterCondition::eq("asset_type", "costume")])
//!     .await?;
//! ```

mod builder;
mod error;
mod filter;
mod mapper;
mod page;
mod repository;
mod store;
mod traits;

pub use builder::*;
pub use error::QueryError;
pub use filter::*;
pub use mapper::*;
pub use page::*;
pub use repository::*;
pub use store::*;
pub use traits::*;

/// Soft-delete flag column present on every queryable table
pub const STATUS_COLUMN: &str = "status";

/// `status` value marking a row as deleted
pub const DELETED_STATUS: i64 = 0;

/// Primary key column used for lookups by id
pub const PRIMARY_KEY: &str = "id";

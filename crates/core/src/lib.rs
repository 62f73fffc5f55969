//! # sheetlink-core
//!
//! Core types and request planning for the sheetlink client.
//!
//! This crate provides:
//! - A1 addressing and grid-region translation
//! - Cell data facet flags
//! - Read routing and write batching plans
//! - Retry policy and failure classification
//! - Error types

/// A1 addressing and grid-region translation.
pub mod address;
/// Error types and result aliases.
pub mod error;
/// Cell data facet flags.
pub mod facet;
/// Read routing and write batching plans.
pub mod plan;
/// Retry policy and failure classification.
pub mod retry;

pub use address::{
    column_index_to_letter, column_letter_to_index, expand_range_to_cells, parse_range,
    CellAddress, GridRegion, Range,
};
pub use error::{SheetError, SheetResult};
pub use facet::CellData;
pub use plan::{
    plan_read, plan_writes, ReadPlan, SheetIds, ValueRender, WriteIntent, WritePayload, WritePlan,
};
pub use retry::{FailureClass, RetryPolicy};

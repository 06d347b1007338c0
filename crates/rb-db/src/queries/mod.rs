//! Database query operations, grouped by resource.

pub mod entries;
pub mod series;

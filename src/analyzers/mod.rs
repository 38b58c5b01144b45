//! Turns raw counts into normalized, smoothed series.
//!
//! Raw rows are summed per day and status ([`aggregate`]), joined with the
//! day's vaccination rate and scaled to a per-capita rate within each
//! subgroup ([`normalize`]), then smoothed with trailing means
//! ([`rolling`]). [`analyzer::analyze`] chains the three.

pub mod aggregate;
pub mod analyzer;
pub mod normalize;
pub mod rolling;
pub mod types;
pub mod utility;

//! Reusable rendering helpers.

pub mod status_indicator;

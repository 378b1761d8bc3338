//! CAKe Analysis - memory accuracy study figures
//!
//! Loads participant accuracy scores from CSV, runs the group x task ANOVA
//! and CAKe correlations, and renders the figures with plotters.

pub mod analysis;
pub mod charts;
pub mod data;
pub mod settings;
pub mod stats;

//! Statistics module - descriptive stats, t-tests, correlations and mixed ANOVA

pub mod anova;
mod calculator;
pub mod correlation;
mod errors;
pub mod significance;

pub use anova::{mixed_anova, AnovaRow, MixedAnovaTable, MixedDesign};
pub use calculator::{GroupMeanSummary, StatsCalculator, TTestResult, SIGNIFICANCE_THRESHOLD};
pub use correlation::{correlate_all, pearson, CorrelationRequest, CorrelationResult, NamedCorrelation};
pub use errors::{StatsError, StatsResult};
pub use significance::SignificanceTier;

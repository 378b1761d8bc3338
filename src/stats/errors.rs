use thiserror::Error;

/// Errors raised by the statistics layer.
///
/// Every variant names the sample or comparison it came from so a failed
/// analysis run points straight at the offending column.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Insufficient data for {what}: {n} observations (need at least {min})")]
    InsufficientData {
        what: String,
        n: usize,
        min: usize,
    },

    #[error("Dimension mismatch for {what}: x has {x_len} values, y has {y_len}")]
    DimensionMismatch {
        what: String,
        x_len: usize,
        y_len: usize,
    },

    #[error("Constant input for {what}: correlation is undefined")]
    ConstantInput { what: String },

    #[error("Non-finite value in {what}")]
    NonFinite { what: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Distribution error: {0}")]
    Distribution(String),
}

/// Result type for statistical operations
pub type StatsResult<T> = Result<T, StatsError>;

/// Reject samples that are too short or carry NaN/inf.
pub(crate) fn check_sample(values: &[f64], what: &str, min: usize) -> StatsResult<()> {
    if values.len() < min {
        return Err(StatsError::InsufficientData {
            what: what.to_string(),
            n: values.len(),
            min,
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::NonFinite {
            what: what.to_string(),
        });
    }
    Ok(())
}

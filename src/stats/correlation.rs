//! Pearson correlation with a first-degree least-squares fit.

use super::errors::{check_sample, StatsError, StatsResult};
use super::significance::SignificanceTier;
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Widest x span, in integer steps, a fitted line is evaluated over.
pub const MAX_LINE_SPAN: f64 = 100_000.0;

/// Correlation between two paired samples and the best-fit line through them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub r: f64,
    pub p_value: f64,
    pub slope: f64,
    pub intercept: f64,
    pub n: usize,
}

impl CorrelationResult {
    pub fn tier(&self) -> SignificanceTier {
        SignificanceTier::from_p(self.p_value)
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Legend text: `"{label}: r = 0.42, p < .05"`.
    pub fn legend_text(&self, label: &str) -> String {
        format!(
            "{}: r = {:.2}, {}",
            label,
            self.r,
            SignificanceTier::p_clause(self.p_value)
        )
    }

    /// Fitted values at every integer in `[floor(min x), floor(max x)]`.
    pub fn line_over_integer_range(&self, x: &[f64]) -> StatsResult<Vec<(f64, f64)>> {
        let min = x.iter().copied().fold(f64::INFINITY, f64::min);
        let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return Err(StatsError::NonFinite {
                what: "fitted line range".to_string(),
            });
        }

        let (start, end) = (min.floor(), max.floor());
        if end - start > MAX_LINE_SPAN {
            return Err(StatsError::InvalidParameter(format!(
                "fitted line over [{start}, {end}] exceeds {MAX_LINE_SPAN} integer steps"
            )));
        }

        let steps = (end - start) as usize;
        Ok((0..=steps)
            .map(|i| {
                let xf = start + i as f64;
                (xf, self.predict(xf))
            })
            .collect())
    }
}

/// Pearson product-moment correlation, two-sided p-value, and least-squares line.
pub fn pearson(x: &[f64], y: &[f64], what: &str) -> StatsResult<CorrelationResult> {
    if x.len() != y.len() {
        return Err(StatsError::DimensionMismatch {
            what: what.to_string(),
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    check_sample(x, what, 2)?;
    check_sample(y, what, 2)?;

    let n = x.len();
    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    // Spread at the level of rounding noise counts as constant.
    if is_flat(sxx, mean_x, nf) || is_flat(syy, mean_y, nf) {
        return Err(StatsError::ConstantInput {
            what: what.to_string(),
        });
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let p_value = if n == 2 {
        1.0
    } else if r.abs() >= 1.0 {
        0.0
    } else {
        let df = nf - 2.0;
        let t = r * (df / (1.0 - r * r)).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| StatsError::Distribution(format!("{what}: {e}")))?;
        (2.0 * dist.sf(t.abs())).min(1.0)
    };

    Ok(CorrelationResult {
        r,
        p_value,
        slope,
        intercept,
        n,
    })
}

fn is_flat(sum_sq: f64, mean: f64, n: f64) -> bool {
    sum_sq <= f64::EPSILON * n * mean.abs().max(1.0).powi(2)
}

/// One row of a correlation report.
#[derive(Debug, Clone, Serialize)]
pub struct NamedCorrelation {
    pub subset: String,
    pub label: String,
    pub result: CorrelationResult,
}

/// A pair of samples queued for the correlation report.
pub struct CorrelationRequest<'a> {
    pub subset: &'a str,
    pub label: &'a str,
    pub x: &'a [f64],
    pub y: &'a [f64],
}

/// Correlate every request in parallel, keeping request order.
pub fn correlate_all(requests: &[CorrelationRequest<'_>]) -> StatsResult<Vec<NamedCorrelation>> {
    requests
        .par_iter()
        .map(|req| {
            let what = format!("{} / {}", req.subset, req.label);
            pearson(req.x, req.y, &what).map(|result| NamedCorrelation {
                subset: req.subset.to_string(),
                label: req.label.to_string(),
                result,
            })
        })
        .collect()
}

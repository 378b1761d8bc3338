//! Statistics Calculator Module
//! Descriptive statistics (mean, SEM) and the equal-variance two-sample t-test.

use super::errors::{check_sample, StatsError, StatsResult};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Mean and standard error of one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMeanSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub sem: f64,
}

/// Outcome of an independent-samples t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTestResult {
    pub statistic: f64,
    pub df: f64,
    pub p_value: f64,
}

impl TTestResult {
    pub fn is_significant(&self) -> bool {
        self.p_value < SIGNIFICANCE_THRESHOLD
    }
}

/// Handles statistical calculations on plain samples.
pub struct StatsCalculator;

impl StatsCalculator {
    pub fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Sample variance (n - 1 denominator).
    pub fn variance(values: &[f64]) -> f64 {
        let n = values.len();
        if n < 2 {
            return f64::NAN;
        }
        let mean = Self::mean(values);
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    }

    /// Standard error of the mean: sample standard deviation over sqrt(n).
    pub fn sem(values: &[f64]) -> f64 {
        Self::variance(values).sqrt() / (values.len() as f64).sqrt()
    }

    /// Compute mean, standard deviation and SEM for a named sample.
    ///
    /// Needs at least two finite observations, otherwise the SEM is undefined.
    pub fn summarize(values: &[f64], name: &str) -> StatsResult<GroupMeanSummary> {
        check_sample(values, name, 2)?;

        let variance = Self::variance(values);
        let std = variance.sqrt();

        Ok(GroupMeanSummary {
            name: name.to_string(),
            count: values.len(),
            mean: Self::mean(values),
            std,
            sem: std / (values.len() as f64).sqrt(),
        })
    }

    /// Student's t-test (independent samples, pooled variance).
    pub fn student_ttest(a: &[f64], b: &[f64], what: &str) -> StatsResult<TTestResult> {
        check_sample(a, what, 2)?;
        check_sample(b, what, 2)?;

        let n1 = a.len() as f64;
        let n2 = b.len() as f64;
        let mean1 = Self::mean(a);
        let mean2 = Self::mean(b);
        let df = n1 + n2 - 2.0;

        let pooled =
            ((n1 - 1.0) * Self::variance(a) + (n2 - 1.0) * Self::variance(b)) / df;
        let se = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();

        if se == 0.0 {
            // Both samples constant: identical means are indistinguishable,
            // distinct means are separated with certainty.
            return Ok(if mean1 == mean2 {
                TTestResult {
                    statistic: 0.0,
                    df,
                    p_value: 1.0,
                }
            } else {
                TTestResult {
                    statistic: (mean1 - mean2).signum() * f64::INFINITY,
                    df,
                    p_value: 0.0,
                }
            });
        }

        let t = (mean1 - mean2) / se;

        // Two-tailed p-value using t-distribution
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| StatsError::Distribution(format!("{what}: {e}")))?;
        let p_value = (2.0 * dist.sf(t.abs())).min(1.0);

        Ok(TTestResult {
            statistic: t,
            df,
            p_value,
        })
    }
}

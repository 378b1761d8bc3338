//! Two-way mixed-design ANOVA: one between-subjects factor, one
//! within-subjects (repeated) factor.
//!
//! Sums of squares follow the classic split-plot partition:
//!
//! ```text
//! SS_total = SS_between + SS_subjects(within groups)
//!          + SS_within + SS_interaction + SS_error(within)
//! ```
//!
//! No sphericity correction is applied; with two within levels none is needed.

use super::errors::{check_sample, StatsError, StatsResult};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use std::fmt;

/// Scores laid out by between-group and within-level.
///
/// `cells[g][j]` holds every subject of group `g` at within level `j`; the
/// same index refers to the same subject across levels of one group.
#[derive(Debug, Clone)]
pub struct MixedDesign<'a> {
    pub between: &'a str,
    pub within: &'a str,
    pub cells: Vec<Vec<&'a [f64]>>,
}

/// One effect row of the ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaRow {
    pub source: String,
    pub ss: f64,
    pub df1: f64,
    pub df2: f64,
    pub ms: f64,
    pub f: f64,
    pub p_unc: f64,
    pub np2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixedAnovaTable {
    pub rows: Vec<AnovaRow>,
}

impl MixedAnovaTable {
    pub fn row(&self, source: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.source == source)
    }
}

impl fmt::Display for MixedAnovaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=============")?;
        writeln!(f, "ANOVA SUMMARY")?;
        writeln!(f, "=============")?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<12} {:>8} {:>5} {:>5} {:>8} {:>8} {:>8} {:>6}",
            "Source", "SS", "DF1", "DF2", "MS", "F", "p-unc", "np2"
        )?;
        writeln!(f, "{}", "-".repeat(67))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<12} {:>8.3} {:>5} {:>5} {:>8.3} {:>8.3} {:>8.3} {:>6.3}",
                row.source, row.ss, row.df1, row.df2, row.ms, row.f, row.p_unc, row.np2
            )?;
        }
        Ok(())
    }
}

/// Run the mixed ANOVA and return rows for the between factor, the within
/// factor and their interaction, in that order.
pub fn mixed_anova(design: &MixedDesign<'_>) -> StatsResult<MixedAnovaTable> {
    let n_groups = design.cells.len();
    if n_groups < 2 {
        return Err(StatsError::InvalidParameter(format!(
            "{} needs at least 2 groups, got {}",
            design.between, n_groups
        )));
    }
    let n_levels = design.cells[0].len();
    if n_levels < 2 {
        return Err(StatsError::InvalidParameter(format!(
            "{} needs at least 2 levels, got {}",
            design.within, n_levels
        )));
    }

    let mut group_sizes = Vec::with_capacity(n_groups);
    for (g, levels) in design.cells.iter().enumerate() {
        if levels.len() != n_levels {
            return Err(StatsError::InvalidParameter(format!(
                "{} group {} has {} levels of {}, expected {}",
                design.between,
                g + 1,
                levels.len(),
                design.within,
                n_levels
            )));
        }
        let n = levels[0].len();
        for (j, cell) in levels.iter().enumerate() {
            let what = format!("{} {} / {} {}", design.between, g + 1, design.within, j + 1);
            check_sample(cell, &what, 1)?;
            if cell.len() != n {
                return Err(StatsError::DimensionMismatch {
                    what,
                    x_len: n,
                    y_len: cell.len(),
                });
            }
        }
        group_sizes.push(n);
    }

    let n_subjects: usize = group_sizes.iter().sum();
    if n_subjects <= n_groups {
        return Err(StatsError::InsufficientData {
            what: format!("{} x {} mixed ANOVA", design.between, design.within),
            n: n_subjects,
            min: n_groups + 1,
        });
    }

    let j = n_levels as f64;
    let total: f64 = design
        .cells
        .iter()
        .flat_map(|levels| levels.iter().flat_map(|cell| cell.iter()))
        .sum();
    let grand_mean = total / (n_subjects as f64 * j);

    let cell_means: Vec<Vec<f64>> = design
        .cells
        .iter()
        .map(|levels| {
            levels
                .iter()
                .map(|cell| cell.iter().sum::<f64>() / cell.len() as f64)
                .collect()
        })
        .collect();
    let group_means: Vec<f64> = cell_means
        .iter()
        .map(|means| means.iter().sum::<f64>() / j)
        .collect();
    let level_means: Vec<f64> = (0..n_levels)
        .map(|lvl| {
            design
                .cells
                .iter()
                .map(|levels| levels[lvl].iter().sum::<f64>())
                .sum::<f64>()
                / n_subjects as f64
        })
        .collect();

    let mut ss_between = 0.0;
    let mut ss_subjects = 0.0;
    let mut ss_interaction = 0.0;
    let mut ss_error = 0.0;

    for (g, levels) in design.cells.iter().enumerate() {
        let n_g = group_sizes[g] as f64;
        ss_between += j * n_g * (group_means[g] - grand_mean).powi(2);

        for lvl in 0..n_levels {
            let dev = cell_means[g][lvl] - group_means[g] - level_means[lvl] + grand_mean;
            ss_interaction += n_g * dev * dev;
        }

        for s in 0..group_sizes[g] {
            let subject_mean = levels.iter().map(|cell| cell[s]).sum::<f64>() / j;
            ss_subjects += j * (subject_mean - group_means[g]).powi(2);
            for lvl in 0..n_levels {
                let resid = levels[lvl][s] - subject_mean - cell_means[g][lvl] + group_means[g];
                ss_error += resid * resid;
            }
        }
    }

    let ss_within: f64 = level_means
        .iter()
        .map(|m| n_subjects as f64 * (m - grand_mean).powi(2))
        .sum();

    let df_between = (n_groups - 1) as f64;
    let df_subjects = (n_subjects - n_groups) as f64;
    let df_within = (n_levels - 1) as f64;
    let df_interaction = df_between * df_within;
    let df_error = df_subjects * df_within;

    Ok(MixedAnovaTable {
        rows: vec![
            effect_row(design.between, ss_between, df_between, ss_subjects, df_subjects)?,
            effect_row(design.within, ss_within, df_within, ss_error, df_error)?,
            effect_row("Interaction", ss_interaction, df_interaction, ss_error, df_error)?,
        ],
    })
}

fn effect_row(source: &str, ss: f64, df1: f64, ss_err: f64, df2: f64) -> StatsResult<AnovaRow> {
    let ms = ss / df1;
    let ms_err = ss_err / df2;
    let f = ms / ms_err;

    let p_unc = if f.is_nan() {
        f64::NAN
    } else if f.is_infinite() {
        0.0
    } else {
        FisherSnedecor::new(df1, df2)
            .map_err(|e| StatsError::Distribution(format!("{source}: {e}")))?
            .sf(f)
    };

    Ok(AnovaRow {
        source: source.to_string(),
        ss,
        df1,
        df2,
        ms,
        f,
        p_unc,
        np2: ss / (ss + ss_err),
    })
}

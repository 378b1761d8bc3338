//! The two CAKe study analyses: group x task ANOVA with bar charts, and
//! CAKe-score correlations with annotated best-fit lines.

use crate::charts::{
    self, BarChartPlan, BarPanel, ChartError, CorrelationLine, CorrelationPanelSpec, FigureSize,
    LineSpec, LineStyle, PanelAxes, RepeatedMeasures2x2, CONTEXT_COLOR, FEATURE_COLOR,
};
use crate::data::{CakeGroup, DataLoader, LoaderError, Measure, ParticipantTable, Sex};
use crate::settings::AnalysisSettings;
use crate::stats::{
    correlate_all, mixed_anova, CorrelationRequest, MixedAnovaTable, MixedDesign,
    NamedCorrelation, SignificanceTier, StatsError,
};
use log::{info, warn};
use plotters::style::RGBColor;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const GROUP_LABELS: [&str; 2] = ["Normal", "Impaired"];
pub const COND_LABELS: [&str; 2] = ["Feature", "Context"];
pub const ACCURACY_LABEL: &str = "Memory Accuracy";
pub const CAKE_LABEL: &str = "CAKe score";
/// CAKe axis runs from 24 on the left down to 6.
pub const CAKE_AXIS: (f64, f64) = (24.0, 6.0);
pub const ACCURACY_AXIS: (f64, f64) = (0.7, 1.0);

pub const ANOVA_FIGURE: &str = "cake_anova.png";
pub const CORRELATION_FIGURE: &str = "cake_corrs_all.png";
pub const CORRELATION_BY_SEX_FIGURE: &str = "cake_corrs_by_sex.png";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Feature and context scores of one memory type, split by CAKe group.
///
/// Participants keep file order inside each group, so index `i` of the
/// feature and context vectors is the same person.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskScores {
    pub normal_feature: Vec<f64>,
    pub normal_context: Vec<f64>,
    pub impaired_feature: Vec<f64>,
    pub impaired_context: Vec<f64>,
}

impl TaskScores {
    pub fn collect(table: &ParticipantTable, cutoff: f64, feature: Measure, context: Measure) -> Self {
        let normal = table.by_group(cutoff, CakeGroup::Normal);
        let impaired = table.by_group(cutoff, CakeGroup::Impaired);
        Self {
            normal_feature: normal.values(feature),
            normal_context: normal.values(context),
            impaired_feature: impaired.values(feature),
            impaired_context: impaired.values(context),
        }
    }

    pub fn samples(&self) -> RepeatedMeasures2x2<'_> {
        RepeatedMeasures2x2 {
            a1: &self.normal_feature,
            a2: &self.normal_context,
            b1: &self.impaired_feature,
            b2: &self.impaired_context,
        }
    }

    /// Group (Normal = 1, Impaired = 2) x Task (Feature = 1, Context = 2).
    pub fn design(&self) -> MixedDesign<'_> {
        MixedDesign {
            between: "Group",
            within: "Task",
            cells: vec![
                vec![self.normal_feature.as_slice(), self.normal_context.as_slice()],
                vec![self.impaired_feature.as_slice(), self.impaired_context.as_slice()],
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionReport {
    pub condition: String,
    pub t: f64,
    pub df: f64,
    pub p_value: f64,
    pub tier: SignificanceTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelReport {
    pub title: String,
    pub comparisons: Vec<ConditionReport>,
}

impl PanelReport {
    fn from_plan(title: &str, plan: &BarChartPlan) -> Self {
        Self {
            title: title.to_string(),
            comparisons: plan
                .tests
                .iter()
                .map(|test| ConditionReport {
                    condition: plan.cond_labels[test.condition].clone(),
                    t: test.ttest.statistic,
                    df: test.ttest.df,
                    p_value: test.ttest.p_value,
                    tier: test.tier,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnovaReport {
    pub anova: MixedAnovaTable,
    pub panels: Vec<PanelReport>,
    pub figure: PathBuf,
}

impl fmt::Display for AnovaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.anova)?;
        for panel in &self.panels {
            writeln!(f)?;
            writeln!(f, "{}: {} vs {}", panel.title, GROUP_LABELS[0], GROUP_LABELS[1])?;
            for c in &panel.comparisons {
                writeln!(
                    f,
                    "  {:<8} t({}) = {:>7.3}, p = {:.4} {}",
                    c.condition, c.df, c.t, c.p_value, c.tier
                )?;
            }
        }
        Ok(())
    }
}

/// Mixed ANOVA on source accuracy, then the Source / Item memory bar figure.
pub fn run_anova(settings: &AnalysisSettings) -> Result<AnovaReport, AnalysisError> {
    let table = DataLoader::load_path(&settings.csv_path)?;
    let cutoff = settings.cake_cutoff;

    let source = TaskScores::collect(&table, cutoff, Measure::SourceFeature, Measure::SourceContext);
    let item = TaskScores::collect(&table, cutoff, Measure::ItemFeature, Measure::ItemContext);
    info!(
        "CAKe >= {}: {} normal, {} impaired",
        cutoff,
        source.normal_feature.len(),
        source.impaired_feature.len()
    );

    let anova = mixed_anova(&source.design())?;

    let figure = prepare_output(settings, ANOVA_FIGURE)?;
    let titles = ["Source Memory", "Item Memory"];
    let panels = [
        BarPanel {
            title: titles[0],
            y_label: ACCURACY_LABEL,
            samples: source.samples(),
        },
        BarPanel {
            title: titles[1],
            y_label: ACCURACY_LABEL,
            samples: item.samples(),
        },
    ];
    let plans = charts::render_bar_figure(
        &figure,
        FigureSize::WIDE,
        &panels,
        settings.bar_width,
        GROUP_LABELS,
        COND_LABELS,
    )?;

    let report = AnovaReport {
        anova,
        panels: titles
            .iter()
            .zip(&plans)
            .map(|(title, plan)| PanelReport::from_plan(title, plan))
            .collect(),
        figure: figure.clone(),
    };

    write_report(settings, &report)?;
    display(settings, &figure);
    Ok(report)
}

/// Line colour: context measures blue, feature measures green.
pub fn measure_color(measure: Measure) -> RGBColor {
    if measure.is_context() {
        CONTEXT_COLOR
    } else {
        FEATURE_COLOR
    }
}

/// Line style: source memory solid, item memory dashed.
pub fn measure_style(measure: Measure) -> LineStyle {
    if measure.is_source() {
        LineStyle::Solid
    } else {
        LineStyle::Dashed
    }
}

/// CAKe scores and the four accuracy measures of one participant subset.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetColumns {
    pub name: String,
    pub cake: Vec<f64>,
    pub measures: Vec<(Measure, Vec<f64>)>,
}

impl SubsetColumns {
    pub fn from_table(name: &str, table: &ParticipantTable) -> Self {
        Self {
            name: name.to_string(),
            cake: table.cake_scores(),
            measures: Measure::ALL
                .iter()
                .map(|&m| (m, table.values(m)))
                .collect(),
        }
    }

    pub fn requests(&self) -> Vec<CorrelationRequest<'_>> {
        self.measures
            .iter()
            .map(|(m, values)| CorrelationRequest {
                subset: &self.name,
                label: m.label(),
                x: &self.cake,
                y: values,
            })
            .collect()
    }

    pub fn panel(&self, title: Option<&str>) -> CorrelationPanelSpec<'_> {
        CorrelationPanelSpec {
            axes: PanelAxes {
                title: title.map(str::to_string),
                x_label: CAKE_LABEL.to_string(),
                y_label: ACCURACY_LABEL.to_string(),
                x_limits: CAKE_AXIS,
                y_limits: ACCURACY_AXIS,
            },
            lines: self
                .measures
                .iter()
                .map(|(m, values)| LineSpec {
                    label: m.label(),
                    x: &self.cake,
                    y: values,
                    color: measure_color(*m),
                    style: measure_style(*m),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationReport {
    pub rows: Vec<NamedCorrelation>,
    pub figures: Vec<PathBuf>,
}

impl fmt::Display for CorrelationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<8} {:<24} {:>4} {:>7} {:>9}",
            "Subset", "Measure", "n", "r", "p"
        )?;
        writeln!(f, "{}", "-".repeat(56))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<8} {:<24} {:>4} {:>7.3} {:>9.4}",
                row.subset, row.label, row.result.n, row.result.r, row.result.p_value
            )?;
        }
        Ok(())
    }
}

/// CAKe correlations for all participants, then split by sex.
pub fn run_correlations(settings: &AnalysisSettings) -> Result<CorrelationReport, AnalysisError> {
    let table = DataLoader::load_path(&settings.csv_path)?;

    let all = SubsetColumns::from_table("All", &table);
    let by_sex: Vec<SubsetColumns> = if table.participants().iter().any(|p| p.sex.is_some()) {
        Sex::ALL
            .iter()
            .map(|&sex| SubsetColumns::from_table(sex.plural(), &table.by_sex(sex)))
            .collect()
    } else {
        warn!("No Sex values in data; skipping the split by sex");
        Vec::new()
    };

    let requests: Vec<CorrelationRequest<'_>> = std::iter::once(&all)
        .chain(&by_sex)
        .flat_map(SubsetColumns::requests)
        .collect();
    let rows = correlate_all(&requests)?;

    let mut figures = Vec::new();

    let all_path = prepare_output(settings, CORRELATION_FIGURE)?;
    let drawn = charts::render_correlation_figure(&all_path, FigureSize::SINGLE, &[all.panel(None)])?;
    log_lines(&drawn);
    figures.push(all_path);

    if !by_sex.is_empty() {
        let sex_path = prepare_output(settings, CORRELATION_BY_SEX_FIGURE)?;
        let panels: Vec<CorrelationPanelSpec<'_>> = by_sex
            .iter()
            .map(|subset| subset.panel(Some(subset.name.as_str())))
            .collect();
        let drawn = charts::render_correlation_figure(&sex_path, FigureSize::WIDE, &panels)?;
        log_lines(&drawn);
        figures.push(sex_path);
    }

    let report = CorrelationReport { rows, figures };
    write_report(settings, &report)?;
    for figure in &report.figures {
        display(settings, figure);
    }
    Ok(report)
}

fn log_lines(panels: &[Vec<CorrelationLine>]) {
    for line in panels.iter().flatten() {
        info!("{}", line.legend);
    }
}

fn prepare_output(settings: &AnalysisSettings, name: &str) -> Result<PathBuf, AnalysisError> {
    std::fs::create_dir_all(&settings.output_dir).map_err(|source| AnalysisError::Io {
        path: settings.output_dir.clone(),
        source,
    })?;
    Ok(settings.output_file(name))
}

fn write_report<T: Serialize>(settings: &AnalysisSettings, report: &T) -> Result<(), AnalysisError> {
    let Some(path) = &settings.report_path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| AnalysisError::Io {
        path: path.clone(),
        source,
    })?;
    info!("Wrote report {}", path.display());
    Ok(())
}

/// A viewer that fails to launch is not fatal; the PNG is already on disk.
fn display(settings: &AnalysisSettings, figure: &Path) {
    if !settings.show {
        return;
    }
    if let Err(e) = charts::show(figure) {
        warn!("{}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Participant;

    fn participant(cake: f64, source_c: f64, source_f: f64, sex: Option<Sex>) -> Participant {
        Participant {
            cake,
            source_acc_context: source_c,
            source_acc_feature: source_f,
            item_acc_context: source_c + 0.05,
            item_acc_feature: source_f + 0.05,
            sex,
        }
    }

    fn table() -> ParticipantTable {
        ParticipantTable::new(vec![
            participant(24.0, 0.90, 0.85, Some(Sex::Female)),
            participant(14.0, 0.70, 0.72, Some(Sex::Male)),
            participant(21.0, 0.88, 0.80, Some(Sex::Male)),
            participant(18.0, 0.75, 0.71, Some(Sex::Female)),
        ])
    }

    #[test]
    fn test_task_scores_split_at_cutoff() {
        let scores =
            TaskScores::collect(&table(), 21.0, Measure::SourceFeature, Measure::SourceContext);
        assert_eq!(scores.normal_feature, vec![0.85, 0.80]);
        assert_eq!(scores.normal_context, vec![0.90, 0.88]);
        assert_eq!(scores.impaired_feature, vec![0.72, 0.71]);
        assert_eq!(scores.impaired_context, vec![0.70, 0.75]);

        let samples = scores.samples();
        assert_eq!(samples.b2, &[0.70, 0.75][..]);
    }

    #[test]
    fn test_design_layout() {
        let scores =
            TaskScores::collect(&table(), 21.0, Measure::SourceFeature, Measure::SourceContext);
        let design = scores.design();
        assert_eq!(design.cells.len(), 2);
        assert_eq!(design.cells[0][1], &[0.90, 0.88][..]);
        assert_eq!(design.cells[1][0], &[0.72, 0.71][..]);

        let table = mixed_anova(&design).unwrap();
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_line_appearance_per_measure() {
        assert_eq!(measure_color(Measure::SourceContext), CONTEXT_COLOR);
        assert_eq!(measure_color(Measure::ItemFeature), FEATURE_COLOR);
        assert_eq!(measure_style(Measure::SourceFeature), LineStyle::Solid);
        assert_eq!(measure_style(Measure::ItemContext), LineStyle::Dashed);
    }

    #[test]
    fn test_subset_panel_and_requests() {
        let females = SubsetColumns::from_table(Sex::Female.plural(), &table().by_sex(Sex::Female));
        assert_eq!(females.cake, vec![24.0, 18.0]);

        let requests = females.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].subset, "Females");
        assert_eq!(requests[0].label, "Source memory(context)");

        let panel = females.panel(Some("Females"));
        assert_eq!(panel.axes.title.as_deref(), Some("Females"));
        assert!(panel.axes.x_reversed());
        assert_eq!(panel.lines.len(), 4);
        assert_eq!(panel.lines[3].label, "Item memory(feature)");
        assert_eq!(panel.lines[3].style, LineStyle::Dashed);
    }

    #[test]
    fn test_correlation_report_rows() {
        let all = SubsetColumns::from_table("All", &table());
        let rows = correlate_all(&all.requests()).unwrap();
        let report = CorrelationReport {
            rows,
            figures: Vec::new(),
        };
        assert_eq!(report.rows.len(), 4);
        assert!(report.rows.iter().all(|r| r.result.r > 0.0));
        assert!(report.to_string().contains("Source memory(context)"));
    }
}

//! Figure composition: panels side by side in one PNG, then optionally shown
//! in the system image viewer.

use super::bar_chart::{render_grouped_significance_bars, BarChartPlan, RepeatedMeasures2x2};
use super::correlation_line::{CorrelationLine, CorrelationPanel, LineStyle, PanelAxes};
use super::{drawing, ChartError};
use log::info;
use plotters::prelude::*;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

impl FigureSize {
    /// Two panels side by side.
    pub const WIDE: FigureSize = FigureSize {
        width: 1200,
        height: 600,
    };
    pub const SINGLE: FigureSize = FigureSize {
        width: 800,
        height: 600,
    };
}

/// One bar panel of a figure.
pub struct BarPanel<'a> {
    pub title: &'a str,
    pub y_label: &'a str,
    pub samples: RepeatedMeasures2x2<'a>,
}

/// One fitted line of a correlation panel.
pub struct LineSpec<'a> {
    pub label: &'a str,
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub color: RGBColor,
    pub style: LineStyle,
}

pub struct CorrelationPanelSpec<'a> {
    pub axes: PanelAxes,
    pub lines: Vec<LineSpec<'a>>,
}

/// Render bar panels left to right into a PNG at `path`.
pub fn render_bar_figure(
    path: &Path,
    size: FigureSize,
    panels: &[BarPanel<'_>],
    bar_width: f64,
    group_labels: [&str; 2],
    cond_labels: [&str; 2],
) -> Result<Vec<BarChartPlan>, ChartError> {
    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;
    let areas = root.split_evenly((1, panels.len().max(1)));

    let mut plans = Vec::with_capacity(panels.len());
    for (panel, area) in panels.iter().zip(&areas) {
        let plan = render_grouped_significance_bars(
            area,
            &panel.samples,
            bar_width,
            group_labels,
            cond_labels,
            panel.title,
            panel.y_label,
        )?;
        plans.push(plan);
    }

    root.present().map_err(drawing)?;
    info!("Wrote {}", path.display());
    Ok(plans)
}

/// Render correlation panels left to right into a PNG at `path`.
pub fn render_correlation_figure(
    path: &Path,
    size: FigureSize,
    panels: &[CorrelationPanelSpec<'_>],
) -> Result<Vec<Vec<CorrelationLine>>, ChartError> {
    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;
    let areas = root.split_evenly((1, panels.len().max(1)));

    let mut drawn = Vec::with_capacity(panels.len());
    for (spec, area) in panels.iter().zip(&areas) {
        let mut panel = CorrelationPanel::new(area, &spec.axes)?;
        for line in &spec.lines {
            panel.add_correlation_line(line.x, line.y, line.color, line.style, line.label)?;
        }
        drawn.push(panel.finish()?);
    }

    root.present().map_err(drawing)?;
    info!("Wrote {}", path.display());
    Ok(drawn)
}

/// Open a rendered figure with the system default viewer.
pub fn show(path: &Path) -> Result<(), ChartError> {
    open::that(path).map_err(|source| ChartError::Viewer {
        path: path.to_path_buf(),
        source,
    })
}

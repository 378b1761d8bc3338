//! Charts module - Chart rendering

mod bar_chart;
mod correlation_line;
mod figure;

pub use bar_chart::{
    render_grouped_significance_bars, BarChartPlan, BarSpec, Bracket, ConditionTest,
    GroupedSignificanceBarChart, RepeatedMeasures2x2, GROUP_A_COLOR, GROUP_B_COLOR,
};
pub use correlation_line::{
    AnnotatedCorrelationLine, CorrelationLine, CorrelationPanel, LineStyle, PanelAxes,
    CONTEXT_COLOR, FEATURE_COLOR,
};
pub use figure::{
    render_bar_figure, render_correlation_figure, show, BarPanel, CorrelationPanelSpec,
    FigureSize, LineSpec,
};

use crate::stats::StatsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Failed to open {path}: {source}")]
    Viewer {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// plotters errors are generic over the backend; keep only the message.
pub(crate) fn drawing<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Drawing(err.to_string())
}

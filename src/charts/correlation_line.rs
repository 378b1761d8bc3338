//! Best-fit lines annotated with Pearson r and a significance clause.

use super::{drawing, ChartError};
use crate::stats::{pearson, CorrelationResult, StatsResult};
use log::debug;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

pub const CONTEXT_COLOR: RGBColor = RGBColor(65, 105, 225); // royalblue
pub const FEATURE_COLOR: RGBColor = RGBColor(144, 238, 144); // lightgreen

const DASH_SIZE: u32 = 10;
const DASH_SPACING: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Axis setup for one correlation panel.
///
/// `x_limits` is `(left, right)`; a left limit larger than the right one
/// flips the x axis so values decrease to the right.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelAxes {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub x_limits: (f64, f64),
    pub y_limits: (f64, f64),
}

impl PanelAxes {
    pub fn x_reversed(&self) -> bool {
        self.x_limits.0 > self.x_limits.1
    }

    /// Ascending x range in chart coordinates; a flipped axis is drawn as -x.
    pub fn plot_x_range(&self) -> (f64, f64) {
        if self.x_reversed() {
            (-self.x_limits.0, -self.x_limits.1)
        } else {
            self.x_limits
        }
    }
}

/// A fitted line ready to draw, with its legend entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationLine {
    pub label: String,
    pub legend: String,
    pub result: CorrelationResult,
    /// Fitted values at each integer x from floor(min x) to floor(max x).
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    pub style: LineStyle,
}

pub struct AnnotatedCorrelationLine;

impl AnnotatedCorrelationLine {
    /// Correlate `x` with `y` and lay out the fitted line.
    pub fn compute(
        x: &[f64],
        y: &[f64],
        color: RGBColor,
        style: LineStyle,
        label: &str,
    ) -> StatsResult<CorrelationLine> {
        let result = pearson(x, y, label)?;
        let legend = result.legend_text(label);
        debug!("{} (n = {}, p = {:.4})", legend, result.n, result.p_value);

        Ok(CorrelationLine {
            label: label.to_string(),
            legend,
            points: result.line_over_integer_range(x)?,
            result,
            color,
            style,
        })
    }
}

/// Drawing context for one correlation panel: a cartesian chart plus the
/// lines added to it so far.
pub struct CorrelationPanel<'a, DB: DrawingBackend + 'a> {
    chart: ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    reversed: bool,
    lines: Vec<CorrelationLine>,
}

impl<'a, DB: DrawingBackend + 'a> CorrelationPanel<'a, DB> {
    /// Build the axes on `area` and draw the mesh.
    pub fn new(area: &'a DrawingArea<DB, Shift>, axes: &PanelAxes) -> Result<Self, ChartError> {
        let reversed = axes.x_reversed();
        let (x0, x1) = axes.plot_x_range();

        let mut builder = ChartBuilder::on(area);
        builder
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(60);
        if let Some(title) = &axes.title {
            builder.caption(title, ("sans-serif", 20).into_font().style(FontStyle::Bold));
        }
        let mut chart = builder
            .build_cartesian_2d(x0..x1, axes.y_limits.0..axes.y_limits.1)
            .map_err(drawing)?;

        let x_formatter = move |v: &f64| format_tick(if reversed { -*v } else { *v });
        chart
            .configure_mesh()
            .disable_mesh()
            .x_label_formatter(&x_formatter)
            .x_desc(axes.x_label.as_str())
            .y_desc(axes.y_label.as_str())
            .axis_desc_style(("sans-serif", 15))
            .draw()
            .map_err(drawing)?;

        Ok(Self {
            chart,
            reversed,
            lines: Vec::new(),
        })
    }

    /// Correlate `x` with `y`, draw the fitted line and register its legend entry.
    pub fn add_correlation_line(
        &mut self,
        x: &[f64],
        y: &[f64],
        color: RGBColor,
        style: LineStyle,
        label: &str,
    ) -> Result<CorrelationLine, ChartError> {
        let line = AnnotatedCorrelationLine::compute(x, y, color, style, label)?;

        let points = plot_points(&line.points, self.reversed);

        let anno = match style {
            LineStyle::Solid => self
                .chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(drawing)?,
            LineStyle::Dashed => self
                .chart
                .draw_series(DashedLineSeries::new(
                    points,
                    DASH_SIZE,
                    DASH_SPACING,
                    color.stroke_width(2),
                ))
                .map_err(drawing)?,
        };
        anno.label(line.legend.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });

        self.lines.push(line.clone());
        Ok(line)
    }

    /// Draw the legend in the upper right and hand back the lines drawn.
    pub fn finish(mut self) -> Result<Vec<CorrelationLine>, ChartError> {
        if !self.lines.is_empty() {
            self.chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font(("sans-serif", 12))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(drawing)?;
        }
        Ok(self.lines)
    }
}

/// Map data points onto the chart's x coordinate; a flipped axis is drawn as -x.
fn plot_points(points: &[(f64, f64)], reversed: bool) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|&(x, y)| (if reversed { -x } else { x }, y))
        .collect()
}

fn format_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v.round() + 0.0)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsError;

    #[test]
    fn test_compute_perfect_line() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let line =
            AnnotatedCorrelationLine::compute(&x, &y, CONTEXT_COLOR, LineStyle::Solid, "Linear")
                .unwrap();

        assert!((line.result.slope - 2.0).abs() < 1e-12);
        assert!((line.result.intercept - 1.0).abs() < 1e-12);
        assert!((line.result.r - 1.0).abs() < 1e-12);
        assert_eq!(line.legend, "Linear: r = 1.00, p < .001");
        assert_eq!(line.points.len(), 10);
        assert_eq!(line.points[0].0, 1.0);
        assert!((line.points[9].1 - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_weak_correlation_reports_p_value() {
        let x = [10.0, 12.0, 14.0, 16.0, 18.0, 20.0];
        let y = [0.80, 0.90, 0.78, 0.92, 0.79, 0.85];
        let line = AnnotatedCorrelationLine::compute(
            &x,
            &y,
            FEATURE_COLOR,
            LineStyle::Dashed,
            "Item memory(feature)",
        )
        .unwrap();

        assert!(line.result.p_value >= 0.05);
        let expected = format!(
            "Item memory(feature): r = {:.2}, p = {:.2}",
            line.result.r, line.result.p_value
        );
        assert_eq!(line.legend, expected);
        assert_eq!(line.style, LineStyle::Dashed);
    }

    #[test]
    fn test_line_spans_integer_range_of_x() {
        let x = [6.5, 9.0, 13.2, 23.9];
        let y = [0.95, 0.9, 0.85, 0.75];
        let line =
            AnnotatedCorrelationLine::compute(&x, &y, CONTEXT_COLOR, LineStyle::Solid, "Source")
                .unwrap();
        let xs: Vec<f64> = line.points.iter().map(|p| p.0).collect();
        assert_eq!(xs.first(), Some(&6.0));
        assert_eq!(xs.last(), Some(&23.0));
        assert_eq!(xs.len(), 18);
    }

    #[test]
    fn test_constant_input_names_label() {
        let err = AnnotatedCorrelationLine::compute(
            &[10.0, 12.0, 14.0],
            &[0.9, 0.9, 0.9],
            CONTEXT_COLOR,
            LineStyle::Solid,
            "Item memory(context)",
        )
        .unwrap_err();
        assert_eq!(
            err,
            StatsError::ConstantInput {
                what: "Item memory(context)".into()
            }
        );
    }

    #[test]
    fn test_panel_axes_reversal() {
        let axes = PanelAxes {
            title: None,
            x_label: "CAKe score".into(),
            y_label: "Memory Accuracy".into(),
            x_limits: (24.0, 6.0),
            y_limits: (0.7, 1.0),
        };
        assert!(axes.x_reversed());
        assert_eq!(axes.plot_x_range(), (-24.0, -6.0));

        let forward = PanelAxes {
            x_limits: (6.0, 24.0),
            ..axes.clone()
        };
        assert!(!forward.x_reversed());
        assert_eq!(forward.plot_x_range(), (6.0, 24.0));
        assert_eq!(format_tick(-0.0), "0");
        assert_eq!(format_tick(24.0), "24");
        assert_eq!(format_tick(0.75), "0.75");
    }

    #[test]
    fn test_plot_points_mirror_reversed_axis() {
        let points = [(6.0, 0.95), (15.0, 0.85), (24.0, 0.75)];
        assert_eq!(
            plot_points(&points, true),
            vec![(-6.0, 0.95), (-15.0, 0.85), (-24.0, 0.75)]
        );
        assert_eq!(plot_points(&points, false), points.to_vec());

        // On the -x scale the highest CAKe score sits leftmost.
        let mirrored = plot_points(&points, true);
        assert!(mirrored[2].0 < mirrored[0].0);
        assert_eq!(format_tick(-mirrored[2].0), "24");
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn test_draws_reversed_panel_into_bitmap() {
        let x = [8.0, 12.0, 16.0, 20.0, 24.0];
        let y = [0.75, 0.8, 0.84, 0.9, 0.97];
        let mut buffer = vec![0u8; 600 * 400 * 3];
        {
            let area = BitMapBackend::with_buffer(&mut buffer, (600, 400)).into_drawing_area();
            area.fill(&WHITE).unwrap();
            let axes = PanelAxes {
                title: Some("Females".into()),
                x_label: "CAKe score".into(),
                y_label: "Memory Accuracy".into(),
                x_limits: (24.0, 6.0),
                y_limits: (0.7, 1.0),
            };
            let mut panel = CorrelationPanel::new(&area, &axes).unwrap();
            panel
                .add_correlation_line(&x, &y, CONTEXT_COLOR, LineStyle::Solid, "Source")
                .unwrap();
            panel
                .add_correlation_line(&x, &y, FEATURE_COLOR, LineStyle::Dashed, "Item")
                .unwrap();
            let lines = panel.finish().unwrap();
            assert_eq!(lines.len(), 2);
            area.present().unwrap();
        }
        assert!(buffer.iter().any(|&px| px != 255));
    }
}

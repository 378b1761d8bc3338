//! Grouped bar chart with significance brackets for a 2 (group) x 2
//! (condition) design.
//!
//! Layout per panel:
//! 1. Group A bars at x = 0, 1 and group B bars at x = w, 1 + w
//! 2. SEM whiskers with caps on every bar
//! 3. Condition names centered under each bar pair
//! 4. A bracket with `*`, `**` or `***` over each pair whose t-test has p < .05

use super::{drawing, ChartError};
use crate::stats::{
    GroupMeanSummary, SignificanceTier, StatsCalculator, StatsError, StatsResult, TTestResult,
};
use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub const GROUP_A_COLOR: RGBColor = RGBColor(70, 130, 180); // steelblue
pub const GROUP_B_COLOR: RGBColor = RGBColor(176, 196, 222); // lightsteelblue

/// Gap between the highest bar + 2 SEM and the bracket top.
const BRACKET_MARGIN: f64 = 0.05;
/// Length of the bracket's downward ticks.
const BRACKET_TICK: f64 = 0.01;
/// Offset of the asterisk label above the bracket.
const LABEL_OFFSET: f64 = 0.01;
const Y_HEADROOM: f64 = 0.1;
const X_PADDING: f64 = 0.3;

/// The four samples of a two-group, two-condition design.
#[derive(Debug, Clone, Copy)]
pub struct RepeatedMeasures2x2<'a> {
    pub a1: &'a [f64],
    pub a2: &'a [f64],
    pub b1: &'a [f64],
    pub b2: &'a [f64],
}

/// One bar: group index (0 = A, 1 = B), condition index and its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSpec {
    pub group: usize,
    pub condition: usize,
    pub x: f64,
    pub summary: GroupMeanSummary,
}

impl BarSpec {
    pub fn top(&self) -> f64 {
        self.summary.mean + self.summary.sem
    }

    /// Filled rectangle corners for a bar `width` wide.
    pub fn rect(&self, width: f64) -> [(f64, f64); 2] {
        let half = width / 2.0;
        [(self.x - half, 0.0), (self.x + half, self.summary.mean)]
    }

    /// SEM whisker: the vertical stroke, then the lower and upper caps.
    pub fn whisker(&self, cap: f64) -> [[(f64, f64); 2]; 3] {
        let lo = self.summary.mean - self.summary.sem;
        let hi = self.summary.mean + self.summary.sem;
        [
            [(self.x, lo), (self.x, hi)],
            [(self.x - cap, lo), (self.x + cap, lo)],
            [(self.x - cap, hi), (self.x + cap, hi)],
        ]
    }
}

/// Between-group comparison for one condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionTest {
    pub condition: usize,
    pub ttest: TTestResult,
    pub tier: SignificanceTier,
}

/// Staple drawn over a significant bar pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Bracket {
    pub condition: usize,
    pub x1: f64,
    pub x2: f64,
    pub y_top: f64,
    pub y_tick: f64,
    pub text: &'static str,
}

impl Bracket {
    /// Polyline `(x1, tick) (x1, top) (x2, top) (x2, tick)`.
    pub fn path(&self) -> Vec<(f64, f64)> {
        vec![
            (self.x1, self.y_tick),
            (self.x1, self.y_top),
            (self.x2, self.y_top),
            (self.x2, self.y_tick),
        ]
    }

    pub fn label_anchor(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, self.y_top + LABEL_OFFSET)
    }
}

/// Everything needed to draw one grouped bar panel.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartPlan {
    pub bar_width: f64,
    pub bars: Vec<BarSpec>,
    pub tests: Vec<ConditionTest>,
    pub brackets: Vec<Bracket>,
    pub group_labels: [String; 2],
    pub cond_labels: [String; 2],
    pub y_max: f64,
}

impl BarChartPlan {
    pub fn bar(&self, group: usize, condition: usize) -> Option<&BarSpec> {
        self.bars
            .iter()
            .find(|b| b.group == group && b.condition == condition)
    }

    /// X positions of the condition ticks, centered between each bar pair.
    pub fn tick_positions(&self) -> Vec<f64> {
        (0..2).map(|i| i as f64 + self.bar_width / 2.0).collect()
    }

    /// Horizontal extent of the panel: both bar pairs plus padding.
    pub fn x_range(&self) -> (f64, f64) {
        let w = self.bar_width;
        (-w - X_PADDING, 1.0 + 2.0 * w + X_PADDING)
    }
}

pub struct GroupedSignificanceBarChart;

impl GroupedSignificanceBarChart {
    /// Summarize the four samples, run both between-group t-tests and place
    /// brackets for the significant ones.
    ///
    /// Bracket height is shared by both conditions: it is derived from the
    /// tallest mean + 2 SEM over all four bars, not only the pair it spans.
    pub fn plan(
        samples: &RepeatedMeasures2x2<'_>,
        bar_width: f64,
        group_labels: [&str; 2],
        cond_labels: [&str; 2],
    ) -> StatsResult<BarChartPlan> {
        if !bar_width.is_finite() || bar_width <= 0.0 {
            return Err(StatsError::InvalidParameter(format!(
                "bar width must be finite and positive, got {bar_width}"
            )));
        }

        let data = [[samples.a1, samples.a2], [samples.b1, samples.b2]];

        let mut bars = Vec::with_capacity(4);
        for (group, per_condition) in data.iter().enumerate() {
            for (condition, values) in per_condition.iter().enumerate() {
                let name = format!("{} / {}", group_labels[group], cond_labels[condition]);
                let summary = StatsCalculator::summarize(values, &name)?;
                bars.push(BarSpec {
                    group,
                    condition,
                    x: condition as f64 + group as f64 * bar_width,
                    summary,
                });
            }
        }

        let bracket_top = bars
            .iter()
            .map(|b| b.summary.mean + 2.0 * b.summary.sem)
            .fold(f64::NEG_INFINITY, f64::max)
            + BRACKET_MARGIN;

        let mut tests = Vec::with_capacity(2);
        let mut brackets = Vec::new();
        for condition in 0..2 {
            let what = format!(
                "{} vs {} / {}",
                group_labels[0], group_labels[1], cond_labels[condition]
            );
            let ttest = StatsCalculator::student_ttest(data[0][condition], data[1][condition], &what)?;
            let tier = SignificanceTier::from_p(ttest.p_value);
            debug!(
                "{}: t = {:.3}, df = {}, p = {:.4} ({})",
                what, ttest.statistic, ttest.df, ttest.p_value, tier
            );

            if let Some(text) = tier.asterisks() {
                let x1 = condition as f64;
                brackets.push(Bracket {
                    condition,
                    x1,
                    x2: x1 + bar_width,
                    y_top: bracket_top,
                    y_tick: bracket_top - BRACKET_TICK,
                    text,
                });
            }
            tests.push(ConditionTest {
                condition,
                ttest,
                tier,
            });
        }

        let bar_max = bars.iter().map(BarSpec::top).fold(0.0, f64::max);
        let label_max = brackets
            .iter()
            .map(|b| b.label_anchor().1)
            .fold(0.0, f64::max);

        Ok(BarChartPlan {
            bar_width,
            bars,
            tests,
            brackets,
            group_labels: group_labels.map(str::to_string),
            cond_labels: cond_labels.map(str::to_string),
            y_max: bar_max.max(label_max) + Y_HEADROOM,
        })
    }

    /// Draw a planned panel onto `area`.
    pub fn draw<DB: DrawingBackend>(
        plan: &BarChartPlan,
        area: &DrawingArea<DB, Shift>,
        title: &str,
        y_label: &str,
    ) -> Result<(), ChartError> {
        let w = plan.bar_width;
        let cap = w / 5.0;
        let (x0, x1) = plan.x_range();

        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 20).into_font().style(FontStyle::Bold))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x0..x1, 0.0..plan.y_max)
            .map_err(drawing)?;

        // Numeric x labels are hidden; condition names go under each pair.
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_label_formatter(&|_| String::new())
            .y_desc(y_label)
            .axis_desc_style(("sans-serif", 15))
            .draw()
            .map_err(drawing)?;

        let base = area.get_base_pixel();
        let tick_style = ("sans-serif", 14)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        for (tick, label) in plan.tick_positions().into_iter().zip(&plan.cond_labels) {
            let (px, py) = chart.backend_coord(&(tick, 0.0));
            area.draw(&Text::new(
                label.clone(),
                (px - base.0, py - base.1 + 8),
                tick_style.clone(),
            ))
            .map_err(drawing)?;
        }

        for (group, color) in [GROUP_A_COLOR, GROUP_B_COLOR].into_iter().enumerate() {
            chart
                .draw_series(
                    plan.bars
                        .iter()
                        .filter(|b| b.group == group)
                        .map(|b| Rectangle::new(b.rect(w), color.filled())),
                )
                .map_err(drawing)?
                .label(plan.group_labels[group].as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        }

        chart
            .draw_series(plan.bars.iter().flat_map(|b| {
                b.whisker(cap)
                    .map(|segment| PathElement::new(segment.to_vec(), BLACK.stroke_width(1)))
            }))
            .map_err(drawing)?;

        let label_style = ("sans-serif", 16)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        for bracket in &plan.brackets {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    bracket.path(),
                    BLACK.stroke_width(1),
                )))
                .map_err(drawing)?;
            chart
                .draw_series(std::iter::once(Text::new(
                    bracket.text.to_string(),
                    bracket.label_anchor(),
                    label_style.clone(),
                )))
                .map_err(drawing)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(drawing)?;

        Ok(())
    }
}

/// Plan and draw a grouped significance bar panel in one call.
#[allow(clippy::too_many_arguments)]
pub fn render_grouped_significance_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    samples: &RepeatedMeasures2x2<'_>,
    bar_width: f64,
    group_labels: [&str; 2],
    cond_labels: [&str; 2],
    title: &str,
    y_label: &str,
) -> Result<BarChartPlan, ChartError> {
    let plan = GroupedSignificanceBarChart::plan(samples, bar_width, group_labels, cond_labels)?;
    GroupedSignificanceBarChart::draw(&plan, area, title, y_label)?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUPS: [&str; 2] = ["Normal", "Impaired"];
    const CONDS: [&str; 2] = ["Feature", "Context"];

    fn plan_for(a1: &[f64], a2: &[f64], b1: &[f64], b2: &[f64]) -> StatsResult<BarChartPlan> {
        GroupedSignificanceBarChart::plan(
            &RepeatedMeasures2x2 { a1, a2, b1, b2 },
            0.2,
            GROUPS,
            CONDS,
        )
    }

    #[test]
    fn test_bar_heights_are_sample_means() {
        let plan = plan_for(
            &[0.8, 0.9, 1.0],
            &[0.6, 0.7],
            &[0.5, 0.75],
            &[0.25, 0.5, 0.75, 1.0],
        )
        .unwrap();

        assert_eq!(plan.bar(0, 0).unwrap().summary.mean, (0.8 + 0.9 + 1.0) / 3.0);
        assert_eq!(plan.bar(0, 1).unwrap().summary.mean, (0.6 + 0.7) / 2.0);
        assert_eq!(plan.bar(1, 0).unwrap().summary.mean, 0.625);
        assert_eq!(plan.bar(1, 1).unwrap().summary.mean, 0.625);
    }

    #[test]
    fn test_whiskers_are_sem() {
        let b2 = [0.25, 0.5, 0.75, 1.0];
        let plan = plan_for(&[0.8, 0.9], &[0.6, 0.7], &[0.5, 0.75], &b2).unwrap();
        let bar = plan.bar(1, 1).unwrap();
        assert!((bar.summary.sem - StatsCalculator::sem(&b2)).abs() < 1e-15);
        assert!((bar.top() - (bar.summary.mean + bar.summary.sem)).abs() < 1e-15);
    }

    #[test]
    fn test_bar_positions_and_ticks() {
        let plan = plan_for(&[0.8, 0.9], &[0.6, 0.7], &[0.5, 0.75], &[0.4, 0.5]).unwrap();
        assert_eq!(plan.bar(0, 0).unwrap().x, 0.0);
        assert_eq!(plan.bar(0, 1).unwrap().x, 1.0);
        assert_eq!(plan.bar(1, 0).unwrap().x, 0.2);
        assert_eq!(plan.bar(1, 1).unwrap().x, 1.2);
        assert_eq!(plan.tick_positions(), vec![0.1, 1.1]);
    }

    #[test]
    fn test_disjoint_samples_get_three_stars() {
        let a1 = [0.95, 0.96, 0.97, 0.98, 0.99, 0.97];
        let b1 = [0.41, 0.42, 0.40, 0.43, 0.44, 0.42];
        let same = [0.7, 0.8, 0.75, 0.72, 0.78, 0.74];
        let plan = plan_for(&a1, &same, &b1, &same).unwrap();

        assert_eq!(plan.tests[0].tier, SignificanceTier::P001);
        assert_eq!(plan.brackets.len(), 1);

        let bracket = &plan.brackets[0];
        assert_eq!(bracket.condition, 0);
        assert_eq!(bracket.text, "***");
        assert_eq!((bracket.x1, bracket.x2), (0.0, 0.2));
    }

    #[test]
    fn test_identical_samples_get_no_bracket() {
        let s = [0.7, 0.8, 0.75, 0.72];
        let plan = plan_for(&s, &s, &s, &s).unwrap();
        assert!(plan.brackets.is_empty());
        assert!(plan.tests.iter().all(|t| t.tier == SignificanceTier::NotSignificant));
        assert!(plan.tests.iter().all(|t| (t.ttest.p_value - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_bracket_height_uses_all_four_bars() {
        // Condition 2 bars are far taller than condition 1, and only
        // condition 1 differs between groups.
        let a1 = [0.50, 0.51, 0.50, 0.51, 0.50];
        let b1 = [0.10, 0.11, 0.10, 0.11, 0.10];
        let a2 = [1.5, 1.6, 1.7, 1.4, 1.8];
        let b2 = [1.6, 1.5, 1.7, 1.8, 1.4];
        let plan = plan_for(&a1, &a2, &b1, &b2).unwrap();

        assert_eq!(plan.brackets.len(), 1);
        let expected = plan
            .bars
            .iter()
            .map(|b| b.summary.mean + 2.0 * b.summary.sem)
            .fold(f64::NEG_INFINITY, f64::max)
            + 0.05;
        let bracket = &plan.brackets[0];
        assert!((bracket.y_top - expected).abs() < 1e-12);
        assert!((bracket.y_tick - (expected - 0.01)).abs() < 1e-12);
        assert!(bracket.y_top > 1.6);
        assert_eq!(
            bracket.path(),
            vec![
                (0.0, bracket.y_tick),
                (0.0, bracket.y_top),
                (0.2, bracket.y_top),
                (0.2, bracket.y_tick),
            ]
        );
        assert!(plan.y_max > bracket.label_anchor().1);
    }

    #[test]
    fn test_short_sample_is_named() {
        let err = plan_for(&[0.8, 0.9], &[0.6, 0.7], &[0.5, 0.75], &[0.4]).unwrap_err();
        assert!(err.to_string().contains("Impaired / Context"));
    }

    #[test]
    fn test_rejects_bad_bar_width() {
        let s = [0.7, 0.8];
        let samples = RepeatedMeasures2x2 { a1: &s, a2: &s, b1: &s, b2: &s };
        for width in [0.0, -0.2, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                GroupedSignificanceBarChart::plan(&samples, width, GROUPS, CONDS),
                Err(StatsError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_accepts_wide_bars() {
        let s = [0.7, 0.8];
        let samples = RepeatedMeasures2x2 { a1: &s, a2: &s, b1: &s, b2: &s };
        let plan = GroupedSignificanceBarChart::plan(&samples, 0.6, GROUPS, CONDS).unwrap();
        assert_eq!(plan.bar(1, 0).unwrap().x, 0.6);
        assert_eq!(plan.tick_positions(), vec![0.3, 1.3]);
    }

    #[test]
    fn test_draw_geometry() {
        let plan = plan_for(&[0.6, 0.8], &[0.6, 0.7], &[0.5, 0.75], &[0.4, 0.5]).unwrap();
        let (x0, x1) = plan.x_range();
        assert!((x0 + 0.5).abs() < 1e-12);
        assert!((x1 - 1.7).abs() < 1e-12);

        let bar = plan.bar(0, 0).unwrap();
        let [bottom_left, top_right] = bar.rect(0.2);
        assert!((bottom_left.0 + 0.1).abs() < 1e-12);
        assert_eq!(bottom_left.1, 0.0);
        assert!((top_right.0 - 0.1).abs() < 1e-12);
        assert_eq!(top_right.1, bar.summary.mean);

        let [stroke, low_cap, high_cap] = bar.whisker(0.04);
        let sem = bar.summary.sem;
        assert_eq!(stroke[0], (0.0, bar.summary.mean - sem));
        assert_eq!(stroke[1], (0.0, bar.summary.mean + sem));
        assert_eq!(low_cap, [(-0.04, bar.summary.mean - sem), (0.04, bar.summary.mean - sem)]);
        assert_eq!(high_cap[1], (0.04, bar.summary.mean + sem));
        for bar in &plan.bars {
            assert!(bar.rect(0.2)[0].0 > x0 && bar.rect(0.2)[1].0 < x1);
        }
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn test_draws_into_bitmap() {
        let a1 = [0.95, 0.96, 0.97, 0.98];
        let b1 = [0.41, 0.42, 0.40, 0.43];
        let s = [0.7, 0.8, 0.75, 0.72];
        let mut buffer = vec![0u8; 600 * 400 * 3];
        {
            let area = BitMapBackend::with_buffer(&mut buffer, (600, 400)).into_drawing_area();
            area.fill(&WHITE).unwrap();
            let plan = render_grouped_significance_bars(
                &area,
                &RepeatedMeasures2x2 { a1: &a1, a2: &s, b1: &b1, b2: &s },
                0.2,
                GROUPS,
                CONDS,
                "Source Memory",
                "Memory Accuracy",
            )
            .unwrap();
            assert_eq!(plan.brackets.len(), 1);
            area.present().unwrap();
        }
        assert!(buffer.iter().any(|&px| px != 255));
    }
}

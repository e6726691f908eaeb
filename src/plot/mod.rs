//! SVG line charts of the computed series.
//!
//! Charts are render-only: all series data and bounds are computed by the
//! pipeline before any drawing happens, which keeps the drawing code small
//! and the data prep testable without a backend.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{IncomeVariable, Indicator, RateEstimate, TimeSeries, WeightedStatistics};
use crate::error::AppError;

/// High-contrast palette reused across charts, one color per series.
const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// One named line over the shared wave axis. `None` marks a skipped wave.
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<Option<f64>>,
}

/// A render-ready chart: wave labels on x, one or more lines on y.
pub struct ChartSpec {
    pub title: String,
    pub y_desc: String,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    /// Build a rates chart (one line per indicator) over the union of waves.
    pub fn rates(title: &str, series: &[(Indicator, TimeSeries<RateEstimate>)]) -> Self {
        let labels = union_of_labels(series.iter().map(|(_, s)| s));
        let lines = series
            .iter()
            .map(|(indicator, s)| ChartSeries {
                name: format!("{} rate", indicator.display_name()),
                points: labels
                    .iter()
                    .map(|label| s.get(label).map(|r| r.percent))
                    .collect(),
            })
            .collect();
        ChartSpec {
            title: title.to_string(),
            y_desc: "rate (%)".to_string(),
            labels,
            series: lines,
        }
    }

    /// Build an income chart (mean, median and outer quartiles) for one
    /// variable.
    pub fn income(
        title: &str,
        variable: IncomeVariable,
        series: &TimeSeries<WeightedStatistics>,
    ) -> Self {
        let labels: Vec<String> = series.labels().iter().map(|s| s.to_string()).collect();
        let line = |name: &str, pick: fn(&WeightedStatistics) -> f64| ChartSeries {
            name: name.to_string(),
            points: series.iter().map(|(_, stats)| Some(pick(stats))).collect(),
        };
        ChartSpec {
            title: format!("{title} ({})", variable.description()),
            y_desc: "income ($)".to_string(),
            labels,
            series: vec![
                line("mean", |s| s.mean),
                line("median", |s| s.median),
                line("q25", |s| s.quartiles[0].1),
                line("q75", |s| s.quartiles[2].1),
            ],
        }
    }

    fn y_bounds(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for series in &self.series {
            for value in series.points.iter().flatten() {
                min = min.min(*value);
                max = max.max(*value);
            }
        }
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        // Pad so lines never sit on the frame; flat series still get a band.
        let pad = ((max - min) * 0.05).max(max.abs() * 0.01).max(1.0);
        Some((min - pad, max + pad))
    }
}

/// Render a chart spec to an SVG file.
///
/// Fails with exit code 3 when there is nothing to draw (an all-skipped run)
/// and exit code 2 on filesystem problems.
pub fn render_line_chart(path: &Path, spec: &ChartSpec) -> Result<(), AppError> {
    let Some((y_min, y_max)) = spec.y_bounds() else {
        return Err(AppError::new(
            3,
            format!("No data points to plot for '{}'.", spec.title),
        ));
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(
                2,
                format!("Failed to create charts directory '{}': {e}", parent.display()),
            )
        })?;
    }

    let x_max = (spec.labels.len().saturating_sub(1)).max(1) as f64;
    let labels = &spec.labels;

    let root = SVGBackend::new(path, (1024, 576)).into_drawing_area();
    let draw = || -> Result<(), Box<dyn std::error::Error>> {
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&spec.title, ("sans-serif", 22))
            .margin(12)
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 48)
            .build_cartesian_2d(-0.5..x_max + 0.5, y_min..y_max)?;

        chart
            .configure_mesh()
            .y_desc(&spec.y_desc)
            .x_labels(labels.len().min(12))
            .x_label_formatter(&|v| {
                let idx = v.round();
                if (v - idx).abs() > 0.01 || idx < 0.0 {
                    return String::new();
                }
                labels
                    .get(idx as usize)
                    .cloned()
                    .unwrap_or_default()
            })
            .label_style(("sans-serif", 12))
            .draw()?;

        for (i, series) in spec.series.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let points: Vec<(f64, f64)> = series
                .points
                .iter()
                .enumerate()
                .filter_map(|(x, y)| y.map(|y| (x as f64, y)))
                .collect();
            chart
                .draw_series(LineSeries::new(points.iter().copied(), &color))?
                .label(&series.name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color)
                });
            // Mark the observations so single-wave series stay visible.
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.85))
            .draw()?;

        root.present()?;
        Ok(())
    };

    draw().map_err(|e| {
        AppError::new(
            4,
            format!("Failed to render chart '{}': {e}", path.display()),
        )
    })
}

fn union_of_labels<'a, T: 'a>(series: impl Iterator<Item = &'a TimeSeries<T>>) -> Vec<String> {
    let mut waves = Vec::new();
    for s in series {
        for (wave, _) in s.iter() {
            if !waves.contains(wave) {
                waves.push(wave.clone());
            }
        }
    }
    waves.sort();
    waves.into_iter().map(|w| w.label).collect()
}

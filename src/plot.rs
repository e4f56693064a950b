use std::path::Path;

use log::debug;
use plotters::prelude::*;

use crate::error::PlotError;
use crate::metric::Series;

/// Axis and canvas settings shared by all plots. Unset ranges fit the data.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    pub size: (u32, u32),
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    /// horizontal reference line at this y value
    pub reference_line: Option<f64>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            size: (960, 400),
            x_range: None,
            y_range: None,
            x_label: None,
            y_label: None,
            reference_line: None,
        }
    }
}

impl PlotOptions {
    /// Defaults for plots of ratios, which live in `[0, 1]`.
    pub fn ratio() -> Self {
        Self {
            y_range: Some((0.0, 1.1)),
            ..Self::default()
        }
    }
}

/// More than one series needs one label per series.
pub fn check_labels(series: usize, labels: Option<&[String]>) -> Result<(), PlotError> {
    match labels {
        None if series > 1 => Err(PlotError::Labels { series, labels: 0 }),
        Some(labels) if labels.len() != series => Err(PlotError::Labels {
            series,
            labels: labels.len(),
        }),
        _ => Ok(()),
    }
}

/// Plots every `ys` entry against the shared `x` axis. Each entry must match `x` in length.
pub fn plot_time(
    path: impl AsRef<Path>,
    x: &[f64],
    ys: &[Vec<f64>],
    labels: Option<&[String]>,
    options: &PlotOptions,
) -> Result<(), PlotError> {
    check_labels(ys.len(), labels)?;
    if let Some((index, y)) = ys.iter().enumerate().find(|(_, y)| y.len() != x.len()) {
        return Err(PlotError::Length {
            index,
            len: y.len(),
            expected: x.len(),
        });
    }

    let series = ys
        .iter()
        .enumerate()
        .map(|(i, y)| Series {
            label: label_at(labels, i),
            points: x.iter().copied().zip(y.iter().copied()).collect(),
        })
        .collect::<Vec<_>>();

    draw(path.as_ref(), &series, options)
}

/// Plots runs against each other, cut to the length of the shortest one.
pub fn plot_time_cmp(
    path: impl AsRef<Path>,
    series: &[Series],
    options: &PlotOptions,
) -> Result<(), PlotError> {
    let labelled = series.iter().filter(|s| !s.label.is_empty()).count();
    if series.len() > 1 && labelled != series.len() {
        return Err(PlotError::Labels {
            series: series.len(),
            labels: labelled,
        });
    }

    let shortest = series.iter().map(|s| s.points.len()).min().unwrap_or(0);
    let series = series
        .iter()
        .map(|s| Series {
            label: s.label.clone(),
            points: s.points[..shortest].to_vec(),
        })
        .collect::<Vec<_>>();

    draw(path.as_ref(), &series, options)
}

/// One empirical CDF per set of samples.
pub fn plot_cdf(
    path: impl AsRef<Path>,
    samples: &[Vec<f64>],
    labels: Option<&[String]>,
    options: &PlotOptions,
) -> Result<(), PlotError> {
    check_labels(samples.len(), labels)?;

    let series = samples
        .iter()
        .enumerate()
        .map(|(i, values)| Series {
            label: label_at(labels, i),
            points: cdf_points(values),
        })
        .collect::<Vec<_>>();

    draw(path.as_ref(), &series, options)
}

/// Sorted values against the fraction of values below them.
pub fn cdf_points(values: &[f64]) -> Vec<(f64, f64)> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len() as f64;
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, x)| (x, i as f64 / count))
        .collect()
}

fn label_at(labels: Option<&[String]>, index: usize) -> String {
    labels
        .and_then(|labels| labels.get(index))
        .cloned()
        .unwrap_or_default()
}

fn drawing_error(e: impl std::fmt::Display) -> PlotError {
    PlotError::Drawing(e.to_string())
}

fn fit(values: impl Iterator<Item = f64>, fixed: Option<(f64, f64)>) -> Option<(f64, f64)> {
    if fixed.is_some() {
        return fixed;
    }

    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold(None, |range: Option<(f64, f64)>, v| match range {
            Some((min, max)) => Some((min.min(v), max.max(v))),
            None => Some((v, v)),
        })?;

    if max > min {
        Some((min, max))
    } else {
        Some((min, min + 1.0))
    }
}

fn draw(path: &Path, series: &[Series], options: &PlotOptions) -> Result<(), PlotError> {
    let points = || series.iter().flat_map(|s| s.points.iter());
    let (Some(x_range), Some(y_range)) = (
        fit(points().map(|(x, _)| *x), options.x_range),
        fit(points().map(|(_, y)| *y), options.y_range),
    ) else {
        return Err(PlotError::NoData);
    };

    debug!(
        "drawing {} series to {} (x {x_range:?}, y {y_range:?})",
        series.len(),
        path.display()
    );

    let root = SVGBackend::new(path, options.size).into_drawing_area();
    root.fill(&WHITE).map_err(drawing_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
        .map_err(drawing_error)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh();
    if let Some(label) = &options.x_label {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &options.y_label {
        mesh.y_desc(label.as_str());
    }
    mesh.draw().map_err(drawing_error)?;

    if let Some(y) = options.reference_line {
        chart
            .draw_series(LineSeries::new(
                vec![(x_range.0, y), (x_range.1, y)],
                BLACK.mix(0.4),
            ))
            .map_err(drawing_error)?;
    }

    for (index, s) in series.iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        let drawn = chart
            .draw_series(LineSeries::new(
                s.points.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(drawing_error)?;

        if !s.label.is_empty() {
            drawn
                .label(s.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }
    }

    if series.iter().any(|s| !s.label.is_empty()) {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(drawing_error)?;
    }

    root.present().map_err(drawing_error)
}

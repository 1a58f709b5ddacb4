//! Line charts written as PNG files.
use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::{fmt::Display, path::Path};

const SIZE: (u32, u32) = (800, 600);

fn plot_err(e: impl Display) -> anyhow::Error {
    anyhow!("Failed to draw a plot: {}", e)
}

/// A named sequence of `(x, y)` points.
pub(crate) struct Series<'a> {
    pub label: &'a str,
    pub points: &'a [(f32, f32)],
    pub color: RGBColor,
}

impl<'a> Series<'a> {
    pub fn new(label: &'a str, points: &'a [(f32, f32)], color: RGBColor) -> Self {
        Self {
            label,
            points,
            color,
        }
    }
}

/// Range covering `values`, widened when all values are the same.
fn range(values: impl Iterator<Item = f32>) -> (f32, f32) {
    let (lo, hi) = values.fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

/// Draws `series` on a chart. A legend is drawn if there is more than one series.
pub(crate) fn line_chart(
    path: &Path,
    title: &str,
    series: &[Series],
    y_range: Option<(f32, f32)>,
) -> Result<()> {
    let points = || series.iter().flat_map(|s| s.points.iter());
    let (x0, x1) = range(points().map(|p| p.0));
    let (y0, y1) = y_range.unwrap_or_else(|| range(points().map(|p| p.1)));

    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("episode")
        .draw()
        .map_err(plot_err)?;

    for s in series {
        let color = s.color;
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))
            .map_err(plot_err)?
            .label(s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    if series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range() {
        assert_eq!(range([1.0, -2.0, 3.0].into_iter()), (-2.0, 3.0));
        assert_eq!(range([2.0, 2.0].into_iter()), (1.5, 2.5));
        assert_eq!(range(std::iter::empty()), (0.0, 1.0));
    }
}

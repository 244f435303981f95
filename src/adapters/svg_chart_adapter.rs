//! SVG chart adapter built on plotters.
//!
//! Left axis: close, fast and slow SMA, entry (triangle) and exit (cross)
//! markers. Right axis: portfolio value, dashed.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::SmacrossError;
use crate::ports::chart_port::{ChartData, ChartPort};

const ORANGE: RGBColor = RGBColor(255, 165, 0);
const PRICE_BLUE: RGBColor = RGBColor(31, 119, 180);
const VALUE_RED: RGBColor = RGBColor(214, 39, 40);
const LABEL_SIZE: f64 = 14.0;

pub struct SvgChartAdapter {
    output_dir: PathBuf,
    width: u32,
    height: u32,
}

impl SvgChartAdapter {
    pub fn new(output_dir: PathBuf, width: u32, height: u32) -> Self {
        Self {
            output_dir,
            width: width.max(200),
            height: height.max(150),
        }
    }

    pub fn chart_path(&self, ticker: &str) -> PathBuf {
        self.output_dir.join(format!("{}.svg", ticker))
    }
}

fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}

fn defined_points(dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<(NaiveDate, f64)> {
    dates
        .iter()
        .zip(values)
        .filter_map(|(d, v)| v.map(|v| (*d, v)))
        .collect()
}

fn draw(path: &Path, chart: &ChartData, size: (u32, u32)) -> Result<(), String> {
    let first = *chart.dates.first().ok_or("no bars to plot")?;
    let mut last = *chart.dates.last().ok_or("no bars to plot")?;
    if last <= first {
        last = first + Duration::days(1);
    }

    let price_values = chart
        .close
        .iter()
        .copied()
        .chain(chart.sma_fast.iter().flatten().copied())
        .chain(chart.sma_slow.iter().flatten().copied());
    let (price_lo, price_hi) = padded_range(price_values);
    let (value_lo, value_hi) = padded_range(chart.portfolio.iter().copied());

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let title = chart.title();
    let mut ctx = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", 20.0))
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(64)
        .right_y_label_area_size(72)
        .build_cartesian_2d(first..last, price_lo..price_hi)
        .map_err(|e| e.to_string())?
        .set_secondary_coord(first..last, value_lo..value_hi);

    ctx.configure_mesh()
        .x_desc("Date")
        .y_desc("Stock Price")
        .x_labels(8)
        .x_label_formatter(&|d| d.format("%Y-%m").to_string())
        .label_style(("sans-serif", LABEL_SIZE))
        .axis_desc_style(("sans-serif", LABEL_SIZE).into_font().color(&PRICE_BLUE))
        .draw()
        .map_err(|e| e.to_string())?;

    ctx.configure_secondary_axes()
        .y_desc("Portfolio Value")
        .label_style(("sans-serif", LABEL_SIZE))
        .axis_desc_style(("sans-serif", LABEL_SIZE).into_font().color(&VALUE_RED))
        .draw()
        .map_err(|e| e.to_string())?;

    let close_points: Vec<(NaiveDate, f64)> = chart
        .dates
        .iter()
        .copied()
        .zip(chart.close.iter().copied())
        .collect();

    ctx.draw_series(LineSeries::new(close_points, PRICE_BLUE.mix(0.5)))
        .map_err(|e| e.to_string())?
        .label(format!("{} Close Price", chart.ticker))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PRICE_BLUE));

    ctx.draw_series(LineSeries::new(
        defined_points(&chart.dates, &chart.sma_fast),
        ORANGE.mix(0.75),
    ))
    .map_err(|e| e.to_string())?
    .label(chart.fast_label.clone())
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE));

    ctx.draw_series(LineSeries::new(
        defined_points(&chart.dates, &chart.sma_slow),
        GREEN.mix(0.75),
    ))
    .map_err(|e| e.to_string())?
    .label(chart.slow_label.clone())
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));

    ctx.draw_series(
        chart
            .entries
            .iter()
            .map(|&(d, v)| TriangleMarker::new((d, v), 7, GREEN.filled())),
    )
    .map_err(|e| e.to_string())?
    .label("Buy Signal")
    .legend(|(x, y)| TriangleMarker::new((x + 10, y), 5, GREEN.filled()));

    ctx.draw_series(
        chart
            .exits
            .iter()
            .map(|&(d, v)| Cross::new((d, v), 6, RED.stroke_width(2))),
    )
    .map_err(|e| e.to_string())?
    .label("Sell Signal")
    .legend(|(x, y)| Cross::new((x + 10, y), 4, RED.stroke_width(2)));

    let value_points: Vec<(NaiveDate, f64)> = chart
        .dates
        .iter()
        .copied()
        .zip(chart.portfolio.iter().copied())
        .collect();

    ctx.draw_secondary_series(DashedLineSeries::new(
        value_points,
        6,
        4,
        VALUE_RED.mix(0.75).stroke_width(2),
    ))
    .map_err(|e| e.to_string())?
    .label("Portfolio Value")
    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], VALUE_RED));

    ctx.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", LABEL_SIZE))
        .draw()
        .map_err(|e| e.to_string())?;

    root.present().map_err(|e| e.to_string())
}

impl ChartPort for SvgChartAdapter {
    fn render(&self, chart: &ChartData) -> Result<PathBuf, SmacrossError> {
        let render_error = |reason: String| SmacrossError::Render {
            ticker: chart.ticker.clone(),
            reason,
        };

        if chart.is_empty() {
            return Err(render_error("no bars to plot".to_string()));
        }

        fs::create_dir_all(&self.output_dir)?;
        let path = self.chart_path(&chart.ticker);
        draw(&path, chart, (self.width, self.height)).map_err(render_error)?;
        Ok(path)
    }
}

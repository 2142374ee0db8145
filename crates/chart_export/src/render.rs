//! Raster drawing for the three dashboard charts.
//!
//! Titles, axis labels, legends and pie percentages are drawn when
//! [`font::labels_available`] finds a font. Without one the same geometry is
//! drawn bare, and the JSON summary still carries every label.

use std::f64::consts::PI;
use std::fmt::Display;
use std::path::Path;

use models::{CategorySeries, ChartData, Forecast};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{ChartError, Result};
use crate::font::{self, FONT_FAMILY};

const INCOME_COLOR: RGBColor = RGBColor(46, 139, 87);
const EXPENSE_COLOR: RGBColor = RGBColor(220, 20, 60);
const ACTUAL_COLOR: RGBColor = RGBColor(31, 119, 180);
const FITTED_COLOR: RGBColor = RGBColor(255, 140, 0);
const FORECAST_COLOR: RGBColor = RGBColor(200, 0, 0);

pub const BAR_CHART_SIZE: (u32, u32) = (1000, 500);
pub const PIE_CHART_SIZE: (u32, u32) = (600, 600);
pub const FORECAST_CHART_SIZE: (u32, u32) = (1000, 500);

const TITLE_SIZE: u32 = 24;
const LABEL_SIZE: u32 = 14;

fn drawing<E: Display>(file: &Path) -> impl FnOnce(E) -> ChartError {
    let file = file.display().to_string();
    move |e| ChartError::Drawing {
        file,
        message: e.to_string(),
    }
}

/// Upper bound for a value axis, with headroom so the tallest bar does not
/// touch the frame.
fn value_ceiling<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> f64 {
    let max = values.into_iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

/// Label for an x tick: the month at an integer position, blank between months.
pub fn tick_label(labels: &[String], x: f64) -> String {
    let index = x.round();
    if (x - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Share of `total` as a percentage with one decimal, e.g. `37.5%`.
pub fn slice_percent(amount: f64, total: f64) -> String {
    if total <= 0.0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", amount / total * 100.0)
}

fn text_style(size: u32, h: HPos, v: VPos) -> TextStyle<'static> {
    (FONT_FAMILY, size)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(h, v))
}

/// Grouped bars per month, income left of the month tick and expense right.
pub fn draw_monthly_bars(path: &Path, data: &ChartData) -> Result<()> {
    let labels = font::labels_available();
    let root = BitMapBackend::new(path, BAR_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing(path))?;

    let slots = data.months.len().max(1);
    let ceiling = value_ceiling(data.income.iter().chain(data.expense.iter()));

    let mut builder = ChartBuilder::on(&root);
    builder.margin(30);
    if labels {
        builder
            .caption("Monthly income vs expense", (FONT_FAMILY, TITLE_SIZE))
            .x_label_area_size(40)
            .y_label_area_size(70);
    }
    let mut chart = builder
        .build_cartesian_2d(-0.5..slots as f64 - 0.5, 0.0..ceiling)
        .map_err(drawing(path))?;

    if labels {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(slots)
            .x_label_formatter(&|x: &f64| tick_label(&data.months, *x))
            .x_desc("Month")
            .y_desc("Amount")
            .label_style((FONT_FAMILY, LABEL_SIZE))
            .draw()
            .map_err(drawing(path))?;
    }

    chart
        .draw_series(data.income.iter().enumerate().map(|(i, value)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x - 0.02, *value)], INCOME_COLOR.filled())
        }))
        .map_err(drawing(path))?
        .label("Income")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], INCOME_COLOR.filled()));

    chart
        .draw_series(data.expense.iter().enumerate().map(|(i, value)| {
            let x = i as f64;
            Rectangle::new([(x + 0.02, 0.0), (x + 0.4, *value)], EXPENSE_COLOR.filled())
        }))
        .map_err(drawing(path))?
        .label("Expense")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], EXPENSE_COLOR.filled()));

    chart
        .draw_series(LineSeries::new(
            vec![(-0.5, 0.0), (slots as f64 - 0.5, 0.0)],
            &BLACK,
        ))
        .map_err(drawing(path))?;

    if labels {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font((FONT_FAMILY, LABEL_SIZE))
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(drawing(path))?;
    }

    root.present().map_err(drawing(path))?;
    Ok(())
}

/// Pie of category shares, starting at twelve o'clock. Slices are polygons
/// approximating the arc, colored from `Palette99` in category order. With a
/// font each slice carries its percentage inside and its category outside.
pub fn draw_category_pie(path: &Path, series: &CategorySeries) -> Result<()> {
    let labels = font::labels_available();
    let root = BitMapBackend::new(path, PIE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing(path))?;

    let total: f64 = series.amounts.iter().filter(|a| **a > 0.0).sum();
    let center = (
        (PIE_CHART_SIZE.0 / 2) as i32,
        (PIE_CHART_SIZE.1 / 2) as i32 + if labels { 15 } else { 0 },
    );
    let scale = if labels { 0.32 } else { 0.4 };
    let radius = f64::from(PIE_CHART_SIZE.0.min(PIE_CHART_SIZE.1)) * scale;

    if labels {
        root.draw(&Text::new(
            "Expenses by category".to_string(),
            ((PIE_CHART_SIZE.0 / 2) as i32, 12),
            text_style(TITLE_SIZE, HPos::Center, VPos::Top),
        ))
        .map_err(drawing(path))?;
    }

    let at = |angle: f64, distance: f64| {
        (
            center.0 + (distance * angle.cos()).round() as i32,
            center.1 + (distance * angle.sin()).round() as i32,
        )
    };

    let mut start = -PI / 2.0;
    for (idx, amount) in series.amounts.iter().enumerate() {
        if *amount <= 0.0 || total <= 0.0 {
            continue;
        }
        let sweep = amount / total * 2.0 * PI;
        // roughly one vertex per two degrees of arc
        let steps = (sweep.to_degrees() / 2.0).ceil().max(2.0) as usize;

        let mut points = Vec::with_capacity(steps + 2);
        points.push(center);
        for step in 0..=steps {
            points.push(at(start + sweep * step as f64 / steps as f64, radius));
        }

        root.draw(&Polygon::new(points, Palette99::pick(idx).filled()))
            .map_err(drawing(path))?;

        if labels {
            let middle = start + sweep / 2.0;
            root.draw(&Text::new(
                slice_percent(*amount, total),
                at(middle, radius * 0.65),
                text_style(LABEL_SIZE, HPos::Center, VPos::Center),
            ))
            .map_err(drawing(path))?;

            let side = if middle.cos() >= 0.0 { HPos::Left } else { HPos::Right };
            let name = series.categories.get(idx).cloned().unwrap_or_default();
            root.draw(&Text::new(
                name,
                at(middle, radius * 1.08),
                text_style(LABEL_SIZE, side, VPos::Center),
            ))
            .map_err(drawing(path))?;
        }
        start += sweep;
    }

    root.present().map_err(drawing(path))?;
    Ok(())
}

/// Actual monthly expense as a line with markers, the fitted trend over the
/// same months, and a single marker for the predicted next month.
pub fn draw_forecast(path: &Path, forecast: &Forecast) -> Result<()> {
    let labels = font::labels_available();
    let root = BitMapBackend::new(path, FORECAST_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing(path))?;

    let actual: Vec<(f64, f64)> = forecast
        .actual
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();
    let fitted: Vec<(f64, f64)> = forecast
        .fitted()
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i as f64, v))
        .collect();
    let next = (
        forecast.next_index as f64,
        forecast.predicted_next_month_expense,
    );

    let all_values = actual
        .iter()
        .chain(fitted.iter())
        .map(|(_, y)| *y)
        .chain(std::iter::once(next.1));
    let (low, high) = all_values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    let pad = if high > low { (high - low) * 0.1 } else { 1.0 };

    let mut builder = ChartBuilder::on(&root);
    builder.margin(30);
    if labels {
        builder
            .caption("Monthly expense trend and forecast", (FONT_FAMILY, TITLE_SIZE))
            .x_label_area_size(40)
            .y_label_area_size(70);
    }
    let mut chart = builder
        .build_cartesian_2d(-0.5..next.0 + 0.5, (low - pad)..(high + pad))
        .map_err(drawing(path))?;

    if labels {
        let mut ticks = forecast.months.clone();
        ticks.push("Next month".to_string());
        chart
            .configure_mesh()
            .x_labels(ticks.len())
            .x_label_formatter(&|x: &f64| tick_label(&ticks, *x))
            .x_desc("Month")
            .y_desc("Expense")
            .label_style((FONT_FAMILY, LABEL_SIZE))
            .draw()
            .map_err(drawing(path))?;
    }

    chart
        .draw_series(LineSeries::new(actual.clone(), ACTUAL_COLOR.stroke_width(2)))
        .map_err(drawing(path))?
        .label("Actual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ACTUAL_COLOR.stroke_width(2)));
    chart
        .draw_series(
            actual
                .iter()
                .map(|point| Circle::new(*point, 4, ACTUAL_COLOR.filled())),
        )
        .map_err(drawing(path))?;
    chart
        .draw_series(LineSeries::new(fitted, FITTED_COLOR.stroke_width(2)))
        .map_err(drawing(path))?
        .label("Linear trend")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], FITTED_COLOR.stroke_width(2)));
    chart
        .draw_series(std::iter::once(Circle::new(next, 8, FORECAST_COLOR.filled())))
        .map_err(drawing(path))?
        .label("Forecast")
        .legend(|(x, y)| Circle::new((x + 10, y), 5, FORECAST_COLOR.filled()));

    if labels {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font((FONT_FAMILY, LABEL_SIZE))
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(drawing(path))?;
    }

    root.present().map_err(drawing(path))?;
    Ok(())
}

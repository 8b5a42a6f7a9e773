use std::path::Path;

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use crate::error::{AppError, Result};
use crate::locale::Locale;
use crate::table::HumidityDay;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 630;

const BACKGROUND: RGBColor = RGBColor(0x1e, 0x1e, 0x1e);
const BAND: RGBColor = RGBColor(0xa5, 0xd6, 0xa7);
const AVG_LINE: RGBColor = RGBColor(0x4c, 0xaf, 0x50);

/// Render the soil-humidity chart: a translucent band between the daily
/// minimum and maximum with the average as a solid line, on a dark
/// background, one x slot per day.
pub fn render_humidity_chart(
    days: &[HumidityDay],
    locale: Locale,
    path: &Path,
) -> Result<()> {
    if days.is_empty() {
        return Err(AppError::Chart("No humidity rows to plot".to_string()));
    }

    let labels: Vec<String> = days
        .iter()
        .map(|d| d.date.format("%Y-%m-%d").to_string())
        .collect();
    let n = days.len();
    let (y_min, y_max) = y_bounds(days);

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&BACKGROUND).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            locale.chart_title(),
            ("sans-serif", 32).into_font().color(&WHITE),
        )
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_min..y_max)
        .map_err(draw_err)?;

    let x_label = |x: &f64| {
        let i = x.round();
        // Only label whole day slots, not intermediate mesh points.
        if (x - i).abs() > 0.25 || i < 0.0 {
            return String::new();
        }
        labels.get(i as usize).cloned().unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(BACKGROUND)
        .bold_line_style(WHITE.mix(0.3))
        .axis_style(WHITE)
        .label_style(("sans-serif", 14).into_font().color(&WHITE))
        .x_labels(n)
        .x_label_formatter(&x_label)
        .x_desc(locale.chart_x_label())
        .y_desc(locale.chart_y_label())
        .draw()
        .map_err(draw_err)?;

    // Min/max band: lower edge left to right, upper edge back.
    let mut band: Vec<(f64, f64)> = days
        .iter()
        .enumerate()
        .map(|(i, d)| (i as f64, d.min_pct))
        .collect();
    band.extend(
        days.iter()
            .enumerate()
            .rev()
            .map(|(i, d)| (i as f64, d.max_pct)),
    );

    chart
        .draw_series(std::iter::once(Polygon::new(band, BAND.mix(0.5))))
        .map_err(draw_err)?
        .label(locale.chart_band_legend())
        .legend(|(x, y)| {
            Rectangle::new([(x, y - 6), (x + 12, y + 6)], BAND.mix(0.5).filled())
        });

    chart
        .draw_series(LineSeries::new(
            days.iter().enumerate().map(|(i, d)| (i as f64, d.avg_pct)),
            AVG_LINE.stroke_width(2),
        ))
        .map_err(draw_err)?
        .label(locale.chart_avg_legend())
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 12, y)], AVG_LINE.stroke_width(2))
        });

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperMiddle)
        .background_style(BACKGROUND)
        .border_style(BACKGROUND)
        .label_font(("sans-serif", 14).into_font().color(&WHITE))
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Y range padded around the data, clamped to the 0..100 percentage scale.
fn y_bounds(days: &[HumidityDay]) -> (f64, f64) {
    let min = days.iter().map(|d| d.min_pct).fold(f64::INFINITY, f64::min);
    let max = days
        .iter()
        .map(|d| d.max_pct)
        .fold(f64::NEG_INFINITY, f64::max);

    let padding = ((max - min) * 0.1).max(1.0);
    ((min - padding).max(0.0), (max + padding).min(100.0))
}

fn draw_err<E>(e: DrawingAreaErrorKind<E>) -> AppError
where
    E: std::error::Error + Send + Sync,
{
    AppError::Chart(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_days() -> Vec<HumidityDay> {
        [
            ("2025-04-01", 40.4, 49.9, 58.9),
            ("2025-04-02", 42.3, 51.3, 60.9),
            ("2025-04-03", 37.5, 47.1, 55.6),
        ]
        .iter()
        .map(|(d, min_pct, avg_pct, max_pct)| HumidityDay {
            date: NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
            min_pct: *min_pct,
            avg_pct: *avg_pct,
            max_pct: *max_pct,
        })
        .collect()
    }

    #[test]
    fn test_renders_png_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("soil_humidity.png");

        render_humidity_chart(&sample_days(), Locale::En, &path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_single_day_renders() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("one_day.png");

        render_humidity_chart(&sample_days()[..1], Locale::Es, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("never.png");

        assert!(render_humidity_chart(&[], Locale::En, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_y_bounds_clamped_to_percentage_scale() {
        let days = vec![HumidityDay {
            date: NaiveDate::parse_from_str("2025-04-01", "%Y-%m-%d").unwrap(),
            min_pct: 0.5,
            avg_pct: 50.0,
            max_pct: 99.8,
        }];
        let (lo, hi) = y_bounds(&days);
        assert!(lo >= 0.0);
        assert!(hi <= 100.0);
        assert!(lo < hi);
    }
}

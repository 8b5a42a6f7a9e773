use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::locale::Locale;

/// One aggregated day of raw sensor readings (0..=1023 ADC scale).
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDay {
    pub date: NaiveDate,
    pub min_value: f64,
    pub avg_value: f64,
    pub max_value: f64,
}

/// One day converted to humidity percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct HumidityDay {
    pub date: NaiveDate,
    pub min_pct: f64,
    pub avg_pct: f64,
    pub max_pct: f64,
}

/// Full scale of the sensor ADC. A reading of 1023 is bone dry.
const ADC_FULL_SCALE: f64 = 1023.0;

impl SensorDay {
    /// Convert raw readings to humidity. The sensor reads *lower* when the
    /// soil is wetter, so the raw maximum becomes the humidity minimum.
    pub fn to_humidity(&self) -> HumidityDay {
        HumidityDay {
            date: self.date,
            min_pct: raw_to_pct(self.max_value),
            avg_pct: raw_to_pct(self.avg_value),
            max_pct: raw_to_pct(self.min_value),
        }
    }
}

fn raw_to_pct(raw: f64) -> f64 {
    (ADC_FULL_SCALE - raw) / ADC_FULL_SCALE * 100.0
}

/// Row shape of the oracle's JSON fallback output.
#[derive(Debug, Deserialize)]
pub struct RawSensorRow {
    pub date: String,
    pub min_value: f64,
    pub avg_value: f64,
    pub max_value: f64,
}

impl RawSensorRow {
    pub fn into_sensor_day(self) -> Result<SensorDay> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| AppError::Report(format!("Invalid date '{}': {e}", self.date)))?;
        let day = SensorDay {
            date,
            min_value: self.min_value,
            avg_value: self.avg_value,
            max_value: self.max_value,
        };
        validate_day(&day)?;
        Ok(day)
    }
}

fn validate_day(day: &SensorDay) -> Result<()> {
    for value in [day.min_value, day.avg_value, day.max_value] {
        if !value.is_finite() || !(0.0..=ADC_FULL_SCALE).contains(&value) {
            return Err(AppError::Report(format!(
                "Reading {value} on {} outside sensor range",
                day.date
            )));
        }
    }
    if day.min_value > day.avg_value || day.avg_value > day.max_value {
        return Err(AppError::Report(format!(
            "Readings on {} not ordered min <= avg <= max",
            day.date
        )));
    }
    Ok(())
}

/// Parse the report's Markdown table into sensor days.
///
/// The table is oracle-generated, so parsing is lenient: columns are located
/// by the locale's header names, extra columns are ignored, and rows that do
/// not parse or fail range validation are skipped. Returns an empty vec when
/// no table is found.
pub fn parse_sensor_table(markdown: &str, locale: Locale) -> Vec<SensorDay> {
    let mut days: Vec<SensorDay> = parse_table(markdown, locale.report_columns())
        .into_iter()
        .map(|(date, min_value, avg_value, max_value)| SensorDay {
            date,
            min_value,
            avg_value,
            max_value,
        })
        .filter(|day| validate_day(day).is_ok())
        .collect();
    days.sort_by_key(|d| d.date);
    days
}

/// Parse the humidity table written by the chart stage.
pub fn parse_humidity_table(markdown: &str, locale: Locale) -> Vec<HumidityDay> {
    let mut days: Vec<HumidityDay> = parse_table(markdown, locale.humidity_columns())
        .into_iter()
        .map(|(date, min_pct, avg_pct, max_pct)| HumidityDay {
            date,
            min_pct,
            avg_pct,
            max_pct,
        })
        .collect();
    days.sort_by_key(|d| d.date);
    days
}

/// Locate the named columns in the first table of `markdown` and pull out
/// one `(date, min, avg, max)` tuple per parseable row.
fn parse_table(markdown: &str, columns: [&str; 4]) -> Vec<(NaiveDate, f64, f64, f64)> {
    let [date_col, min_col, avg_col, max_col] = columns;

    let mut rows = table_rows(markdown);
    if rows.is_empty() {
        return Vec::new();
    }
    let header = rows.remove(0);

    let find = |name: &str| {
        header
            .iter()
            .position(|cell| cell.to_lowercase().contains(&name.to_lowercase()))
    };
    let (Some(di), Some(mi), Some(ai), Some(xi)) =
        (find(date_col), find(min_col), find(avg_col), find(max_col))
    else {
        return Vec::new();
    };

    let mut parsed = Vec::new();
    for row in rows {
        let Some(tuple) = parse_row(&row, di, mi, ai, xi) else {
            tracing::debug!(row = ?row, "Skipping unparseable table row");
            continue;
        };
        parsed.push(tuple);
    }
    parsed
}

/// Render the humidity table as Markdown: right-aligned numeric columns,
/// two decimal places.
pub fn render_humidity_table(days: &[HumidityDay], locale: Locale) -> String {
    let [date_col, min_col, avg_col, max_col] = locale.humidity_columns();

    let mut out = String::new();
    out.push_str(&format!(
        "| {date_col} | {min_col} | {avg_col} | {max_col} |\n"
    ));
    out.push_str("|:-----------|------------:|------------:|------------:|\n");
    for day in days {
        out.push_str(&format!(
            "| {} | {:>11.2} | {:>11.2} | {:>11.2} |\n",
            day.date.format("%Y-%m-%d"),
            day.min_pct,
            day.avg_pct,
            day.max_pct
        ));
    }
    out
}

/// Split the pipe-delimited table lines of a Markdown document into cell
/// grids, separator line removed. The first returned row is the header.
fn table_rows(markdown: &str) -> Vec<Vec<String>> {
    markdown
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|') && line.len() > 1)
        .filter(|line| !is_separator(line))
        .map(split_cells)
        .collect()
}

fn is_separator(line: &str) -> bool {
    line.chars()
        .all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn split_cells(line: &str) -> Vec<String> {
    line.trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().trim_matches('*').trim().to_string())
        .collect()
}

fn parse_row(
    row: &[String],
    di: usize,
    mi: usize,
    ai: usize,
    xi: usize,
) -> Option<(NaiveDate, f64, f64, f64)> {
    Some((
        parse_date(row.get(di)?)?,
        parse_number(row.get(mi)?)?,
        parse_number(row.get(ai)?)?,
        parse_number(row.get(xi)?)?,
    ))
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(cell, "%d/%m/%Y"))
        .ok()
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().replace(',', "").parse().ok()
}

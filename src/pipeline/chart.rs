use crate::chart::render_humidity_chart;
use crate::error::{AppError, Result};
use crate::locale::{ArtifactPaths, Locale};
use crate::oracle::{prompt, Oracle};
use crate::pipeline::files_exist;
use crate::pipeline::runner::{run_bounded, RetryPolicy, RunOutcome};
use crate::table::{self, HumidityDay, RawSensorRow, SensorDay};

/// Chart stage: parse the report's table, convert readings to humidity,
/// render the PNG, and write the humidity Markdown table.
///
/// The success predicate checks both artifacts, so a re-run with the files
/// already on disk does no oracle work at all.
pub async fn run(
    oracle: &dyn Oracle,
    model: &str,
    locale: Locale,
    paths: &ArtifactPaths,
    policy: RetryPolicy,
) -> RunOutcome {
    run_bounded(
        "chart",
        policy,
        move || async move { files_exist(&paths.chart_stage_files()).await },
        move || async move { generate_artifacts(oracle, model, locale, paths).await },
    )
    .await
}

async fn generate_artifacts(
    oracle: &dyn Oracle,
    model: &str,
    locale: Locale,
    paths: &ArtifactPaths,
) -> Result<()> {
    let report = tokio::fs::read_to_string(&paths.report).await.map_err(|e| {
        AppError::Chart(format!(
            "Could not read report {}: {e}",
            paths.report.display()
        ))
    })?;

    let mut days = table::parse_sensor_table(&report, locale);
    if days.is_empty() {
        tracing::warn!("No table found in report, asking oracle to extract rows");
        days = extract_rows_via_oracle(oracle, model, locale, &report).await?;
    }
    if days.is_empty() {
        return Err(AppError::Chart(
            "Report contains no usable sensor rows".to_string(),
        ));
    }

    let humidity: Vec<HumidityDay> = days.iter().map(SensorDay::to_humidity).collect();

    tokio::fs::write(
        &paths.humidity_table,
        table::render_humidity_table(&humidity, locale),
    )
    .await?;

    // Rendering is CPU-bound; keep it off the async worker.
    let chart_path = paths.chart.clone();
    let rows = humidity.clone();
    tokio::task::spawn_blocking(move || render_humidity_chart(&rows, locale, &chart_path))
        .await
        .map_err(|e| AppError::Chart(format!("Chart render task panicked: {e}")))??;

    tracing::info!(
        chart = %paths.chart.display(),
        table = %paths.humidity_table.display(),
        "Chart artifacts generated"
    );
    Ok(())
}

/// Fallback when the report carries no directly parseable table: the oracle
/// re-emits the rows as JSON, which are then validated before use.
async fn extract_rows_via_oracle(
    oracle: &dyn Oracle,
    model: &str,
    locale: Locale,
    report: &str,
) -> Result<Vec<SensorDay>> {
    let response = oracle
        .generate(model, &prompt::row_extraction(locale, report))
        .await?;

    let json = extract_json_array(&response)
        .ok_or_else(|| AppError::Chart("Oracle returned no JSON array".to_string()))?;
    let rows: Vec<RawSensorRow> = serde_json::from_str(json)?;

    rows.into_iter().map(RawSensorRow::into_sensor_day).collect()
}

fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

use crate::db::SensorStore;
use crate::error::{AppError, Result};
use crate::locale::{ArtifactPaths, Locale};
use crate::oracle::{prompt, Oracle};
use crate::pipeline::file_nonempty;
use crate::pipeline::runner::{run_bounded, RetryPolicy, RunOutcome};

/// Report stage: oracle-generated SQL, executed against the sensor store,
/// formatted by the oracle into a Markdown report on disk.
pub async fn run(
    oracle: &dyn Oracle,
    store: &SensorStore,
    model: &str,
    locale: Locale,
    paths: &ArtifactPaths,
    policy: RetryPolicy,
) -> RunOutcome {
    run_bounded(
        "report",
        policy,
        move || async move { file_nonempty(&paths.report).await },
        move || async move { generate_report(oracle, store, model, locale, paths).await },
    )
    .await
}

async fn generate_report(
    oracle: &dyn Oracle,
    store: &SensorStore,
    model: &str,
    locale: Locale,
    paths: &ArtifactPaths,
) -> Result<()> {
    let sql = oracle.generate(model, &prompt::sql_generation(locale)).await?;
    let results = store.run_select(&sql).await?;
    if results.is_empty() {
        return Err(AppError::Report("Query returned no rows".to_string()));
    }
    tracing::info!(results = %results, "Results obtained");

    let report = oracle.generate(model, &prompt::report(locale, &results)).await?;
    let report = report.trim();
    if report.is_empty() {
        return Err(AppError::Report("Oracle returned an empty report".to_string()));
    }

    tokio::fs::write(&paths.report, report).await?;
    tracing::info!(path = %paths.report.display(), "Report saved");
    Ok(())
}

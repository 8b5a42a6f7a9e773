pub mod chart;
pub mod email;
pub mod report;
pub mod runner;
pub mod types;

use std::path::Path;

use crate::config::AppConfig;
use crate::db::SensorStore;
use crate::locale::ArtifactPaths;
use crate::mailer::Mailer;
use crate::oracle::Oracle;
use runner::{RetryPolicy, RunOutcome};
use types::PipelineOutcome;

/// Run the three stages in order, stopping at the first one that exhausts
/// its attempts. Chart-stage artifacts are removed at the end either way,
/// mirroring a fresh state for the next scheduled run.
pub async fn run_pipeline(
    config: &AppConfig,
    oracle: &dyn Oracle,
    store: &SensorStore,
    mailer: &Mailer,
) -> PipelineOutcome {
    let locale = config.output.locale;
    let paths = ArtifactPaths::new(&config.output.dir, locale);

    let outcome = stages(config, oracle, store, mailer, &paths).await;

    if config.output.keep_artifacts {
        tracing::info!("Keeping artifacts as configured");
    } else {
        cleanup_artifacts(&paths).await;
    }

    outcome
}

async fn stages(
    config: &AppConfig,
    oracle: &dyn Oracle,
    store: &SensorStore,
    mailer: &Mailer,
    paths: &ArtifactPaths,
) -> PipelineOutcome {
    let locale = config.output.locale;
    let delay = config.retry.delay();

    let outcome = report::run(
        oracle,
        store,
        &config.oracle.model,
        locale,
        paths,
        RetryPolicy {
            max_attempts: config.retry.report_attempts,
            delay,
        },
    )
    .await;
    if let RunOutcome::Exhausted { attempts } = outcome {
        return PipelineOutcome::Failed {
            stage: "report",
            attempts,
        };
    }

    let outcome = chart::run(
        oracle,
        &config.oracle.model,
        locale,
        paths,
        RetryPolicy {
            max_attempts: config.retry.chart_attempts,
            delay,
        },
    )
    .await;
    if let RunOutcome::Exhausted { attempts } = outcome {
        return PipelineOutcome::Failed {
            stage: "chart",
            attempts,
        };
    }

    let outcome = email::run(
        oracle,
        mailer,
        &config.oracle.email_model,
        locale,
        paths,
        RetryPolicy {
            max_attempts: config.retry.email_attempts,
            delay,
        },
    )
    .await;
    if let RunOutcome::Exhausted { attempts } = outcome {
        return PipelineOutcome::Failed {
            stage: "email",
            attempts,
        };
    }

    PipelineOutcome::Completed
}

/// Remove the chart-stage artifacts, logging each path either way.
pub async fn cleanup_artifacts(paths: &ArtifactPaths) {
    for path in paths.chart_stage_files() {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::info!(path = %path.display(), "File removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "File not found (already removed)");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove file");
            }
        }
    }
}

pub(crate) async fn file_nonempty(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len() > 0,
        Err(_) => false,
    }
}

pub(crate) async fn files_exist(paths: &[&Path]) -> bool {
    for path in paths {
        if !file_nonempty(path).await {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    #[tokio::test]
    async fn test_file_nonempty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("artifact.md");

        assert!(!file_nonempty(&path).await);

        std::fs::write(&path, "").unwrap();
        assert!(!file_nonempty(&path).await);

        std::fs::write(&path, "content").unwrap();
        assert!(file_nonempty(&path).await);
    }

    #[tokio::test]
    async fn test_files_exist_requires_all() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.md");

        std::fs::write(&a, "x").unwrap();
        assert!(!files_exist(&[a.as_path(), b.as_path()]).await);

        std::fs::write(&b, "y").unwrap();
        assert!(files_exist(&[a.as_path(), b.as_path()]).await);
    }

    #[tokio::test]
    async fn test_cleanup_removes_chart_artifacts_but_not_report() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(tmp.path(), Locale::En);

        std::fs::write(&paths.report, "report").unwrap();
        std::fs::write(&paths.chart, "png").unwrap();
        std::fs::write(&paths.humidity_table, "table").unwrap();

        cleanup_artifacts(&paths).await;

        assert!(paths.report.exists());
        assert!(!paths.chart.exists());
        assert!(!paths.humidity_table.exists());
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(tmp.path(), Locale::En);

        // Nothing on disk; cleanup just logs.
        cleanup_artifacts(&paths).await;
    }
}

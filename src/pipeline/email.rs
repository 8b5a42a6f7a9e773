use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{AppError, Result};
use crate::locale::{ArtifactPaths, Locale};
use crate::mailer::{extract_html_document, Mailer};
use crate::oracle::{prompt, Oracle};
use crate::pipeline::runner::{run_bounded, RetryPolicy, RunOutcome};
use crate::table;

/// Email stage: oracle drafts an HTML digest of the humidity table, which
/// is sent over SMTP with the chart attached.
///
/// There is no file artifact to probe here; the predicate is whether this
/// run has already sent the message.
pub async fn run(
    oracle: &dyn Oracle,
    mailer: &Mailer,
    model: &str,
    locale: Locale,
    paths: &ArtifactPaths,
    policy: RetryPolicy,
) -> RunOutcome {
    let sent = AtomicBool::new(false);
    let sent_ref = &sent;

    run_bounded(
        "email",
        policy,
        move || async move { sent_ref.load(Ordering::SeqCst) },
        move || async move {
            send_digest(oracle, mailer, model, locale, paths).await?;
            sent_ref.store(true, Ordering::SeqCst);
            Ok(())
        },
    )
    .await
}

async fn send_digest(
    oracle: &dyn Oracle,
    mailer: &Mailer,
    model: &str,
    locale: Locale,
    paths: &ArtifactPaths,
) -> Result<()> {
    let raw_table = tokio::fs::read_to_string(&paths.humidity_table)
        .await
        .map_err(|e| {
            AppError::Email(format!(
                "Could not read humidity table {}: {e}",
                paths.humidity_table.display()
            ))
        })?;

    // Normalize through a parse/render round trip; fails fast on a corrupt
    // or empty table.
    let days = table::parse_humidity_table(&raw_table, locale);
    if days.is_empty() {
        return Err(AppError::Email("Humidity table has no rows".to_string()));
    }
    let markdown_table = table::render_humidity_table(&days, locale);

    let draft = oracle
        .generate(
            model,
            &prompt::email(locale, &markdown_table, mailer.recipient()),
        )
        .await?;
    let html = extract_html_document(&draft);

    let chart_bytes = tokio::fs::read(&paths.chart).await.map_err(|e| {
        AppError::Email(format!(
            "Could not read chart {}: {e}",
            paths.chart.display()
        ))
    })?;

    let today = chrono::Local::now().format("%d/%m/%Y").to_string();
    let attachment_name = paths
        .chart
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chart.png".to_string());

    mailer
        .send(
            &locale.email_subject(&today),
            &html,
            &attachment_name,
            chart_bytes,
        )
        .await
}

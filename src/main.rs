use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use verdant::config::AppConfig;
use verdant::db::SensorStore;
use verdant::locale::ArtifactPaths;
use verdant::mailer::Mailer;
use verdant::oracle::ollama::OllamaClient;
use verdant::pipeline::runner::RetryPolicy;
use verdant::pipeline::types::PipelineOutcome;

#[derive(Parser)]
#[command(name = "verdant", about = "Soil-moisture sensor reporting pipeline")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Individual stages; the default (no subcommand) runs all three and then
/// cleans up the chart artifacts.
#[derive(Subcommand)]
enum Command {
    /// Generate and execute the sensor query, write the Markdown report
    Report,
    /// Render the humidity chart and table from the report
    Chart,
    /// Draft and send the email digest with the chart attached
    Email,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;

    tracing::info!(
        output_dir = %config.output.dir.display(),
        locale = ?config.output.locale,
        "Starting verdant"
    );

    tokio::fs::create_dir_all(&config.output.dir).await?;

    let oracle = OllamaClient::new(&config.oracle.base_url);
    let mailer = Mailer::new(config.smtp.clone());
    let locale = config.output.locale;
    let paths = ArtifactPaths::new(&config.output.dir, locale);
    let delay = config.retry.delay();

    match cli.command {
        None => {
            let store = SensorStore::connect(&config.database).await?;
            let outcome =
                verdant::pipeline::run_pipeline(&config, &oracle, &store, &mailer).await;
            if let PipelineOutcome::Failed { stage, attempts } = outcome {
                anyhow::bail!("Pipeline failed at the {stage} stage after {attempts} attempts");
            }
        }
        Some(Command::Report) => {
            let store = SensorStore::connect(&config.database).await?;
            let outcome = verdant::pipeline::report::run(
                &oracle,
                &store,
                &config.oracle.model,
                locale,
                &paths,
                RetryPolicy {
                    max_attempts: config.retry.report_attempts,
                    delay,
                },
            )
            .await;
            if !outcome.is_success() {
                anyhow::bail!("Report stage failed");
            }
        }
        Some(Command::Chart) => {
            let outcome = verdant::pipeline::chart::run(
                &oracle,
                &config.oracle.model,
                locale,
                &paths,
                RetryPolicy {
                    max_attempts: config.retry.chart_attempts,
                    delay,
                },
            )
            .await;
            if !outcome.is_success() {
                anyhow::bail!("Chart stage failed");
            }
        }
        Some(Command::Email) => {
            let outcome = verdant::pipeline::email::run(
                &oracle,
                &mailer,
                &config.oracle.email_model,
                locale,
                &paths,
                RetryPolicy {
                    max_attempts: config.retry.email_attempts,
                    delay,
                },
            )
            .await;
            if !outcome.is_success() {
                anyhow::bail!("Email stage failed");
            }
        }
    }

    Ok(())
}

use feature_showcase::{Runner, ShowcaseConfig, Transcript};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "showcase=info,feature_showcase=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from environment
    let config = ShowcaseConfig::from_env();
    info!(
        "Loaded configuration: pool_size={}, task_count={}, carriers={}",
        config.tasks.pool_size, config.tasks.task_count, config.tasks.carrier_threads
    );
    if let Some(ref only) = config.only {
        info!("Running only: {}", only.join(", "));
    }

    let json_summary = config.json_summary;
    let mut transcript = Transcript::with_echo(config.echo);
    let runner = Runner::new(config);
    let summary = runner.run(&mut transcript).await?;

    info!(
        "Ran {} scenarios in {} ms",
        summary.scenarios.len(),
        summary.total_elapsed_ms
    );
    if json_summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

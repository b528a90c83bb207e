use anyhow::Context;
use clap::Parser;
use doc_translator_client::config::{
    DEFAULT_API_BASE_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_SECONDS, MAX_POLL_INTERVAL_MS,
    MIN_POLL_INTERVAL_MS,
};
use doc_translator_client::utils::logger;
use doc_translator_client::utils::validation::{validate_range, validate_url};
use doc_translator_client::{
    HttpJobClient, JobHandle, JobState, JobStatus, Poller, TranslatorError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "job-watch")]
#[command(about = "Poll an existing translation job until it completes or fails")]
struct Args {
    /// Job id returned by the translate endpoint
    job_id: String,

    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    timeout_seconds: u64,

    /// Ask the download endpoint for the result URL once completed
    #[arg(long)]
    download_url: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

enum WatchEvent {
    Status(JobStatus),
    Error(TranslatorError),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    validate_url("api_base_url", &args.api_base_url)?;
    validate_range(
        "poll_interval_ms",
        args.poll_interval_ms,
        MIN_POLL_INTERVAL_MS,
        MAX_POLL_INTERVAL_MS,
    )?;

    let client = Arc::new(
        HttpJobClient::new(&args.api_base_url, Duration::from_secs(args.timeout_seconds))
            .context("failed to build the HTTP client")?,
    );
    let poller = Poller::new(
        Arc::clone(&client),
        Duration::from_millis(args.poll_interval_ms),
    );
    let job = JobHandle::new(args.job_id.clone());

    tracing::info!("🔍 Watching job {} on {}", job, client.base_url());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let error_tx = tx.clone();
    let handle = poller.start(
        job.clone(),
        move |status| {
            let _ = tx.send(WatchEvent::Status(status));
        },
        move |err| {
            let _ = error_tx.send(WatchEvent::Error(err));
        },
    );

    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                println!("🛑 Stopped watching job {}", job);
                return Ok(());
            }
        };

        match event {
            Some(WatchEvent::Status(status)) => match status.status {
                JobState::Queued | JobState::Processing => {
                    let progress = status
                        .progress
                        .map(|p| format!(" ({:.0}%)", p))
                        .unwrap_or_default();
                    println!("⏳ {:?}{}", status.status, progress);
                }
                JobState::Completed => {
                    let url = status.result_url.unwrap_or_default();
                    println!("✅ Completed: {}", client.resolve_result_url(&url));
                    if args.download_url {
                        let download = client
                            .fetch_download_url(&job)
                            .await
                            .with_context(|| format!("no download URL for job {}", job))?;
                        println!("📥 Download: {}", download);
                    }
                    return Ok(());
                }
                JobState::Failed => {
                    eprintln!("❌ Translation failed: {}", status.failure_message());
                    std::process::exit(1);
                }
            },
            Some(WatchEvent::Error(err)) => {
                eprintln!("❌ {}", err.user_friendly_message());
                eprintln!("💡 Suggestion: {}", err.recovery_suggestion());
                std::process::exit(2);
            }
            None => return Ok(()),
        }
    }
}

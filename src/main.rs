use clap::Parser;
use doc_translator_client::utils::error::ErrorSeverity;
use doc_translator_client::utils::{logger, validation::Validate};
use doc_translator_client::{
    ClientSettings, CliConfig, HttpJobClient, LocalStorage, LogFormat, Phase, SelectedFile,
    TomlConfig, TranslationWorkflow, TranslatorError, WorkflowState,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CliConfig::parse();

    // 初始化日誌
    match config.log_format {
        LogFormat::Text => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(config.verbose),
    }

    tracing::info!("Starting doc-translate CLI");

    if let Some(path) = config.config.clone() {
        tracing::info!("📁 Loading configuration from: {}", path.display());
        match TomlConfig::from_file(&path) {
            Ok(toml) => config.merge_toml(&toml),
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path.display(), e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        }
    }

    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    for code in [&config.source, &config.target] {
        if !config.is_supported_language(code) {
            tracing::warn!(
                "⚠️ Language '{}' is not in the supported list ({})",
                code,
                config.supported_languages().join(", ")
            );
        }
    }

    let client = match HttpJobClient::from_settings(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => exit_with(&e),
    };
    let workflow = TranslationWorkflow::with_settings(Arc::clone(&client), &config);

    let file = match SelectedFile::from_path(&config.file).await {
        Ok(file) => file,
        Err(e) => exit_with(&e),
    };
    if let Err(e) = workflow.select_file(file) {
        exit_with(&e);
    }

    let progress = tokio::spawn(report_progress(workflow.subscribe()));

    if let Err(e) = workflow.translate(&config.source, &config.target).await {
        progress.abort();
        exit_with(&e);
    }

    let outcome = tokio::select! {
        outcome = workflow.wait_for_outcome() => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling translation");
            workflow.reset();
            progress.abort();
            std::process::exit(130);
        }
    };
    progress.abort();

    match outcome.phase {
        Phase::Completed => {
            let result_url = outcome.result_url.clone().unwrap_or_default();
            let result_url = client.resolve_result_url(&result_url);
            tracing::info!("✅ Translation completed successfully!");
            println!("✅ Translation completed successfully!");
            println!("🔗 Result: {}", result_url);
            if let Some(elapsed) = outcome.elapsed() {
                println!("⏱️ Took {}s", elapsed.num_seconds());
            }

            if let Some(output) = &config.output {
                let bytes = match client.download(&result_url).await {
                    Ok(bytes) => bytes,
                    Err(e) => exit_with(&e),
                };
                let storage = LocalStorage::new(".");
                match storage.write_file(output, &bytes).await {
                    Ok(path) => {
                        tracing::info!("📁 Output saved to: {}", path.display());
                        println!("📁 Output saved to: {}", path.display());
                    }
                    Err(e) => exit_with(&e),
                }
            }
        }
        _ => {
            let message = outcome
                .error_message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            exit_with(&TranslatorError::JobFailure { message });
        }
    }

    Ok(())
}

async fn report_progress(mut receiver: tokio::sync::watch::Receiver<WorkflowState>) {
    while receiver.changed().await.is_ok() {
        let state = receiver.borrow_and_update().clone();
        if state.phase == Phase::Translating {
            match (&state.job, state.progress) {
                (Some(job), Some(progress)) => println!("⏳ Job {}: {:.0}%", job, progress),
                (Some(job), None) => println!("⏳ Job {} is being translated...", job),
                _ => println!("📤 Uploading..."),
            }
        }
    }
}

fn exit_with(e: &TranslatorError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Translation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

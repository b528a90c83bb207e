#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";
pub const DEFAULT_TARGET_LANGUAGE: &str = "zh";
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

pub fn default_supported_languages() -> Vec<String> {
    ["en", "zh", "ja"].iter().map(|code| code.to_string()).collect()
}

pub(crate) fn megabytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

pub(crate) fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

#[cfg(feature = "cli")]
pub use cli_config::{CliConfig, LogFormat};

#[cfg(feature = "cli")]
mod cli_config {
    use super::toml_config::TomlConfig;
    use super::*;
    use crate::domain::ports::ClientSettings;
    use crate::utils::error::Result;
    use crate::utils::validation::{
        validate_non_empty_string, validate_positive_number, validate_range, validate_url,
        Validate,
    };
    use clap::{Parser, ValueEnum};
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
    #[serde(rename_all = "lowercase")]
    pub enum LogFormat {
        Text,
        Json,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "doc-translate")]
    #[command(about = "Upload a PDF, translate it and wait for the translated document")]
    pub struct CliConfig {
        /// PDF document to translate
        pub file: PathBuf,

        #[arg(long, default_value = DEFAULT_SOURCE_LANGUAGE)]
        pub source: String,

        #[arg(long, default_value = DEFAULT_TARGET_LANGUAGE)]
        pub target: String,

        #[arg(long, default_value = DEFAULT_API_BASE_URL)]
        pub api_base_url: String,

        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
        pub poll_interval_ms: u64,

        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
        pub timeout_seconds: u64,

        #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE_MB)]
        pub max_file_size_mb: u64,

        /// Where to save the translated PDF once the job completes
        #[arg(short, long)]
        pub output: Option<PathBuf>,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        pub config: Option<PathBuf>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, value_enum, default_value_t = LogFormat::Text)]
        pub log_format: LogFormat,

        #[arg(skip = default_supported_languages())]
        pub supported_languages: Vec<String>,
    }

    impl CliConfig {
        /// 命令列仍為預設值的欄位改用 TOML 設定
        pub fn merge_toml(&mut self, toml: &TomlConfig) {
            if self.api_base_url == DEFAULT_API_BASE_URL {
                self.api_base_url = toml.api.base_url.clone();
            }
            if self.timeout_seconds == DEFAULT_TIMEOUT_SECONDS {
                self.timeout_seconds = toml.api.timeout_seconds;
            }
            if self.poll_interval_ms == DEFAULT_POLL_INTERVAL_MS {
                self.poll_interval_ms = toml.polling.interval_ms;
            }
            if self.max_file_size_mb == DEFAULT_MAX_FILE_SIZE_MB {
                self.max_file_size_mb = toml.upload.max_file_size_mb;
            }
            if self.source == DEFAULT_SOURCE_LANGUAGE {
                self.source = toml.languages.default_source.clone();
            }
            if self.target == DEFAULT_TARGET_LANGUAGE {
                self.target = toml.languages.default_target.clone();
            }
            self.supported_languages = toml.languages.supported.clone();
        }

        pub fn is_supported_language(&self, code: &str) -> bool {
            self.supported_languages.iter().any(|known| known == code)
        }
    }

    impl ClientSettings for CliConfig {
        fn api_base_url(&self) -> &str {
            &self.api_base_url
        }

        fn poll_interval(&self) -> Duration {
            millis(self.poll_interval_ms)
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(self.timeout_seconds)
        }

        fn max_file_size(&self) -> u64 {
            megabytes(self.max_file_size_mb)
        }

        fn default_source_language(&self) -> &str {
            &self.source
        }

        fn default_target_language(&self) -> &str {
            &self.target
        }

        fn supported_languages(&self) -> &[String] {
            &self.supported_languages
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_url("api_base_url", &self.api_base_url)?;
            validate_range(
                "poll_interval_ms",
                self.poll_interval_ms,
                MIN_POLL_INTERVAL_MS,
                MAX_POLL_INTERVAL_MS,
            )?;
            validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
            validate_positive_number("max_file_size_mb", self.max_file_size_mb, 1)?;
            validate_non_empty_string("source", &self.source)?;
            validate_non_empty_string("target", &self.target)?;
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn parse(args: &[&str]) -> CliConfig {
            let mut argv = vec!["doc-translate"];
            argv.extend_from_slice(args);
            CliConfig::parse_from(argv)
        }

        #[test]
        fn test_cli_defaults() {
            let config = parse(&["paper.pdf"]);
            assert_eq!(config.file, PathBuf::from("paper.pdf"));
            assert_eq!(config.source, "en");
            assert_eq!(config.target, "zh");
            assert_eq!(config.poll_interval(), Duration::from_millis(2000));
            assert_eq!(config.max_file_size(), 10 * 1024 * 1024);
            assert_eq!(config.log_format, LogFormat::Text);
            assert!(config.is_supported_language("ja"));
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_cli_validation_rejects_bad_values() {
            let config = parse(&["paper.pdf", "--api-base-url", "ftp://host"]);
            assert!(config.validate().is_err());

            let config = parse(&["paper.pdf", "--poll-interval-ms", "10"]);
            assert!(config.validate().is_err());

            let config = parse(&["paper.pdf", "--timeout-seconds", "0"]);
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_merge_toml_only_overrides_defaults() {
            let toml = TomlConfig::from_toml_str(
                r#"
[api]
base_url = "https://translator.example.com"
timeout_seconds = 60

[polling]
interval_ms = 500

[languages]
default_target = "ja"
supported = ["en", "ja", "ko"]
"#,
            )
            .unwrap();

            let mut config = parse(&["paper.pdf", "--poll-interval-ms", "3000"]);
            config.merge_toml(&toml);

            assert_eq!(config.api_base_url, "https://translator.example.com");
            assert_eq!(config.timeout_seconds, 60);
            assert_eq!(config.poll_interval_ms, 3000);
            assert_eq!(config.target, "ja");
            assert_eq!(config.source, "en");
            assert!(config.is_supported_language("ko"));
            assert!(!config.is_supported_language("zh"));
        }
    }
}

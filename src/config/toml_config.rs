use super::{
    default_supported_languages, megabytes, millis, DEFAULT_MAX_FILE_SIZE_MB,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_SOURCE_LANGUAGE, DEFAULT_TARGET_LANGUAGE,
    DEFAULT_TIMEOUT_SECONDS, MAX_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS,
};
use crate::domain::ports::ClientSettings;
use crate::utils::error::{Result, TranslatorError};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub languages: LanguagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_file_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagesConfig {
    pub default_source: String,
    pub default_target: String,
    pub supported: Vec<String>,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
        }
    }
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            default_source: DEFAULT_SOURCE_LANGUAGE.to_string(),
            default_target: DEFAULT_TARGET_LANGUAGE.to_string(),
            supported: default_supported_languages(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TranslatorError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TRANSLATOR_API})，未設定的變數保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TranslatorError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ClientSettings for TomlConfig {
    fn api_base_url(&self) -> &str {
        &self.api.base_url
    }

    fn poll_interval(&self) -> Duration {
        millis(self.polling.interval_ms)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    fn max_file_size(&self) -> u64 {
        megabytes(self.upload.max_file_size_mb)
    }

    fn default_source_language(&self) -> &str {
        &self.languages.default_source
    }

    fn default_target_language(&self) -> &str {
        &self.languages.default_target
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages.supported
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_positive_number("api.timeout_seconds", self.api.timeout_seconds, 1)?;
        validate_range(
            "polling.interval_ms",
            self.polling.interval_ms,
            MIN_POLL_INTERVAL_MS,
            MAX_POLL_INTERVAL_MS,
        )?;
        validate_positive_number("upload.max_file_size_mb", self.upload.max_file_size_mb, 1)?;
        validate_non_empty_string("languages.default_source", &self.languages.default_source)?;
        validate_non_empty_string("languages.default_target", &self.languages.default_target)?;
        for code in &self.languages.supported {
            validate_non_empty_string("languages.supported", code)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_toml_uses_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "http://localhost:8000"
"#,
        )
        .unwrap();

        assert_eq!(config.api_base_url(), "http://localhost:8000");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.max_file_size(), 10 * 1024 * 1024);
        assert_eq!(config.default_source_language(), "en");
        assert_eq!(config.default_target_language(), "zh");
        assert_eq!(config.supported_languages(), ["en", "zh", "ja"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "https://translator.example.com/backend"
timeout_seconds = 90

[polling]
interval_ms = 750

[upload]
max_file_size_mb = 25

[languages]
default_source = "ja"
default_target = "en"
supported = ["en", "ja"]
"#,
        )
        .unwrap();

        assert_eq!(config.request_timeout(), Duration::from_secs(90));
        assert_eq!(config.poll_interval(), Duration::from_millis(750));
        assert_eq!(config.max_file_size(), 25 * 1024 * 1024);
        assert_eq!(config.default_source_language(), "ja");
        assert_eq!(config.supported_languages().len(), 2);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DOC_TRANSLATOR_TEST_API", "https://test.api.com");

        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "${DOC_TRANSLATOR_TEST_API}"
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://test.api.com");

        std::env::remove_var("DOC_TRANSLATOR_TEST_API");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "http://localhost:8000"

[polling]
interval_ms = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_section_is_config_error() {
        let err = TomlConfig::from_toml_str("[polling]\ninterval_ms = 500\n").unwrap_err();
        assert!(matches!(err, TranslatorError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[api]\nbase_url = \"http://127.0.0.1:9000\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
    }
}

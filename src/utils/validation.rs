use crate::utils::error::{Result, TranslatorError};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(TranslatorError::validation(field_name, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(TranslatorError::validation(
                field_name,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(TranslatorError::validation(
            field_name,
            format!("Invalid URL format '{}': {}", url_str, e),
        )),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(TranslatorError::validation(
            field_name,
            format!("Value {} must be at least {}", value, min_value),
        ));
    }
    Ok(())
}

pub fn validate_file_extension(
    field_name: &str,
    file_name: &str,
    allowed_extensions: &[&str],
) -> Result<()> {
    match Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension)
            if allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(extension)) =>
        {
            Ok(())
        }
        Some(extension) => Err(TranslatorError::validation(
            field_name,
            format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        )),
        None => Err(TranslatorError::validation(
            field_name,
            format!("'{}' has no extension or is not a valid filename", file_name),
        )),
    }
}

pub fn validate_file_size(field_name: &str, size: u64, max_size: u64) -> Result<()> {
    if size == 0 {
        return Err(TranslatorError::validation(field_name, "File is empty"));
    }
    if size > max_size {
        return Err(TranslatorError::validation(
            field_name,
            format!("File is {} bytes, the limit is {} bytes", size, max_size),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TranslatorError::validation(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(TranslatorError::validation(
            field_name,
            format!("Value {} must be between {} and {}", value, min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api.base_url", "https://example.com").is_ok());
        assert!(validate_url("api.base_url", "http://localhost:8000").is_ok());
        assert!(validate_url("api.base_url", "").is_err());
        assert!(validate_url("api.base_url", "invalid-url").is_err());
        assert!(validate_url("api.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("api.timeout_seconds", 30, 1).is_ok());
        assert!(validate_positive_number("api.timeout_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("file", "report.pdf", &["pdf"]).is_ok());
        assert!(validate_file_extension("file", "REPORT.PDF", &["pdf"]).is_ok());
        assert!(validate_file_extension("file", "notes.txt", &["pdf"]).is_err());
        assert!(validate_file_extension("file", "README", &["pdf"]).is_err());
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size("file", 1024, 10 * 1024 * 1024).is_ok());
        assert!(validate_file_size("file", 0, 10 * 1024 * 1024).is_err());
        assert!(validate_file_size("file", 11 * 1024 * 1024, 10 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("polling.interval_ms", 2000, 100, 60_000).is_ok());
        assert!(validate_range("polling.interval_ms", 50, 100, 60_000).is_err());
    }
}

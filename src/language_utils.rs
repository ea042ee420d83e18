//! Language utilities for ISO language code handling
//!
//! Target languages are ISO 639-1 (2-letter) codes, optionally followed by
//! region or script subtags the way .NET culture names are written
//! (`pt-BR`, `zh-Hans`). Only the primary code is checked against ISO 639-1.

use anyhow::{Result, anyhow};
use isolang::Language;

/// Validate a target language code and return it normalized.
///
/// The primary code is lowercased; subtags are kept as given.
pub fn validate_language_code(code: &str) -> Result<String> {
    let trimmed = code.trim();
    let mut parts = trimmed.split(['-', '_']);
    let primary = parts.next().unwrap_or_default().to_lowercase();

    if primary.len() != 2 || Language::from_639_1(&primary).is_none() {
        return Err(anyhow!("Invalid language code: {}", code));
    }

    let subtags: Vec<&str> = parts.collect();
    let valid_subtag = |s: &&str| (2..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric());
    if !subtags.iter().all(valid_subtag) {
        return Err(anyhow!("Invalid language code: {}", code));
    }

    if subtags.is_empty() {
        Ok(primary)
    } else {
        Ok(format!("{}-{}", primary, subtags.join("-")))
    }
}

/// Get the English language name for a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = validate_language_code(code)?;
    let primary = normalized.split('-').next().unwrap_or_default();
    let lang = Language::from_639_1(primary)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(lang.to_name().to_string())
}

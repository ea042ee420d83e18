//! System instruction sent with every batch.

use crate::language_utils::get_language_name;

/// Build the system prompt for a target language code.
///
/// The language is named in plain words when the code is known, and the code
/// itself is always included so the backend has something unambiguous to go on.
pub fn system_prompt(language_code: &str) -> String {
    let target = match get_language_name(language_code) {
        Ok(name) => format!("{} (code '{}')", name, language_code),
        Err(_) => format!("the language specified by the code '{}'", language_code),
    };
    format!(
        "You are a professional translator for software user interface resources. \
         Translate each value in the following JSON array of key-value pairs to {}. \
         Keep every key exactly as it is, and return the result as a JSON array of \
         single-pair objects in the same order. Preserve HTML entities, markup, format \
         placeholders and special characters in the values exactly as they appear. \
         Do not modify or remove them.",
        target
    )
}

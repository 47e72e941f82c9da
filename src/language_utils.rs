use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// This module validates and normalizes the language codes found in the
/// configuration and converts them to the forms each backend expects.
/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("rum", "ron"),
    ("slo", "slk"),
];

/// Resolve any accepted code form to an isolang `Language`
fn lookup(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    // Regional variants such as "zh-cn" or "en_US" resolve to their base language
    let base = normalized
        .split(|c| c == '-' || c == '_')
        .next()
        .unwrap_or_default();

    match base.len() {
        2 => Language::from_639_1(base),
        3 => {
            let part2t = PART2B_TO_PART2T
                .iter()
                .find(|(b, _)| *b == base)
                .map(|(_, t)| *t)
                .unwrap_or(base);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Normalize a language code to ISO 639-1 (2-letter) format
pub fn normalize_to_part1(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    lang.to_639_1()
        .map(|c| c.to_string())
        .ok_or_else(|| anyhow!("Language has no 2-letter code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup(code1), lookup(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Code form of the web translation endpoint ("zh-CN", "fr")
pub fn web_code(code: &str) -> String {
    match normalize_to_part1(code) {
        Ok(c) if c == "zh" => "zh-CN".to_string(),
        Ok(c) => c,
        Err(_) => code.to_string(),
    }
}

/// Code form of the terminology-aware service ("ZH", "FR")
pub fn deepl_code(code: &str) -> String {
    normalize_to_part1(code)
        .unwrap_or_else(|_| code.to_string())
        .to_uppercase()
}

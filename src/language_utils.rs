use anyhow::{Result, anyhow};
use isolang::Language;
use once_cell::sync::Lazy;
use regex::Regex;

/// Language utilities for locale handling
///
/// This module validates and normalizes the locale codes passed to the
/// translation providers: an ISO 639-1 or 639-2 language code optionally
/// followed by a region or script subtag (`en`, `fre`, `zh-tw`, `pt_BR`).
/// Language code type
#[derive(Debug, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their 639-2/T form
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

static LOCALE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]{2,3})(?:[-_]([A-Za-z]{2}|[A-Za-z]{4}|[0-9]{3}))?$")
        .unwrap_or_else(|e| panic!("invalid locale pattern: {}", e))
});

/// A locale choice offered by the command line shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleOption {
    /// Human readable label
    pub label: &'static str,
    /// Locale code passed to providers
    pub code: &'static str,
}

/// Source locales listed by `pdftrans languages`
pub const SOURCE_OPTIONS: &[LocaleOption] = &[
    LocaleOption { label: "English", code: "en" },
    LocaleOption { label: "German", code: "de" },
    LocaleOption { label: "French", code: "fr" },
];

/// Target locales listed by `pdftrans languages`
pub const TARGET_OPTIONS: &[LocaleOption] = &[
    LocaleOption { label: "Traditional Chinese", code: "zh-tw" },
    LocaleOption { label: "English", code: "en" },
];

/// Split a locale into its lowercase language part and optional region/script subtag
pub fn split_locale(code: &str) -> Result<(String, Option<String>)> {
    let trimmed = code.trim();
    let captures = LOCALE_PATTERN
        .captures(trimmed)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    let language = captures[1].to_lowercase();
    let subtag = captures.get(2).map(|m| m.as_str().to_string());
    Ok((language, subtag))
}

/// Validate if a locale's language part is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let (language, _) = split_locale(code)?;

    if language.len() == 2 {
        if Language::from_639_1(&language).is_some() {
            return Ok(LanguageCodeType::Part1);
        }
    } else if Language::from_639_3(&language).is_some() {
        return Ok(LanguageCodeType::Part2T);
    } else if PART2B_TO_PART2T.iter().any(|(b, _)| *b == language) {
        return Ok(LanguageCodeType::Part2B);
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize a locale's language part to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let (language, _) = split_locale(code)?;

    match validate_language_code(&language)? {
        LanguageCodeType::Part1 => Language::from_639_1(&language)
            .map(|lang| lang.to_639_3().to_string())
            .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code)),
        LanguageCodeType::Part2T => Ok(language),
        LanguageCodeType::Part2B => PART2B_TO_PART2T
            .iter()
            .find(|(b, _)| *b == language)
            .map(|(_, t)| t.to_string())
            .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code)),
    }
}

/// Get a human readable name for a locale, e.g. `Chinese (TW)`
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(match split_locale(code)?.1 {
        Some(subtag) => format!("{} ({})", lang.to_name(), format_subtag(&subtag)),
        None => lang.to_name().to_string(),
    })
}

/// Convert a locale to the casing translation services expect (`zh-tw` → `zh-TW`)
pub fn to_service_locale(code: &str) -> String {
    match split_locale(code) {
        Ok((language, Some(subtag))) => format!("{}-{}", language, format_subtag(&subtag)),
        Ok((language, None)) => language,
        Err(_) => code.trim().to_string(),
    }
}

/// Regions are upper case, scripts title case
fn format_subtag(subtag: &str) -> String {
    if subtag.len() == 4 {
        let mut chars = subtag.chars();
        chars
            .next()
            .map(|first| first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
            .unwrap_or_default()
    } else {
        subtag.to_uppercase()
    }
}

//! Language codes, display names and script-based detection.

use regex::Regex;
use std::sync::LazyLock;

/// Code returned when no script matches.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Languages offered for the source/target pair.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("zh", "Simplified Chinese"),
    ("en", "English"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("ru", "Russian"),
];

/// Script probes, checked in priority order. The first match wins.
static SCRIPT_PROBES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"[\x{4E00}-\x{9FA5}]", "zh"),
        (r"[\x{3040}-\x{30FF}]", "ja"),
        (r"[\x{AC00}-\x{D7AF}]", "ko"),
        (r"[a-zA-Z]", "en"),
        (r"[\x{00C0}-\x{017F}]", "fr"),
        (r"[\x{0400}-\x{04FF}]", "ru"),
    ]
    .into_iter()
    .map(|(pattern, code)| (Regex::new(pattern).expect("static script pattern"), code))
    .collect()
});

/// Best-guess language of `text`, from the scripts it contains.
///
/// Latin letters are checked before Latin-extended ones, so accented
/// European text that also contains plain ASCII letters reads as English.
pub fn detect_language(text: &str) -> &'static str {
    SCRIPT_PROBES
        .iter()
        .find(|(probe, _)| probe.is_match(text))
        .map(|(_, code)| *code)
        .unwrap_or(FALLBACK_LANGUAGE)
}

pub fn is_supported(code: &str) -> bool {
    LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// Human-readable name for prompting. Unknown codes are returned as-is.
pub fn language_name(code: &str) -> String {
    let lowercase = code.to_lowercase();
    let name = match lowercase.as_str() {
        "zh" => "Simplified Chinese",
        "en" => "English",
        "ja" => "Japanese",
        "ko" => "Korean",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "ru" => "Russian",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        _ => return code.to_string(),
    };
    name.to_string()
}

//! Target-language resolution.

/// Language code every plan falls back to.
pub const ENGLISH: &str = "en";

/// The ordered set of languages descriptions are fetched for.
///
/// Always `[system, "en"]`, collapsed to `["en"]` when the system language
/// already is English.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePlan {
    system: String,
    targets: Vec<String>,
}

impl LanguagePlan {
    /// Build a plan around a system language code such as `"fi"` or `"fi-FI"`.
    #[must_use]
    pub fn new(system: &str) -> Self {
        let system = normalize_code(system).unwrap_or_else(|| ENGLISH.to_string());
        let targets = if system == ENGLISH {
            vec![ENGLISH.to_string()]
        } else {
            vec![system.clone(), ENGLISH.to_string()]
        };
        Self { system, targets }
    }

    /// Plan for the language detected from the process locale.
    #[must_use]
    pub fn detect() -> Self {
        Self::new(&detect_system_language())
    }

    #[must_use]
    pub fn system(&self) -> &str {
        &self.system
    }

    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }
}

impl Default for LanguagePlan {
    fn default() -> Self {
        Self::new(ENGLISH)
    }
}

/// Read the two-letter language code from the locale environment.
///
/// Checks `LC_ALL`, `LC_MESSAGES` and `LANG` in that order; `C`/`POSIX`
/// and unset locales resolve to English.
#[must_use]
pub fn detect_system_language() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find_map(|value| normalize_code(&value))
        .unwrap_or_else(|| ENGLISH.to_string())
}

/// Reduce `fi_FI.UTF-8`, `fi-FI` or `FI` to `fi`.
fn normalize_code(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "C" || raw == "POSIX" || raw.starts_with("C.") {
        return None;
    }
    let code: String = raw
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect::<String>()
        .to_ascii_lowercase();
    (code.len() == 2).then_some(code)
}

/// English name of a language, used inside generator prompts.
#[must_use]
pub fn language_name(code: &str) -> &'static str {
    match code {
        "fi" => "Finnish",
        "sv" => "Swedish",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "it" => "Italian",
        "ja" => "Japanese",
        "zh" => "Chinese",
        "ko" => "Korean",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "nl" => "Dutch",
        "no" => "Norwegian",
        "da" => "Danish",
        _ => "English",
    }
}

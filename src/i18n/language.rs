use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use unic_langid::{langid, LanguageIdentifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedLanguage {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fr")]
    French,
}

impl SupportedLanguage {
    pub fn all() -> &'static [SupportedLanguage] {
        &[SupportedLanguage::English, SupportedLanguage::French]
    }

    pub fn code(&self) -> &'static str {
        match self {
            SupportedLanguage::English => "en",
            SupportedLanguage::French => "fr",
        }
    }

    /// Get the language identifier for Fluent
    pub fn lang_id(&self) -> LanguageIdentifier {
        match self {
            SupportedLanguage::English => langid!("en-US"),
            SupportedLanguage::French => langid!("fr-FR"),
        }
    }

    /// Parse from Accept-Language header, first supported entry wins
    pub fn from_accept_language(accept_language: &str) -> Self {
        for lang_part in accept_language.split(',') {
            let lang = lang_part.trim().split(';').next().unwrap_or("").to_lowercase();

            if lang.starts_with("fr") {
                return SupportedLanguage::French;
            } else if lang.starts_with("en") {
                return SupportedLanguage::English;
            }
        }

        Self::default()
    }
}

impl Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for SupportedLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" | "en-us" | "en-gb" => Ok(SupportedLanguage::English),
            "fr" | "french" | "français" | "fr-fr" => Ok(SupportedLanguage::French),
            _ => Err(format!("Unsupported language: {}", s)),
        }
    }
}

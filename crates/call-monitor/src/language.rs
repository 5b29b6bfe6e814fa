//! Language detection preferences

use serde::Serialize;
use thiserror::Error;

/// Language lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("Unknown language code: {0}")]
    Unknown(String),

    #[error("Language not supported yet: {0}")]
    Unsupported(String),
}

/// A language the detector knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
    pub supported: bool,
}

/// Language catalog
pub const LANGUAGES: [Language; 8] = [
    Language {
        code: "en",
        name: "English",
        flag: "🇺🇸",
        supported: true,
    },
    Language {
        code: "es",
        name: "Español",
        flag: "🇪🇸",
        supported: true,
    },
    Language {
        code: "fr",
        name: "Français",
        flag: "🇫🇷",
        supported: true,
    },
    Language {
        code: "de",
        name: "Deutsch",
        flag: "🇩🇪",
        supported: true,
    },
    Language {
        code: "pt",
        name: "Português",
        flag: "🇧🇷",
        supported: true,
    },
    Language {
        code: "it",
        name: "Italiano",
        flag: "🇮🇹",
        supported: false,
    },
    Language {
        code: "zh",
        name: "中文",
        flag: "🇨🇳",
        supported: false,
    },
    Language {
        code: "ja",
        name: "日本語",
        flag: "🇯🇵",
        supported: false,
    },
];

/// Look up a catalog entry by code
pub fn find_language(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

/// Which languages are monitored, and which one was detected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguagePreferences {
    selected: Vec<&'static str>,
    detected: &'static str,
}

impl Default for LanguagePreferences {
    fn default() -> Self {
        Self {
            selected: vec!["en", "es", "fr"],
            detected: "en",
        }
    }
}

impl LanguagePreferences {
    /// Flip selection of a supported language. Returns whether it is now selected.
    pub fn toggle(&mut self, code: &str) -> Result<bool, LanguageError> {
        let language = find_language(code)
            .ok_or_else(|| LanguageError::Unknown(code.to_string()))?;
        if !language.supported {
            return Err(LanguageError::Unsupported(code.to_string()));
        }

        if let Some(pos) = self.selected.iter().position(|&c| c == language.code) {
            self.selected.remove(pos);
            Ok(false)
        } else {
            self.selected.push(language.code);
            Ok(true)
        }
    }

    /// Record the language heard on the call
    pub fn set_detected(&mut self, code: &str) -> Result<(), LanguageError> {
        let language = find_language(code)
            .ok_or_else(|| LanguageError::Unknown(code.to_string()))?;
        self.detected = language.code;
        Ok(())
    }

    pub fn is_selected(&self, code: &str) -> bool {
        self.selected.contains(&code)
    }

    /// Selected codes in selection order
    pub fn selected(&self) -> &[&'static str] {
        &self.selected
    }

    pub fn detected(&self) -> &'static Language {
        find_language(self.detected).unwrap_or(&LANGUAGES[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = LanguagePreferences::default();
        assert_eq!(prefs.selected(), &["en", "es", "fr"]);
        assert_eq!(prefs.detected().name, "English");
    }

    #[test]
    fn test_toggle_supported() {
        let mut prefs = LanguagePreferences::default();
        assert_eq!(prefs.toggle("de"), Ok(true));
        assert!(prefs.is_selected("de"));
        assert_eq!(prefs.toggle("es"), Ok(false));
        assert_eq!(prefs.selected(), &["en", "fr", "de"]);
    }

    #[test]
    fn test_toggle_unsupported_leaves_selection() {
        let mut prefs = LanguagePreferences::default();
        assert_eq!(prefs.toggle("ja"), Err(LanguageError::Unsupported("ja".into())));
        assert_eq!(prefs.toggle("xx"), Err(LanguageError::Unknown("xx".into())));
        assert_eq!(prefs, LanguagePreferences::default());
    }

    #[test]
    fn test_set_detected() {
        let mut prefs = LanguagePreferences::default();
        prefs.set_detected("pt").unwrap();
        assert_eq!(prefs.detected().name, "Português");
        assert!(prefs.set_detected("xx").is_err());
    }
}

//! Localized text lookup
//!
//! Feeds declare their user-facing strings as [`Phrase`] constants and resolve
//! them through the invocation's [`Localizer`]. Lookup falls back to English,
//! then to the first translation listed.

use calfeed_domain::Language;

/// One piece of text in several languages
#[derive(Debug, Clone, Copy)]
pub struct Phrase {
    translations: &'static [(Language, &'static str)],
}

impl Phrase {
    pub const fn new(translations: &'static [(Language, &'static str)]) -> Self {
        Self { translations }
    }

    fn lookup(&self, language: Language) -> Option<&'static str> {
        self.translations.iter().find(|(lang, _)| *lang == language).map(|(_, text)| *text)
    }
}

/// Resolves phrases for one display language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Localizer {
    language: Language,
}

impl Localizer {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Localizer for a host language tag such as `zh-Hans` or `en_US`
    pub fn from_tag(tag: &str) -> Self {
        Self::new(Language::from_tag_or_default(tag))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn text(&self, phrase: &Phrase) -> &'static str {
        phrase
            .lookup(self.language)
            .or_else(|| phrase.lookup(Language::En))
            .or_else(|| phrase.translations.first().map(|(_, text)| *text))
            .unwrap_or_default()
    }
}

//! Display languages understood by the localized feeds

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Language used for titles, notes and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
    Ja,
    Ko,
    De,
    Es,
    Fr,
    Pt,
    Ru,
}

impl_domain_status_conversions!(Language {
    Zh => "zh",
    En => "en",
    Ja => "ja",
    Ko => "ko",
    De => "de",
    Es => "es",
    Fr => "fr",
    Pt => "pt",
    Ru => "ru",
});

impl Language {
    /// Resolve a BCP-47 style tag (`zh-Hans`, `en_US`, `ja`) by its primary
    /// subtag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next().unwrap_or_default();
        primary.parse().ok()
    }

    /// Like [`Language::from_tag`], falling back to the default language
    pub fn from_tag_or_default(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_default()
    }
}

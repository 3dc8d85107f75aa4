//! Quote styles, languages and the generation prompt

use calfeed_domain::Language;
use chrono::{Datelike, NaiveDate, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Inspirational,
    Philosophical,
    Poetic,
    Practical,
    Humorous,
}

impl Style {
    /// Chinese label or English name
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "励志" | "inspirational" => Some(Self::Inspirational),
            "哲理" | "philosophical" => Some(Self::Philosophical),
            "诗意" | "poetic" => Some(Self::Poetic),
            "实用" | "practical" => Some(Self::Practical),
            "幽默" | "humorous" => Some(Self::Humorous),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Inspirational => "inspirational",
            Self::Philosophical => "philosophical",
            Self::Poetic => "poetic",
            Self::Practical => "practical",
            Self::Humorous => "humorous",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Inspirational => "励志",
            Self::Philosophical => "哲理",
            Self::Poetic => "诗意",
            Self::Practical => "实用",
            Self::Humorous => "幽默",
        }
    }

    fn guide(self) -> &'static str {
        match self {
            Self::Inspirational => "要积极向上，能激发人的斗志和动力。",
            Self::Philosophical => "要有深度思考，引发人对生活和人生的思辨。",
            Self::Poetic => "要优美动人，富有诗歌般的意境和美感。",
            Self::Practical => "要贴近生活，给出具体可行的人生建议。",
            Self::Humorous => "要轻松风趣，能让人会心一笑且有所感悟。",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Inspirational => "#FF6B6B",
            Self::Philosophical => "#4ECDC4",
            Self::Poetic => "#A8E6CF",
            Self::Practical => "#FFD93D",
            Self::Humorous => "#FF8C42",
        }
    }

    fn fallback(self) -> (&'static str, &'static str) {
        match self {
            Self::Inspirational => (
                "每一天都是新的开始，相信自己的力量！",
                "Every day is a new beginning, believe in your strength!",
            ),
            Self::Philosophical => (
                "生活不在于拥有什么，而在于如何看待拥有的一切。",
                "Life is not about what you have, but how you perceive what you have.",
            ),
            Self::Poetic => (
                "时光荏苒，愿你在平凡的日子里，发现不平凡的美好。",
                "Time flows gently, may you find extraordinary beauty in ordinary days.",
            ),
            Self::Practical => (
                "今天做一件让明天的自己感谢的事情。",
                "Do something today that your future self will thank you for.",
            ),
            Self::Humorous => (
                "生活就像咖啡，苦一点没关系，加点糖就甜了！",
                "Life is like coffee, a little bitter is okay, just add some sugar!",
            ),
        }
    }
}

/// Language of the quote itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteLanguage {
    Chinese,
    English,
    Bilingual,
}

impl QuoteLanguage {
    /// Parse a setting; `自动` / `auto` yields `None` and defers to the host
    pub fn parse(value: &str) -> Option<Option<Self>> {
        match value.trim().to_ascii_lowercase().as_str() {
            "中文" | "chinese" | "zh" => Some(Some(Self::Chinese)),
            "英文" | "english" | "en" => Some(Some(Self::English)),
            "双语" | "bilingual" => Some(Some(Self::Bilingual)),
            "自动" | "auto" => Some(None),
            _ => None,
        }
    }

    /// Quote language following the host display language
    pub fn for_display(language: Language) -> Self {
        match language {
            Language::Zh => Self::Chinese,
            _ => Self::English,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Chinese => "zh",
            Self::English => "en",
            Self::Bilingual => "bilingual",
        }
    }
}

/// Quote used when generation is unavailable
pub fn fallback(style: Style, language: QuoteLanguage) -> String {
    let (zh, en) = style.fallback();
    match language {
        QuoteLanguage::Chinese => zh.to_string(),
        QuoteLanguage::English => en.to_string(),
        QuoteLanguage::Bilingual => format!("{zh} | {en}"),
    }
}

fn season(month: u32) -> &'static str {
    match month {
        3..=5 => "春天",
        6..=8 => "夏天",
        9..=11 => "秋天",
        _ => "冬天",
    }
}

fn weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "一",
        Weekday::Tue => "二",
        Weekday::Wed => "三",
        Weekday::Thu => "四",
        Weekday::Fri => "五",
        Weekday::Sat => "六",
        Weekday::Sun => "日",
    }
}

pub fn build(style: Style, language: QuoteLanguage, date: NaiveDate) -> String {
    let opening = match language {
        QuoteLanguage::Chinese => format!("请生成一条{}的智慧语录，", style.label()),
        QuoteLanguage::English => format!("Please generate an {} wisdom quote, ", style.key()),
        QuoteLanguage::Bilingual => {
            format!("请生成一条{}的智慧语录，同时提供中英文版本，", style.label())
        }
    };
    let context = format!(
        "现在是{}，星期{}，{}月{}日。",
        season(date.month()),
        weekday(date.weekday()),
        date.month(),
        date.day()
    );
    let format = match language {
        QuoteLanguage::Bilingual => "请用这种格式：中文语录 | English Quote",
        _ => "请直接返回语录内容，不要添加额外说明。语录应该简洁有力，不超过100字。",
    };

    format!("{opening}{context}{}{format}", style.guide())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_accept_chinese_and_english_names() {
        assert_eq!(Style::parse("诗意"), Some(Style::Poetic));
        assert_eq!(Style::parse(" Humorous "), Some(Style::Humorous));
        assert_eq!(Style::parse("grim"), None);
    }

    #[test]
    fn auto_language_defers_to_display_language() {
        assert_eq!(QuoteLanguage::parse("自动"), Some(None));
        assert_eq!(QuoteLanguage::for_display(Language::Zh), QuoteLanguage::Chinese);
        assert_eq!(QuoteLanguage::for_display(Language::Ja), QuoteLanguage::English);
    }

    #[test]
    fn prompt_carries_date_context() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let prompt = build(Style::Philosophical, QuoteLanguage::Chinese, date);
        assert!(prompt.starts_with("请生成一条哲理的智慧语录，"));
        assert!(prompt.contains("现在是春天，星期三，5月1日。"));
        assert!(prompt.ends_with("不超过100字。"));

        let bilingual = build(Style::Poetic, QuoteLanguage::Bilingual, date);
        assert!(bilingual.ends_with("中文语录 | English Quote"));
    }

    #[test]
    fn bilingual_fallback_joins_both() {
        assert_eq!(
            fallback(Style::Practical, QuoteLanguage::Bilingual),
            "今天做一件让明天的自己感谢的事情。 | Do something today that your future self will thank you for."
        );
    }
}

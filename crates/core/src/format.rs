//! Count formatting for display
//!
//! Play counts, star counts and the like are abbreviated before they land in
//! event notes. Each feed picks one [`CountStyle`].

/// Abbreviation rule for a numeric count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountStyle {
    /// Decimal digits, no abbreviation
    #[default]
    Plain,
    /// `k` / `万` / `亿` with one decimal, truncated
    CjkTruncated,
    /// `k` truncated like [`CountStyle::CjkTruncated`]; `万` and `亿`
    /// rounded half-up to one decimal
    CjkRounded,
}

const THOUSAND: u64 = 1_000;
const TEN_THOUSAND: u64 = 10_000;
const HUNDRED_MILLION: u64 = 100_000_000;

impl CountStyle {
    /// Format `count`; a missing count renders as `0`
    pub fn format(self, count: Option<u64>) -> String {
        let count = count.unwrap_or(0);
        match self {
            Self::Plain => count.to_string(),
            Self::CjkTruncated => abbreviate(count, false),
            Self::CjkRounded => abbreviate(count, true),
        }
    }
}

fn abbreviate(count: u64, round_large: bool) -> String {
    let (unit, suffix, round) = if count >= HUNDRED_MILLION {
        (HUNDRED_MILLION, "亿", round_large)
    } else if count >= TEN_THOUSAND {
        (TEN_THOUSAND, "万", round_large)
    } else if count >= THOUSAND {
        (THOUSAND, "k", false)
    } else {
        return count.to_string();
    };

    let scaled = u128::from(count) * 10;
    let unit = u128::from(unit);
    let tenths = if round { (scaled + unit / 2) / unit } else { scaled / unit };

    match tenths % 10 {
        0 => format!("{}{suffix}", tenths / 10),
        frac => format!("{}.{frac}{suffix}", tenths / 10),
    }
}

//! Steam Web API and store payloads

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WishlistResponse {
    #[serde(default)]
    pub response: WishlistBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct WishlistBody {
    #[serde(default)]
    pub items: Vec<WishlistItem>,
}

#[derive(Debug, Deserialize)]
pub struct WishlistItem {
    pub appid: u64,
}

/// `appdetails` answer, keyed by app id
pub type AppDetailsResponse = HashMap<String, AppDetailsEntry>;

#[derive(Debug, Deserialize)]
pub struct AppDetailsEntry {
    pub success: bool,
    pub data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
pub struct AppData {
    pub name: String,
    pub header_image: Option<String>,
    pub price_overview: Option<PriceOverview>,
}

#[derive(Debug, Deserialize)]
pub struct PriceOverview {
    pub discount_percent: u32,
    #[serde(default)]
    pub initial: u64,
    #[serde(default)]
    pub r#final: u64,
    pub initial_formatted: Option<String>,
    pub final_formatted: Option<String>,
}

impl PriceOverview {
    pub fn original_price(&self) -> String {
        formatted_or_yuan(self.initial_formatted.as_deref(), self.initial)
    }

    pub fn final_price(&self) -> String {
        formatted_or_yuan(self.final_formatted.as_deref(), self.r#final)
    }
}

fn formatted_or_yuan(formatted: Option<&str>, cents: u64) -> String {
    match formatted.filter(|text| !text.is_empty()) {
        Some(text) => text.to_string(),
        None => format!("¥{}.{:02}", cents / 100, cents % 100),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn prices_fall_back_to_cents_when_unformatted() {
        let price: PriceOverview = serde_json::from_value(json!({
            "discount_percent": 40,
            "initial": 9800,
            "final": 5880,
            "initial_formatted": "",
            "final_formatted": "¥ 58.80"
        }))
        .unwrap();

        assert_eq!(price.original_price(), "¥98.00");
        assert_eq!(price.final_price(), "¥ 58.80");
    }

    #[test]
    fn private_wishlist_has_no_items() {
        let wishlist: WishlistResponse = serde_json::from_value(json!({"response": {}})).unwrap();
        assert!(wishlist.response.items.is_empty());
    }
}

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PriceResponse {
    #[serde(default)]
    pub prices: Vec<Price>,
}

#[derive(Debug, Deserialize)]
pub struct Price {
    pub title_id: u64,
    pub sales_status: String,
    pub regular_price: Option<Amount>,
    pub discount_price: Option<Amount>,
}

impl Price {
    /// Rounded discount against the regular price, when on sale
    pub fn discount_percent(&self) -> Option<u32> {
        let regular = self.regular_price.as_ref()?.value()?;
        let discounted = self.discount_price.as_ref()?.value()?;
        if regular <= 0.0 {
            return None;
        }
        Some(((1.0 - discounted / regular) * 100.0).round().max(0.0) as u32)
    }
}

/// Price in the store's display form plus its raw number
#[derive(Debug, Deserialize)]
pub struct Amount {
    pub amount: String,
    pub raw_value: String,
}

impl Amount {
    fn value(&self) -> Option<f64> {
        self.raw_value.trim().parse().ok()
    }
}

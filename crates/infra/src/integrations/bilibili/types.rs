//! Bilibili space search payload
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct SpaceSearchResponse {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<SpaceSearchData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpaceSearchData {
    #[serde(default)]
    pub list: Option<VideoList>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoList {
    #[serde(default)]
    pub vlist: Option<Vec<Video>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Video {
    pub title: String,
    /// Publish time, epoch seconds
    pub created: i64,
    #[serde(default)]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub play: Option<u64>,
    /// Danmaku count
    #[serde(default, deserialize_with = "lenient_count")]
    pub video_review: Option<u64>,
    /// `MM:SS`
    #[serde(default)]
    pub length: Option<String>,
    pub bvid: String,
}

/// Counts arrive as numbers, numeric strings, or `"--"` when hidden
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

//! Loading host configuration from real files

use std::io::Write;

use calfeed_domain::{ErrorPolicy, Language};
use calfeed_infra::config;
use tempfile::Builder;

#[test]
fn toml_file_with_feed_sections() {
    let mut file = Builder::new().suffix(".toml").tempfile().expect("temp file");
    write!(
        file,
        r#"
language = "en"
http_timeout_secs = 12
utc_offset = "+08:00"

[openai]
model = "gpt-4o"

[feeds.bilibili_rotation]
mids = ["1", "2"]
interval_minutes = 5
on_error = "empty"

[feeds.github_user_events]
username = "octocat"
"#
    )
    .expect("write config");

    let host = config::load_from_file(file.path()).expect("config should load");

    assert_eq!(host.language, Language::En);
    assert_eq!(host.http_timeout_secs, 12);
    assert_eq!(host.openai.model.as_deref(), Some("gpt-4o"));
    assert_eq!(
        config::parse_utc_offset(host.utc_offset.as_deref().expect("offset")).expect("valid"),
        chrono::FixedOffset::east_opt(8 * 3600).expect("offset")
    );

    let rotation = host.feed("bilibili_rotation");
    assert_eq!(rotation.get_list("mids"), vec!["1", "2"]);
    assert_eq!(rotation.get_u32_or("interval_minutes", 10).expect("u32"), 5);
    assert_eq!(rotation.error_policy().expect("policy"), Some(ErrorPolicy::EmptyOnError));

    assert_eq!(host.feed("github_user_events").get_str("username").as_deref(), Some("octocat"));
    assert!(host.feed("steam_wishlist_discount").get_str("steam_id").is_none());
}

#[test]
fn json_file_is_accepted() {
    let mut file = Builder::new().suffix(".json").tempfile().expect("temp file");
    write!(file, r#"{{"language": "ja", "feeds": {{"daily_wisdom": {{"style": "诗意"}}}}}}"#)
        .expect("write config");

    let host = config::load_from_file(file.path()).expect("config should load");

    assert_eq!(host.language, Language::Ja);
    assert_eq!(host.feed("daily_wisdom").get_str("style").as_deref(), Some("诗意"));
}

#[test]
fn malformed_file_is_a_config_error() {
    let mut file = Builder::new().suffix(".toml").tempfile().expect("temp file");
    write!(file, "language = [").expect("write config");

    let err = config::load_from_file(file.path()).expect_err("should fail");
    assert!(matches!(err, calfeed_domain::CalFeedError::Config(_)));
}

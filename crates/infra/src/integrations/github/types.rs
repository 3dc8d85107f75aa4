//! GitHub REST payloads, reduced to the fields the feeds read

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub reason: String,
    pub unread: bool,
    pub updated_at: DateTime<Utc>,
    pub subject: Subject,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: Option<String>,
}

/// Entry of the public events timeline
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub actor: Actor,
    pub repo: Option<EventRepo>,
    #[serde(default)]
    pub payload: Payload,
}

impl Event {
    pub fn repo_name(&self) -> &str {
        self.repo.as_ref().map_or("", |repo| repo.name.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRepo {
    pub name: String,
}

/// Union of the payload fields used across event types
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Payload {
    pub action: Option<String>,
    pub ref_type: Option<String>,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub commits: Vec<Commit>,
    pub issue: Option<Numbered>,
    pub pull_request: Option<Numbered>,
    pub release: Option<Release>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub message: String,
}

/// Issue or pull request reference
#[derive(Debug, Clone, Deserialize)]
pub struct Numbered {
    pub number: u64,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub name: Option<String>,
}

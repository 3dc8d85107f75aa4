use async_trait::async_trait;
use calfeed_core::{
    fetch_json, CacheKey, CachePlan, CacheReadPolicy, CacheTtl, EventFeed, FeedContext,
    FeedDescriptor, Phrase, RetrySettings,
};
use calfeed_domain::{CalFeedError, CalendarEvent, ErrorPolicy, Language, PluginConfig, Result};
use chrono::Duration;
use tracing::debug;

use crate::integrations::{keep_valid, token_fingerprint};
use super::types::Notification;
use super::{classify_list, request, GITHUB_API_URL, GITHUB_RETRY};

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "github_notifications",
    summary: "Notifications of the authenticated GitHub user",
    error_policy: ErrorPolicy::Propagate,
    read_policy: CacheReadPolicy::Structured,
    retry: GITHUB_RETRY,
};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 50;
const CACHE_MINUTES: i64 = 10;
const EVENT_MINUTES: i64 = 30;
const DEFAULT_COLOR: &str = "#95A5A6";

const FAILED: Phrase = Phrase::new(&[
    (Language::Zh, "获取 GitHub 通知失败"),
    (Language::En, "Failed to fetch GitHub notifications"),
]);
const REPOSITORY: Phrase = Phrase::new(&[(Language::Zh, "仓库"), (Language::En, "Repository")]);
const SUBJECT: Phrase = Phrase::new(&[(Language::Zh, "主题"), (Language::En, "Subject")]);
const STATUS: Phrase = Phrase::new(&[(Language::Zh, "状态"), (Language::En, "Status")]);
const UNREAD: Phrase = Phrase::new(&[(Language::Zh, "未读"), (Language::En, "unread")]);
const READ: Phrase = Phrase::new(&[(Language::Zh, "已读"), (Language::En, "read")]);
const DETAILS: Phrase = Phrase::new(&[(Language::Zh, "详情"), (Language::En, "Details")]);

/// Display label, colour and description per notification reason
struct Reason {
    key: &'static str,
    label: Phrase,
    color: &'static str,
    description: Phrase,
}

const REASONS: &[Reason] = &[
    Reason {
        key: "mention",
        label: Phrase::new(&[(Language::Zh, "提及"), (Language::En, "Mention")]),
        color: "#FF6B6B",
        description: Phrase::new(&[
            (Language::Zh, "你被在评论中@提及"),
            (Language::En, "You were @mentioned in a comment"),
        ]),
    },
    Reason {
        key: "assign",
        label: Phrase::new(&[(Language::Zh, "分配"), (Language::En, "Assigned")]),
        color: "#4ECDC4",
        description: Phrase::new(&[
            (Language::Zh, "你被分配到此任务"),
            (Language::En, "You were assigned to this item"),
        ]),
    },
    Reason {
        key: "review_requested",
        label: Phrase::new(&[(Language::Zh, "审查请求"), (Language::En, "Review requested")]),
        color: "#45B7D1",
        description: Phrase::new(&[
            (Language::Zh, "请求你进行代码审查"),
            (Language::En, "Your review was requested"),
        ]),
    },
    Reason {
        key: "subscribed",
        label: Phrase::new(&[(Language::Zh, "订阅"), (Language::En, "Subscribed")]),
        color: "#96CEB4",
        description: Phrase::new(&[
            (Language::Zh, "你订阅了此项目的更新"),
            (Language::En, "You are watching this repository"),
        ]),
    },
    Reason {
        key: "team_mention",
        label: Phrase::new(&[(Language::Zh, "团队提及"), (Language::En, "Team mention")]),
        color: "#FFEAA7",
        description: Phrase::new(&[
            (Language::Zh, "你的团队被提及"),
            (Language::En, "Your team was mentioned"),
        ]),
    },
    Reason {
        key: "author",
        label: Phrase::new(&[(Language::Zh, "作者"), (Language::En, "Author")]),
        color: "#DDA0DD",
        description: Phrase::new(&[
            (Language::Zh, "你是此项目的作者"),
            (Language::En, "You created this thread"),
        ]),
    },
    Reason {
        key: "manual",
        label: Phrase::new(&[(Language::Zh, "手动订阅"), (Language::En, "Manual")]),
        color: "#98D8C8",
        description: Phrase::new(&[
            (Language::Zh, "你手动订阅了此通知"),
            (Language::En, "You subscribed to this thread"),
        ]),
    },
    Reason {
        key: "comment",
        label: Phrase::new(&[(Language::Zh, "评论"), (Language::En, "Comment")]),
        color: "#FFB347",
        description: Phrase::new(&[(Language::Zh, "有新的评论"), (Language::En, "New comment")]),
    },
    Reason {
        key: "pull_request",
        label: Phrase::new(&[(Language::Zh, "PR"), (Language::En, "PR")]),
        color: "#87CEEB",
        description: Phrase::new(&[
            (Language::Zh, "Pull Request 有更新"),
            (Language::En, "Pull request updated"),
        ]),
    },
    Reason {
        key: "issue",
        label: Phrase::new(&[(Language::Zh, "Issue"), (Language::En, "Issue")]),
        color: "#F7DC6F",
        description: Phrase::new(&[(Language::Zh, "Issue 有更新"), (Language::En, "Issue updated")]),
    },
    Reason {
        key: "state_change",
        label: Phrase::new(&[(Language::Zh, "状态变更"), (Language::En, "State change")]),
        color: "#FF8C94",
        description: Phrase::new(&[
            (Language::Zh, "Issue或PR状态发生变更"),
            (Language::En, "Issue or pull request state changed"),
        ]),
    },
];

fn reason(key: &str) -> Option<&'static Reason> {
    REASONS.iter().find(|reason| reason.key == key)
}

pub struct NotificationSettings {
    token: String,
    limit: u32,
    participating: bool,
    show_all: bool,
    types: Vec<String>,
}

impl NotificationSettings {
    fn url(&self, api_base: &str) -> String {
        let mut url = format!("{api_base}/notifications?per_page={}", self.limit);
        if self.participating && !self.show_all {
            url.push_str("&participating=true");
        }
        if self.show_all {
            url.push_str("&all=true");
        }
        url
    }

    fn wants(&self, reason: &str) -> bool {
        self.types.is_empty() || self.types.iter().any(|kind| kind == reason)
    }
}

pub struct GithubNotifications {
    api_base: String,
    retry: RetrySettings,
}

impl Default for GithubNotifications {
    fn default() -> Self {
        Self { api_base: GITHUB_API_URL.to_string(), retry: DESCRIPTOR.retry }
    }
}

impl GithubNotifications {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl EventFeed for GithubNotifications {
    type Settings = NotificationSettings;

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, config: &PluginConfig, _ctx: &FeedContext) -> Result<NotificationSettings> {
        Ok(NotificationSettings {
            token: config.require_str("token")?,
            limit: config.get_u32_or("limit", DEFAULT_LIMIT)?.clamp(1, MAX_LIMIT),
            participating: config.get_bool_or("show_participating", false)?,
            show_all: config.get_bool_or("show_all", true)?,
            types: config.get_list("notification_types"),
        })
    }

    fn cache_plan(&self, settings: &NotificationSettings, _ctx: &FeedContext) -> Option<CachePlan> {
        let scope = if settings.participating { "participating" } else { "all" };
        let key = CacheKey::builder(DESCRIPTOR.id)
            .part("scope", scope)
            .part("limit", settings.limit)
            .part("show_all", settings.show_all)
            .part("types", settings.types.join("+"))
            .part("token", token_fingerprint(&settings.token))
            .build();
        Some(CachePlan::new(key, CacheTtl::Minutes(CACHE_MINUTES)))
    }

    async fn fetch(
        &self,
        settings: &NotificationSettings,
        ctx: &FeedContext,
    ) -> Result<Vec<CalendarEvent>> {
        let request = request(settings.url(&self.api_base), Some(&settings.token));
        let notifications: Vec<Notification> =
            fetch_json(ctx.http(), &request, &ctx.fetch_policy(self.retry), &classify_list).await?;
        debug!(count = notifications.len(), "github notifications fetched");

        let mapped = notifications
            .into_iter()
            .filter(|notification| settings.wants(&notification.reason))
            .map(|notification| map_notification(ctx, notification));
        Ok(keep_valid(DESCRIPTOR.id, mapped))
    }

    fn map_error(&self, err: CalFeedError, ctx: &FeedContext) -> CalFeedError {
        let prefix = ctx.text(&FAILED);
        err.map_message(|message| format!("{prefix}: {message}"))
    }
}

fn map_notification(ctx: &FeedContext, notification: Notification) -> Result<CalendarEvent> {
    let reason = reason(&notification.reason);
    let label = reason.map_or(notification.reason.as_str(), |reason| ctx.text(&reason.label));
    let title = format!(
        "[{label}] {}: {}",
        notification.repository.name, notification.subject.title
    );

    let mut notes = vec![
        format!("{}: {}", ctx.text(&REPOSITORY), notification.repository.full_name),
        format!("{}: {}", ctx.text(&SUBJECT), notification.subject.kind),
        format!(
            "{}: {}",
            ctx.text(&STATUS),
            ctx.text(if notification.unread { &UNREAD } else { &READ })
        ),
    ];
    if let Some(reason) = reason {
        notes.push(format!("{}: {}", ctx.text(&DETAILS), ctx.text(&reason.description)));
    }

    let start = notification.updated_at;
    let end = start + Duration::minutes(EVENT_MINUTES);

    CalendarEvent::builder(title)
        .start(ctx.format_date(start.timestamp()))
        .end(ctx.format_date(end.timestamp()))
        .color(reason.map_or(DEFAULT_COLOR, |reason| reason.color))
        .notes(notes.join("\n"))
        .href(Some(web_url(&notification)))
        .point_in_time(true)
        .build()
}

/// Browser URL for the notification subject, else its repository
fn web_url(notification: &Notification) -> String {
    if let Some(url) = &notification.subject.url {
        return url
            .replace("https://api.github.com/repos/", "https://github.com/")
            .replace("/pulls/", "/pull/");
    }
    notification
        .repository
        .html_url
        .clone()
        .unwrap_or_else(|| format!("https://github.com/{}", notification.repository.full_name))
}

#[cfg(test)]
mod tests {
    use calfeed_core::EventSource;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::integrations::test_support;

    fn notifications() -> serde_json::Value {
        json!([
            {
                "reason": "review_requested",
                "unread": true,
                "updated_at": "2024-05-01T08:00:00Z",
                "subject": {
                    "title": "Add cache",
                    "type": "PullRequest",
                    "url": "https://api.github.com/repos/acme/widgets/pulls/7"
                },
                "repository": {
                    "name": "widgets",
                    "full_name": "acme/widgets",
                    "html_url": "https://github.com/acme/widgets"
                }
            },
            {
                "reason": "ci_activity",
                "unread": false,
                "updated_at": "2024-05-01T07:00:00Z",
                "subject": {"title": "Build failed", "type": "CheckSuite", "url": null},
                "repository": {"name": "gears", "full_name": "acme/gears"}
            }
        ])
    }

    #[tokio::test]
    async fn maps_notifications_with_token_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notifications"))
            .and(query_param("per_page", "5"))
            .and(query_param("all", "true"))
            .and(header("Authorization", "token ghp_abc"))
            .and(header("Accept", "application/vnd.github.v3+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(notifications()))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = test_support::context(&test_support::clock());
        let feed = GithubNotifications::default().with_api_base(server.uri());
        let config = PluginConfig::new().with("token", "ghp_abc").with("limit", 5);

        let events = feed.fetch_events(&ctx, &config).await.unwrap();
        assert_eq!(events.len(), 2);

        let review = &events[0];
        assert_eq!(review.title(), "[审查请求] widgets: Add cache");
        assert_eq!(review.start_date(), "2024-05-01 08:00");
        assert_eq!(review.end_date(), "2024-05-01 08:30");
        assert_eq!(review.color(), "#45B7D1");
        assert_eq!(review.href(), Some("https://github.com/acme/widgets/pull/7"));
        assert_eq!(
            review.notes(),
            "仓库: acme/widgets\n主题: PullRequest\n状态: 未读\n详情: 请求你进行代码审查"
        );

        let unknown = &events[1];
        assert_eq!(unknown.title(), "[ci_activity] gears: Build failed");
        assert_eq!(unknown.color(), "#95A5A6");
        assert_eq!(unknown.href(), Some("https://github.com/acme/gears"));
        assert!(unknown.notes().ends_with("状态: 已读"));
    }

    #[tokio::test]
    async fn filters_by_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(notifications()))
            .mount(&server)
            .await;

        let ctx = test_support::context(&test_support::clock());
        let config = PluginConfig::new()
            .with("token", "ghp_abc")
            .with("notification_types", "mention, review_requested");

        let events = GithubNotifications::default()
            .with_api_base(server.uri())
            .fetch_events(&ctx, &config)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert!(events[0].title().contains("Add cache"));
    }

    #[test]
    fn participating_only_when_not_showing_all() {
        let settings = NotificationSettings {
            token: "t".into(),
            limit: 20,
            participating: true,
            show_all: false,
            types: Vec::new(),
        };
        assert_eq!(
            settings.url("https://api.github.com"),
            "https://api.github.com/notifications?per_page=20&participating=true"
        );
    }

    #[tokio::test]
    async fn api_errors_are_wrapped_in_a_localized_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Bad credentials"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ctx = test_support::context(&test_support::clock());
        let err = GithubNotifications::default()
            .with_api_base(server.uri())
            .fetch_events(&ctx, &PluginConfig::new().with("token", "bad"))
            .await
            .unwrap_err();

        assert!(matches!(&err, CalFeedError::Upstream(_)));
        assert!(err.message().starts_with("获取 GitHub 通知失败: "));
        assert!(err.message().contains("Bad credentials"));
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        let ctx = test_support::context(&test_support::clock());
        let err = GithubNotifications::default()
            .fetch_events(&ctx, &PluginConfig::new().with("token", "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, CalFeedError::Config(_)));
    }
}

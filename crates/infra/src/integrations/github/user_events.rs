use async_trait::async_trait;
use calfeed_core::{
    fetch_json, CacheKey, CachePlan, CacheReadPolicy, CacheTtl, EventFeed, FeedContext,
    FeedDescriptor, Phrase, RetrySettings,
};
use calfeed_domain::{CalFeedError, CalendarEvent, ErrorPolicy, Language, PluginConfig, Result};
use tracing::debug;

use crate::integrations::keep_valid;
use super::types::{Event, Numbered};
use super::{classify_list, request, GITHUB_API_URL, GITHUB_RETRY};

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "github_user_events",
    summary: "Public activity of one GitHub user",
    error_policy: ErrorPolicy::Propagate,
    read_policy: CacheReadPolicy::Structured,
    retry: GITHUB_RETRY,
};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;
const CACHE_MINUTES: i64 = 30;

macro_rules! phrase {
    ($zh:expr, $en:expr, $ja:expr, $ko:expr, $de:expr, $es:expr, $fr:expr, $pt:expr, $ru:expr) => {
        Phrase::new(&[
            (Language::Zh, $zh),
            (Language::En, $en),
            (Language::Ja, $ja),
            (Language::Ko, $ko),
            (Language::De, $de),
            (Language::Es, $es),
            (Language::Fr, $fr),
            (Language::Pt, $pt),
            (Language::Ru, $ru),
        ])
    };
}

const USERNAME_REQUIRED: Phrase = phrase!(
    "请配置 username 参数",
    "Please configure username parameter",
    "username パラメータを設定してください",
    "username 매개변수를 설정하세요",
    "Bitte konfigurieren Sie den username-Parameter",
    "Por favor, configure el parámetro username",
    "Veuillez configurer le paramètre username",
    "Por favor, configure o parâmetro username",
    "Пожалуйста, настройте параметр username"
);
const FAILED: Phrase = phrase!(
    "GitHub 个人事件获取失败",
    "Failed to fetch GitHub user events",
    "GitHub ユーザーイベントの取得に失敗しました",
    "GitHub 사용자 이벤트를 가져오는 데 실패했습니다",
    "GitHub-Benutzerereignisse konnten nicht abgerufen werden",
    "Error al obtener eventos de usuario de GitHub",
    "Échec de la récupération des événements utilisateur GitHub",
    "Falha ao buscar eventos de usuário do GitHub",
    "Не удалось получить события пользователя GitHub"
);
const IN: Phrase = phrase!("在", "in", "→", "→", "in", "en", "dans", "em", "в");
const PUSHED: Phrase = phrase!(
    "推送了", "pushed", "プッシュしました", "푸시했습니다", "hat gepusht", "empujó", "a poussé",
    "empurrou", "отправил"
);
const COMMITS_TO: Phrase = phrase!(
    "个提交到", "commits to", "コミット →", "커밋 →", "Commits nach", "commits a", "commits vers",
    "commits para", "коммитов в"
);
const CREATED_REPOSITORY: Phrase = phrase!(
    "创建了仓库",
    "created repository",
    "リポジトリを作成",
    "저장소를 생성했습니다",
    "hat Repository erstellt",
    "creó repositorio",
    "a créé le dépôt",
    "criou repositório",
    "создал репозиторий"
);
const CREATED_BRANCH: Phrase = phrase!(
    "创建了分支",
    "created branch",
    "ブランチを作成",
    "브랜치를 생성했습니다",
    "hat Branch erstellt",
    "creó rama",
    "a créé la branche",
    "criou branch",
    "создал ветку"
);
const CREATED_TAG: Phrase = phrase!(
    "创建了标签",
    "created tag",
    "タグを作成",
    "태그를 생성했습니다",
    "hat Tag erstellt",
    "creó etiqueta",
    "a créé le tag",
    "criou tag",
    "создал тег"
);
const CREATED: Phrase = phrase!(
    "创建了", "created", "作成", "생성했습니다", "hat erstellt", "creó", "a créé", "criou", "создал"
);
const DELETED: Phrase = phrase!(
    "删除了", "deleted", "削除しました", "삭제했습니다", "hat gelöscht", "eliminó", "a supprimé",
    "excluiu", "удалил"
);
const FORKED: Phrase = phrase!(
    "fork 了", "forked", "フォークしました", "포크했습니다", "hat geforkt", "bifurcó", "a forké",
    "bifurcou", "форкнул"
);
const STARRED: Phrase = phrase!(
    "star 了",
    "starred",
    "スターしました",
    "스타했습니다",
    "hat Stern gegeben",
    "destacó",
    "a étoilé",
    "favoritou",
    "отметил звездой"
);
const COMMENTED_ON: Phrase = phrase!(
    "评论了",
    "commented on",
    "コメントしました",
    "댓글을 달았습니다",
    "hat kommentiert",
    "comentó",
    "a commenté",
    "comentou",
    "прокомментировал"
);
const REVIEWED: Phrase = phrase!(
    "审查了", "reviewed", "レビューしました", "검토했습니다", "hat überprüft", "revisó",
    "a examiné", "revisou", "просмотрел"
);
const RELEASED: Phrase = phrase!(
    "发布了", "released", "リリースしました", "릴리스했습니다", "hat veröffentlicht", "lanzó",
    "a publié", "lançou", "выпустил"
);
const MADE_PUBLIC: Phrase = phrase!(
    "公开了仓库",
    "made public",
    "公開しました",
    "공개했습니다",
    "hat öffentlich gemacht",
    "hizo público",
    "a rendu public",
    "tornou público",
    "сделал публичным"
);
const ADDED_COLLABORATOR: Phrase = phrase!(
    "添加了协作者到",
    "added collaborator to",
    "コラボレーターを追加",
    "협력자를 추가했습니다",
    "hat Mitarbeiter hinzugefügt zu",
    "agregó colaborador a",
    "a ajouté un collaborateur à",
    "adicionou colaborador a",
    "добавил соавтора в"
);
const ACTIVITY: Phrase = phrase!(
    "GitHub 活动",
    "GitHub Activity",
    "GitHub アクティビティ",
    "GitHub 활동",
    "GitHub-Aktivität",
    "Actividad de GitHub",
    "Activité GitHub",
    "Atividade do GitHub",
    "Активность GitHub"
);
const REPOSITORY: Phrase = phrase!(
    "仓库", "Repository", "リポジトリ", "저장소", "Repository", "Repositorio", "Dépôt",
    "Repositório", "Репозиторий"
);
const LATEST_COMMIT: Phrase = phrase!(
    "最新提交",
    "Latest commit",
    "最新のコミット",
    "최신 커밋",
    "Neuester Commit",
    "Último commit",
    "Dernier commit",
    "Último commit",
    "Последний коммит"
);
const TITLE: Phrase =
    phrase!("标题", "Title", "タイトル", "제목", "Titel", "Título", "Titre", "Título", "Заголовок");
const VERSION: Phrase = phrase!(
    "版本", "Version", "バージョン", "버전", "Version", "Versión", "Version", "Versão", "Версия"
);
const NAME: Phrase =
    phrase!("名称", "Name", "名前", "이름", "Name", "Nombre", "Nom", "Nome", "Название");

pub struct UserEventSettings {
    username: String,
    token: Option<String>,
    limit: u32,
}

pub struct GithubUserEvents {
    api_base: String,
    retry: RetrySettings,
}

impl Default for GithubUserEvents {
    fn default() -> Self {
        Self { api_base: GITHUB_API_URL.to_string(), retry: DESCRIPTOR.retry }
    }
}

impl GithubUserEvents {
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
impl EventFeed for GithubUserEvents {
    type Settings = UserEventSettings;

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, config: &PluginConfig, ctx: &FeedContext) -> Result<UserEventSettings> {
        let username = config
            .get_str("username")
            .ok_or_else(|| CalFeedError::Config(ctx.text(&USERNAME_REQUIRED).to_string()))?;

        Ok(UserEventSettings {
            username,
            token: config.get_str("token"),
            limit: config.get_u32_or("limit", DEFAULT_LIMIT)?.clamp(1, MAX_LIMIT),
        })
    }

    fn cache_plan(&self, settings: &UserEventSettings, _ctx: &FeedContext) -> Option<CachePlan> {
        let key = CacheKey::builder(DESCRIPTOR.id)
            .part("user", &settings.username)
            .part("limit", settings.limit)
            .build();
        Some(CachePlan::new(key, CacheTtl::Minutes(CACHE_MINUTES)))
    }

    async fn fetch(
        &self,
        settings: &UserEventSettings,
        ctx: &FeedContext,
    ) -> Result<Vec<CalendarEvent>> {
        let url = format!(
            "{}/users/{}/events/public?per_page={}",
            self.api_base,
            urlencoding::encode(&settings.username),
            settings.limit
        );
        let request = request(url, settings.token.as_deref());
        let events: Vec<Event> =
            fetch_json(ctx.http(), &request, &ctx.fetch_policy(self.retry), &classify_list).await?;
        debug!(user = %settings.username, count = events.len(), "github user events fetched");

        Ok(keep_valid(DESCRIPTOR.id, events.into_iter().map(|event| map_event(ctx, event))))
    }

    fn map_error(&self, err: CalFeedError, ctx: &FeedContext) -> CalFeedError {
        let prefix = ctx.text(&FAILED);
        err.map_message(|message| format!("{prefix}: {message}"))
    }
}

fn map_event(ctx: &FeedContext, event: Event) -> Result<CalendarEvent> {
    let published = ctx.format_date(event.created_at.timestamp());

    CalendarEvent::builder(title(ctx, &event))
        .start(published.clone())
        .end(published)
        .color(color(&event.kind))
        .notes(notes(ctx, &event))
        .icon(event.actor.avatar_url.clone())
        .href(Some(web_url(&event)))
        .point_in_time(true)
        .build()
}

fn title(ctx: &FeedContext, event: &Event) -> String {
    let actor = &event.actor.login;
    let repo = event.repo_name();
    let payload = &event.payload;
    let git_ref = payload.git_ref.as_deref().unwrap_or_default();
    let ref_type = payload.ref_type.as_deref().unwrap_or_default();
    let action = payload.action.as_deref().unwrap_or_default();
    let number = |item: &Option<Numbered>| {
        item.as_ref().map(|item| item.number.to_string()).unwrap_or_default()
    };
    let in_repo = format!("{} {repo}", ctx.text(&IN));

    match event.kind.as_str() {
        "PushEvent" => format!(
            "{actor} {} {} {} {repo}",
            ctx.text(&PUSHED),
            payload.commits.len(),
            ctx.text(&COMMITS_TO)
        ),
        "CreateEvent" => match ref_type {
            "repository" => format!("{actor} {} {repo}", ctx.text(&CREATED_REPOSITORY)),
            "branch" => format!("{actor} {} {git_ref} {in_repo}", ctx.text(&CREATED_BRANCH)),
            "tag" => format!("{actor} {} {git_ref} {in_repo}", ctx.text(&CREATED_TAG)),
            other => format!("{actor} {} {other} {in_repo}", ctx.text(&CREATED)),
        },
        "DeleteEvent" => format!("{actor} {} {ref_type} {git_ref} {in_repo}", ctx.text(&DELETED)),
        "ForkEvent" => format!("{actor} {} {repo}", ctx.text(&FORKED)),
        "WatchEvent" => format!("{actor} {} {repo}", ctx.text(&STARRED)),
        "IssuesEvent" => format!("{actor} {action} issue #{} {in_repo}", number(&payload.issue)),
        "IssueCommentEvent" => format!(
            "{actor} {} issue #{} {in_repo}",
            ctx.text(&COMMENTED_ON),
            number(&payload.issue)
        ),
        "PullRequestEvent" => {
            format!("{actor} {action} PR #{} {in_repo}", number(&payload.pull_request))
        }
        "PullRequestReviewEvent" => format!(
            "{actor} {} PR #{} {in_repo}",
            ctx.text(&REVIEWED),
            number(&payload.pull_request)
        ),
        "ReleaseEvent" => {
            let tag = payload.release.as_ref().map_or("", |release| release.tag_name.as_str());
            format!("{actor} {} {tag} {in_repo}", ctx.text(&RELEASED))
        }
        "PublicEvent" => format!("{actor} {} {repo}", ctx.text(&MADE_PUBLIC)),
        "MemberEvent" => format!("{actor} {} {repo}", ctx.text(&ADDED_COLLABORATOR)),
        other => format!("{actor} {} {in_repo}", other.replace("Event", "")),
    }
}

fn color(kind: &str) -> &'static str {
    match kind {
        "PushEvent" | "MemberEvent" => "#4285f4",
        "CreateEvent" | "ReleaseEvent" => "#ff6d01",
        "DeleteEvent" | "IssuesEvent" | "IssueCommentEvent" => "#ea4335",
        "ForkEvent" | "PublicEvent" => "#34a853",
        "WatchEvent" => "#f1c232",
        "PullRequestEvent" | "PullRequestReviewEvent" => "#9b59b6",
        _ => "#666666",
    }
}

fn notes(ctx: &FeedContext, event: &Event) -> String {
    let mut lines = vec![ctx.text(&ACTIVITY).to_string()];
    if let Some(repo) = &event.repo {
        lines.push(format!("{}: {}", ctx.text(&REPOSITORY), repo.name));
    }

    let payload = &event.payload;
    match event.kind.as_str() {
        "PushEvent" => {
            if let Some(commit) = payload.commits.first() {
                lines.push(format!("{}: {}", ctx.text(&LATEST_COMMIT), commit.message));
            }
        }
        "IssuesEvent" | "PullRequestEvent" => {
            let title = payload
                .issue
                .as_ref()
                .or(payload.pull_request.as_ref())
                .and_then(|item| item.title.as_deref());
            if let Some(title) = title {
                lines.push(format!("{}: {title}", ctx.text(&TITLE)));
            }
        }
        "ReleaseEvent" => {
            if let Some(release) = &payload.release {
                lines.push(format!("{}: {}", ctx.text(&VERSION), release.tag_name));
                if let Some(name) = release.name.as_deref().filter(|name| !name.is_empty()) {
                    lines.push(format!("{}: {name}", ctx.text(&NAME)));
                }
            }
        }
        _ => {}
    }

    lines.join("\n")
}

fn web_url(event: &Event) -> String {
    let Some(repo) = &event.repo else {
        return format!("https://github.com/{}", event.actor.login);
    };
    let base = format!("https://github.com/{}", repo.name);
    let payload = &event.payload;

    let specific = match event.kind.as_str() {
        "IssuesEvent" => payload.issue.as_ref().map(|issue| format!("{base}/issues/{}", issue.number)),
        "PullRequestEvent" => {
            payload.pull_request.as_ref().map(|pr| format!("{base}/pull/{}", pr.number))
        }
        "ReleaseEvent" => payload
            .release
            .as_ref()
            .map(|release| format!("{base}/releases/tag/{}", release.tag_name)),
        "CreateEvent" => match (payload.ref_type.as_deref(), payload.git_ref.as_deref()) {
            (Some("branch"), Some(git_ref)) => Some(format!("{base}/tree/{git_ref}")),
            (Some("tag"), Some(git_ref)) => Some(format!("{base}/releases/tag/{git_ref}")),
            _ => None,
        },
        _ => None,
    };

    specific.unwrap_or(base)
}

//! CLI front-end exercising `blog-content-core`'s `TaskRunner` end to end
//! against real LLM providers, with a stub browser-automation collaborator
//! (browser automation for discovery/login/publishing is out of the core's
//! scope, per the library's own design).

mod browser;

use std::sync::Arc;

use anyhow::Context;
use blog_content_core::config::Config;
use blog_content_core::fetch::CompetitorFetcher;
use blog_content_core::llm::gateway::ProviderGateway;
use blog_content_core::model::{ContentKind, KeywordInput, ReviewSubtype, SessionState, Tone, WritingSettings};
use blog_content_core::runner::{TaskEvent, TaskRunner};
use clap::Parser;
use console::style;
use dialoguer::{Input, Select};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use browser::{ReqwestFetcher, UnavailableBrowserSession};

/// Generates one long-form Korean blog post from a keyword.
#[derive(Parser)]
#[command(name = "blog-content")]
#[command(version)]
#[command(about = "Generate a long-form Korean blog post from a keyword")]
struct Cli {
    /// Path to config.toml (provider API keys, per-role model selection)
    #[arg(short = 'c', long, default_value = "~/.blog-content/config.toml")]
    config: String,

    /// Main keyword driving title ideation and competitor discovery
    #[arg(short, long)]
    keyword: String,

    /// Comma-separated sub-keyword hints
    #[arg(long, value_delimiter = ',')]
    sub_keyword: Vec<String>,

    /// Content kind
    #[arg(long, value_enum, default_value_t = ContentKindArg::Guide)]
    content_kind: ContentKindArg,

    /// Review disclosure subtype, only meaningful with --content-kind review
    #[arg(long, value_enum)]
    review_subtype: Option<ReviewSubtypeArg>,

    /// Sentence-ending / phrasing register
    #[arg(long, value_enum, default_value_t = ToneArg::PoliteFormal)]
    tone: ToneArg,

    /// Free-text blogger identity ("반려동물 훈련사 5년차" etc.)
    #[arg(long)]
    blogger_identity: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ContentKindArg {
    Review,
    Guide,
    Comparison,
}

impl From<ContentKindArg> for ContentKind {
    fn from(value: ContentKindArg) -> Self {
        match value {
            ContentKindArg::Review => ContentKind::Review,
            ContentKindArg::Guide => ContentKind::Guide,
            ContentKindArg::Comparison => ContentKind::Comparison,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ReviewSubtypeArg {
    OwnPurchase,
    Sponsored,
    Trial,
    Rental,
}

impl From<ReviewSubtypeArg> for ReviewSubtype {
    fn from(value: ReviewSubtypeArg) -> Self {
        match value {
            ReviewSubtypeArg::OwnPurchase => ReviewSubtype::OwnPurchase,
            ReviewSubtypeArg::Sponsored => ReviewSubtype::Sponsored,
            ReviewSubtypeArg::Trial => ReviewSubtype::Trial,
            ReviewSubtypeArg::Rental => ReviewSubtype::Rental,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ToneArg {
    CasualInformal,
    PoliteFormal,
    FriendlyPolite,
}

impl From<ToneArg> for Tone {
    fn from(value: ToneArg) -> Self {
        match value {
            ToneArg::CasualInformal => Tone::CasualInformal,
            ToneArg::PoliteFormal => Tone::PoliteFormal,
            ToneArg::FriendlyPolite => Tone::FriendlyPolite,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("blog_content_cli=debug,blog_content_core=debug,info")
    } else {
        EnvFilter::new("blog_content_cli=info,blog_content_core=info,warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(cli.verbose).compact().init();

    let config = Config::load(Some(&cli.config)).map_err(|e| {
        anyhow::anyhow!(
            "설정을 불러올 수 없습니다: {e}\n힌트: {} 위치에 provider API 키를 담은 config.toml을 만들어주세요.",
            cli.config
        )
    })?;

    let settings = WritingSettings {
        content_kind: cli.content_kind.into(),
        review_subtype: cli.review_subtype.map(Into::into),
        tone: cli.tone.into(),
        blogger_identity: cli.blogger_identity,
    };
    let keyword_input = KeywordInput { main_keyword: cli.keyword, sub_keywords: cli.sub_keyword };
    let mut session = SessionState::new(settings, keyword_input);

    let gateway = ProviderGateway::new(config.api_keys, config.providers);
    let fetcher = CompetitorFetcher::new(UnavailableBrowserSession, ReqwestFetcher::new());
    let (runner, mut events) = TaskRunner::new(gateway, fetcher);
    let runner = Arc::new(runner);

    let cancel_runner = runner.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", style("취소 요청을 받았습니다, 진행 중인 단계가 끝나는 대로 중단합니다...").yellow());
            cancel_runner.cancel();
        }
    });

    let ok = runner.run_title_ideation(&mut session).await;
    drain_events(&mut events);
    if !ok {
        anyhow::bail!("제목 생성에 실패했습니다");
    }

    let titles: Vec<String> = session
        .title_candidates
        .iter()
        .map(|c| format!("{} ({})", c.title, c.search_query))
        .collect();
    let chosen_index = Select::new()
        .with_prompt("작성할 제목을 선택하세요")
        .items(&titles)
        .default(0)
        .interact()
        .context("제목 선택에 실패했습니다")?;
    let candidate = session.title_candidates[chosen_index].clone();

    let override_query: String = Input::new()
        .with_prompt("검색어를 바꾸시겠습니까? (비워두면 그대로 사용)")
        .allow_empty(true)
        .interact_text()
        .context("검색어 입력에 실패했습니다")?;
    let search_query_override = if override_query.trim().is_empty() { None } else { Some(override_query) };

    runner.select_title_and_run_to_completion(&mut session, candidate, search_query_override).await;
    drain_events(&mut events);

    match session.article {
        Some(article) => {
            println!("\n{}\n{}", style("완성된 글").bold().green(), article.text);
            Ok(())
        }
        None => anyhow::bail!("파이프라인이 완료되지 않았습니다"),
    }
}

fn drain_events(events: &mut mpsc::UnboundedReceiver<TaskEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            TaskEvent::Progress { stage_label, message } => {
                println!("{} {}", style(format!("[{stage_label}]")).cyan(), message);
            }
            TaskEvent::StageArtifact { name, payload } => {
                tracing::debug!(name, payload_len = payload.len(), "stage artifact received");
            }
            TaskEvent::Completed { .. } => {
                println!("{}", style("파이프라인이 완료되었습니다").green());
            }
            TaskEvent::Cancelled => {
                println!("{}", style("작업이 취소되었습니다").yellow());
            }
            TaskEvent::Error { kind, message } => {
                eprintln!("{} {message}", style(format!("[{kind}]")).red());
            }
        }
    }
}

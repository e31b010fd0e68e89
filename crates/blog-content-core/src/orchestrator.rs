//! `StageOrchestrator` (§4.5): executes the pipeline stage by stage,
//! carrying `SessionState` forward, enforcing preconditions, and emitting
//! progress events through the `on_progress` callback `TaskRunner` wires in.
//!
//! Each stage method: (a) validates preconditions, (b) builds a prompt via
//! `prompts`, (c) calls `ProviderGateway` with the role-appropriate
//! selection, (d) parses the response under the declared format, (e)
//! writes results back into `SessionState`, (f) reports progress.

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, ValidationError};
use crate::fetch::{BrowserSession, CompetitorFetcher, HtmlFetcher};
use crate::llm::gateway::{Messages, ProviderGateway};
use crate::llm::GenerationParams;
use crate::model::{
    CompetitorRef, ProviderRole, SelectedTitle, SessionState, Stage, SummaryArtifact,
    TitleCandidate,
};
use crate::prompts::{self, ResponseFormat};

/// Fallback curation size when the curation call returns zero items.
const CURATION_FALLBACK_N: usize = 10;

#[derive(Debug, Deserialize)]
struct TitleIdeationResponse {
    titles_with_search: Vec<TitleCandidate>,
}

#[derive(Debug, Deserialize)]
struct CuratedTitleEntry {
    #[allow(dead_code)]
    rank: u32,
    original_index: usize,
    #[allow(dead_code)]
    title: String,
    #[allow(dead_code)]
    relevance_reason: String,
}

#[derive(Debug, Deserialize)]
struct CurationResponse {
    selected_titles: Vec<CuratedTitleEntry>,
}

pub struct StageOrchestrator<B: BrowserSession, H: HtmlFetcher> {
    gateway: ProviderGateway,
    fetcher: CompetitorFetcher<B, H>,
    cancel: CancellationToken,
}

impl<B: BrowserSession, H: HtmlFetcher> StageOrchestrator<B, H> {
    pub fn new(gateway: ProviderGateway, fetcher: CompetitorFetcher<B, H>, cancel: CancellationToken) -> Self {
        Self { gateway, fetcher, cancel }
    }

    fn check_cancelled(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn require_stage(session: &SessionState, expected: Stage, operation: &str) -> Result<(), PipelineError> {
        if session.stage != expected {
            return Err(PipelineError::Validation(ValidationError::WrongStage { operation: operation.into() }));
        }
        Ok(())
    }

    /// Stage T: title ideation. `INIT -> TITLES_READY`.
    #[tracing::instrument(skip(self, session))]
    pub async fn run_title_ideation(&self, session: &mut SessionState) -> Result<(), PipelineError> {
        Self::require_stage(session, Stage::Init, "타이틀 생성")?;
        session.keyword_input.validate()?;
        self.check_cancelled()?;

        let (prompt, format) = prompts::build_title_prompt(&session.settings, &session.keyword_input);
        debug_assert_eq!(format, ResponseFormat::Json);

        let response = self
            .gateway
            .generate_text(
                ProviderRole::SummaryIdeation,
                Messages { system: String::new(), user: prompt },
                GenerationParams::default(),
            )
            .await
            .map_err(PipelineError::Provider)?;

        let cleaned = prompts::parsing::strip_markdown_fence(&response.text);
        let titles = match serde_json::from_str::<TitleIdeationResponse>(&cleaned) {
            Ok(parsed) => parsed.titles_with_search.into_iter().take(10).collect(),
            Err(_) => prompts::parsing::extract_titles_heuristically(&response.text),
        };

        session.title_candidates = titles;
        session.stage = Stage::TitlesReady;
        Ok(())
    }

    /// `TITLES_READY -> TITLE_SELECTED`. Not a network call; pure state
    /// transition per the user's pick and optional query override.
    pub fn set_selected_title(
        &self,
        session: &mut SessionState,
        candidate: TitleCandidate,
        search_query_override: Option<String>,
    ) -> Result<(), PipelineError> {
        Self::require_stage(session, Stage::TitlesReady, "제목 선택")?;
        session.selected_title = Some(SelectedTitle { candidate, search_query_override });
        session.stage = Stage::TitleSelected;
        Ok(())
    }

    /// Stage D part 1: discovery. `TITLE_SELECTED -> COMPETITORS_DISCOVERED`.
    #[tracing::instrument(skip(self, session))]
    pub async fn run_competitor_discovery(&self, session: &mut SessionState) -> Result<(), PipelineError> {
        Self::require_stage(session, Stage::TitleSelected, "경쟁사 검색")?;
        if session.selected_title.is_none() {
            return Err(PipelineError::Validation(ValidationError::MissingField { field: "선택된 제목".into() }));
        }
        self.check_cancelled()?;

        let query = session.effective_search_query().to_string();
        let refs = self
            .fetcher
            .discover(&query)
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        session.competitor_refs = refs;
        session.stage = Stage::CompetitorsDiscovered;
        Ok(())
    }

    /// Stage D part 2: AI curation of discovered titles.
    /// `COMPETITORS_DISCOVERED -> COMPETITORS_CURATED`. Falls back to
    /// first-N-by-rank (N=10) when curation returns zero items.
    #[tracing::instrument(skip(self, session))]
    pub async fn run_competitor_curation(&self, session: &mut SessionState) -> Result<(), PipelineError> {
        Self::require_stage(session, Stage::CompetitorsDiscovered, "경쟁사 선별")?;
        self.check_cancelled()?;

        let selected = session
            .selected_title
            .clone()
            .ok_or_else(|| PipelineError::Validation(ValidationError::MissingField { field: "선택된 제목".into() }))?;

        let titles: Vec<String> = session.competitor_refs.iter().map(|r| r.title.clone()).collect();
        let query = session.effective_search_query().to_string();

        let (prompt, format) = prompts::build_curation_prompt(
            &selected,
            &query,
            &session.keyword_input.main_keyword,
            &session.keyword_input.sub_keywords,
            session.settings.content_kind,
            &titles,
        );
        debug_assert_eq!(format, ResponseFormat::Json);

        let response = self
            .gateway
            .generate_text(
                ProviderRole::SummaryIdeation,
                Messages { system: String::new(), user: prompt },
                GenerationParams::default(),
            )
            .await
            .map_err(PipelineError::Provider)?;

        let cleaned = prompts::parsing::strip_markdown_fence(&response.text);
        let curated: Vec<CompetitorRef> = serde_json::from_str::<CurationResponse>(&cleaned)
            .ok()
            .map(|parsed| {
                parsed
                    .selected_titles
                    .into_iter()
                    .filter_map(|entry| session.competitor_refs.get(entry.original_index.checked_sub(1)?).cloned())
                    .collect()
            })
            .unwrap_or_default();

        session.curated_refs = if curated.is_empty() {
            session.competitor_refs.iter().take(CURATION_FALLBACK_N).cloned().collect()
        } else {
            curated
        };
        session.stage = Stage::CompetitorsCurated;
        Ok(())
    }

    /// Stage D part 3: enrichment with filtering.
    /// `COMPETITORS_CURATED -> COMPETITORS_READY` (size 0..3).
    #[tracing::instrument(skip(self, session))]
    pub async fn run_competitor_enrichment_with_filtering(
        &self,
        session: &mut SessionState,
    ) -> Result<(), PipelineError> {
        Self::require_stage(session, Stage::CompetitorsCurated, "경쟁사 본문 분석")?;
        self.check_cancelled()?;

        let posts = self.fetcher.enrich_and_filter(&session.curated_refs, &self.cancel).await;
        session.competitor_posts = posts;

        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        session.stage = Stage::CompetitorsReady;
        Ok(())
    }

    /// Stage S: summarization. `COMPETITORS_READY -> SUMMARY_READY`. Runs
    /// even with zero survivors (empty competitor array).
    #[tracing::instrument(skip(self, session))]
    pub async fn run_summary(&self, session: &mut SessionState) -> Result<(), PipelineError> {
        Self::require_stage(session, Stage::CompetitorsReady, "경쟁사 요약")?;
        self.check_cancelled()?;

        let selected = session
            .selected_title
            .clone()
            .ok_or_else(|| PipelineError::Validation(ValidationError::MissingField { field: "선택된 제목".into() }))?;
        let query = session.effective_search_query().to_string();

        let (prompt, format) = prompts::build_summary_prompt(
            &selected,
            &query,
            &session.keyword_input.main_keyword,
            &session.keyword_input.sub_keywords,
            session.settings.content_kind,
            &session.competitor_posts,
        );
        debug_assert_eq!(format, ResponseFormat::Text);

        let response = self
            .gateway
            .generate_text(
                ProviderRole::SummaryIdeation,
                Messages { system: String::new(), user: prompt },
                GenerationParams::default(),
            )
            .await
            .map_err(PipelineError::Provider)?;

        session.summary = Some(SummaryArtifact { text: response.text });
        session.stage = Stage::SummaryReady;
        Ok(())
    }

    /// Stage W: article writing. `SUMMARY_READY -> ARTICLE_READY` (terminal).
    #[tracing::instrument(skip(self, session))]
    pub async fn run_writing(&self, session: &mut SessionState) -> Result<(), PipelineError> {
        Self::require_stage(session, Stage::SummaryReady, "본문 작성")?;
        self.check_cancelled()?;

        let selected = session
            .selected_title
            .clone()
            .ok_or_else(|| PipelineError::Validation(ValidationError::MissingField { field: "선택된 제목".into() }))?;
        let query = session.effective_search_query().to_string();
        let stats = prompts::compute_competitor_stats(&session.competitor_posts);
        let summary_text = session.summary.as_ref().map(|s| s.text.as_str());

        let (prompt, format) = prompts::build_writing_prompt(
            &session.settings,
            &session.keyword_input,
            &selected,
            &query,
            &stats,
            summary_text,
        );
        debug_assert_eq!(format, ResponseFormat::Text);

        let response = self
            .gateway
            .generate_text(
                ProviderRole::Writing,
                Messages { system: String::new(), user: prompt },
                GenerationParams { max_tokens: 8192, ..Default::default() },
            )
            .await
            .map_err(PipelineError::Provider)?;

        session.article = Some(crate::model::FinalArticle { text: response.text });
        session.stage = Stage::ArticleReady;
        Ok(())
    }

    /// Runs stage D through stage W to completion, checking cancellation
    /// between stages (§6 `select_title` contract).
    pub async fn run_to_completion(&self, session: &mut SessionState) -> Result<(), PipelineError> {
        self.run_competitor_discovery(session).await?;
        self.check_cancelled()?;
        self.run_competitor_curation(session).await?;
        self.check_cancelled()?;
        self.run_competitor_enrichment_with_filtering(session).await?;
        self.check_cancelled()?;
        self.run_summary(session).await?;
        self.check_cancelled()?;
        self.run_writing(session).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKeysConfig, ProviderSelectionConfig};
    use crate::error::EnrichmentError;
    use crate::model::{ContentKind, KeywordInput, Tone, WritingSettings};
    use async_trait::async_trait;

    struct NoopBrowser;
    #[async_trait]
    impl BrowserSession for NoopBrowser {
        async fn open_session(&self) -> Result<(), EnrichmentError> {
            Ok(())
        }
        async fn close_session(&self) -> Result<(), EnrichmentError> {
            Ok(())
        }
        async fn search_posts_by_keyword(
            &self,
            _keyword: &str,
            _max_results: usize,
        ) -> Result<Vec<(String, String)>, EnrichmentError> {
            Ok(vec![])
        }
        async fn fetch_post_dom(&self, _url: &str) -> Result<String, EnrichmentError> {
            Err(EnrichmentError::Browser("unused in this test".into()))
        }
        async fn force_stop(&self) {}
    }

    struct NoopHttp;
    #[async_trait]
    impl crate::fetch::HtmlFetcher for NoopHttp {
        async fn get(&self, _url: &str) -> Result<String, EnrichmentError> {
            Err(EnrichmentError::Http("unused in this test".into()))
        }
    }

    fn test_session() -> SessionState {
        SessionState::new(
            WritingSettings {
                content_kind: ContentKind::Guide,
                review_subtype: None,
                tone: Tone::PoliteFormal,
                blogger_identity: None,
            },
            KeywordInput { main_keyword: "프로그래밍 학습법".into(), sub_keywords: vec![] },
        )
    }

    fn no_provider_orchestrator() -> StageOrchestrator<NoopBrowser, NoopHttp> {
        let gateway = ProviderGateway::new(ApiKeysConfig::default(), ProviderSelectionConfig::default());
        let fetcher = CompetitorFetcher::new(NoopBrowser, NoopHttp);
        StageOrchestrator::new(gateway, fetcher, CancellationToken::new())
    }

    #[tokio::test]
    async fn title_ideation_rejects_empty_main_keyword() {
        let orchestrator = no_provider_orchestrator();
        let mut session = test_session();
        session.keyword_input.main_keyword = "   ".into();
        let err = orchestrator.run_title_ideation(&mut session).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(ValidationError::MissingField { .. })));
    }

    #[tokio::test]
    async fn title_ideation_without_configured_provider_surfaces_not_configured() {
        let orchestrator = no_provider_orchestrator();
        let mut session = test_session();
        let err = orchestrator.run_title_ideation(&mut session).await.unwrap_err();
        assert!(matches!(err, PipelineError::Provider(_)));
        assert_eq!(session.stage, Stage::Init);
    }

    #[tokio::test]
    async fn set_selected_title_rejects_wrong_stage() {
        let orchestrator = no_provider_orchestrator();
        let mut session = test_session();
        let candidate = TitleCandidate { title: "제목".into(), search_query: "검색어".into() };
        let err = orchestrator.set_selected_title(&mut session, candidate, None).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::WrongStage { .. })
        ));
    }

    #[tokio::test]
    async fn set_selected_title_advances_stage_and_honors_override() {
        let orchestrator = no_provider_orchestrator();
        let mut session = test_session();
        session.stage = Stage::TitlesReady;
        let candidate = TitleCandidate { title: "제목".into(), search_query: "원래 검색어".into() };
        orchestrator
            .set_selected_title(&mut session, candidate, Some("오버라이드 검색어".into()))
            .unwrap();
        assert_eq!(session.stage, Stage::TitleSelected);
        assert_eq!(session.effective_search_query(), "오버라이드 검색어");
    }

    #[tokio::test]
    async fn cancellation_before_discovery_leaves_session_at_title_selected() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let gateway = ProviderGateway::new(ApiKeysConfig::default(), ProviderSelectionConfig::default());
        let fetcher = CompetitorFetcher::new(NoopBrowser, NoopHttp);
        let orchestrator = StageOrchestrator::new(gateway, fetcher, cancel);

        let mut session = test_session();
        session.stage = Stage::TitleSelected;
        session.selected_title = Some(SelectedTitle {
            candidate: TitleCandidate { title: "제목".into(), search_query: "검색어".into() },
            search_query_override: None,
        });

        let err = orchestrator.run_competitor_discovery(&mut session).await.unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
        assert_eq!(session.stage, Stage::TitleSelected);
    }

    #[test]
    fn curation_fallback_constant_is_ten() {
        assert_eq!(CURATION_FALLBACK_N, 10);
    }
}

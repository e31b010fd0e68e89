//! `TaskRunner` (§4.6): drives one `StageOrchestrator` through the pipeline,
//! reporting progress over an unbounded channel and honoring cooperative
//! cancellation at stage boundaries.
//!
//! Grounded on the teacher's posting-queue consumer loop (one owned
//! `CancellationToken`, `tracing` progress logging, drain-then-exit on
//! cancel) generalized from a queue consumer to a single-session state
//! machine walk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::fetch::{BrowserSession, CompetitorFetcher, HtmlFetcher};
use crate::llm::gateway::ProviderGateway;
use crate::model::{FinalArticle, SessionState, TitleCandidate};
use crate::orchestrator::StageOrchestrator;

/// Progress/outcome events emitted to the UI-out-of-scope collaborator.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// A stage started or reported incremental progress.
    Progress { stage_label: String, message: String },
    /// A stage produced an intermediate artifact worth surfacing (e.g. the
    /// title list, the curated competitor set, the summary text).
    StageArtifact { name: String, payload: String },
    /// The full pipeline finished; `final_article` is the terminal result.
    Completed { final_article: FinalArticle },
    /// The pipeline ended in cancellation (not an error).
    Cancelled,
    /// The pipeline failed; `kind` is `PipelineError::kind()`.
    Error { kind: String, message: String },
}

/// Runs exactly one orchestration at a time. A second `run_*` call while one
/// is in flight is a no-op (logged, not panicking) — `TaskRunner` instances
/// are meant to be one-per-session, not shared across sessions.
pub struct TaskRunner<B: BrowserSession, H: HtmlFetcher> {
    orchestrator: StageOrchestrator<B, H>,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<TaskEvent>,
}

impl<B: BrowserSession, H: HtmlFetcher> TaskRunner<B, H> {
    pub fn new(
        gateway: ProviderGateway,
        fetcher: CompetitorFetcher<B, H>,
    ) -> (Self, mpsc::UnboundedReceiver<TaskEvent>) {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = StageOrchestrator::new(gateway, fetcher, cancel.clone());
        (Self { orchestrator, cancel, running: Arc::new(AtomicBool::new(false)), events: tx }, rx)
    }

    /// Signals cooperative cancellation; in-flight stage calls observe this
    /// at their next cancellation check and unwind through
    /// `PipelineError::Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn send(&self, event: TaskEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("task event receiver dropped, discarding event");
        }
    }

    fn report_error(&self, err: PipelineError) {
        if matches!(err, PipelineError::Cancelled) {
            self.send(TaskEvent::Cancelled);
        } else {
            self.send(TaskEvent::Error { kind: err.kind().to_string(), message: err.to_string() });
        }
    }

    /// Runs Stage T (title ideation) alone, since the result must be shown
    /// to the user for Stage T→D's manual selection before anything else
    /// proceeds.
    #[tracing::instrument(skip(self, session))]
    pub async fn run_title_ideation(&self, session: &mut SessionState) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("run_title_ideation called while another orchestration is in flight, ignoring");
            return false;
        }
        self.send(TaskEvent::Progress {
            stage_label: "title_ideation".into(),
            message: "제목 10개를 생성하는 중입니다".into(),
        });

        let result = self.orchestrator.run_title_ideation(session).await;
        self.running.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => {
                self.send(TaskEvent::StageArtifact {
                    name: "title_candidates".into(),
                    payload: serde_json::to_string(&session.title_candidates).unwrap_or_default(),
                });
                true
            }
            Err(err) => {
                self.report_error(err);
                false
            }
        }
    }

    /// Records the user's title pick, then drives discovery through writing
    /// to completion, emitting one `StageArtifact` per intermediate stage
    /// and a terminal `Completed`/`Cancelled`/`Error` event.
    #[tracing::instrument(skip(self, session, candidate))]
    pub async fn select_title_and_run_to_completion(
        &self,
        session: &mut SessionState,
        candidate: TitleCandidate,
        search_query_override: Option<String>,
    ) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("select_title_and_run_to_completion called while already running, ignoring");
            return;
        }

        if let Err(err) = self.orchestrator.set_selected_title(session, candidate, search_query_override) {
            self.running.store(false, Ordering::SeqCst);
            self.report_error(err);
            return;
        }

        let outcome = self.drive_remaining_stages(session).await;
        self.running.store(false, Ordering::SeqCst);

        match outcome {
            Ok(()) => {
                if let Some(article) = session.article.clone() {
                    self.send(TaskEvent::Completed { final_article: article });
                } else {
                    self.send(TaskEvent::Error {
                        kind: "InternalError".into(),
                        message: "파이프라인이 완료되었지만 결과물이 없습니다".into(),
                    });
                }
            }
            Err(err) => self.report_error(err),
        }
    }

    async fn drive_remaining_stages(&self, session: &mut SessionState) -> Result<(), PipelineError> {
        self.send(TaskEvent::Progress {
            stage_label: "competitor_discovery".into(),
            message: "경쟁 블로그를 검색하는 중입니다".into(),
        });
        self.orchestrator.run_competitor_discovery(session).await?;
        self.send(TaskEvent::StageArtifact {
            name: "competitor_refs".into(),
            payload: serde_json::to_string(&session.competitor_refs).unwrap_or_default(),
        });

        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.send(TaskEvent::Progress {
            stage_label: "competitor_curation".into(),
            message: "관련성 높은 글을 선별하는 중입니다".into(),
        });
        self.orchestrator.run_competitor_curation(session).await?;

        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.send(TaskEvent::Progress {
            stage_label: "competitor_enrichment".into(),
            message: "경쟁 블로그 본문을 분석하는 중입니다".into(),
        });
        self.orchestrator.run_competitor_enrichment_with_filtering(session).await?;
        self.send(TaskEvent::StageArtifact {
            name: "competitor_posts".into(),
            payload: format!("{{\"survivor_count\":{}}}", session.competitor_posts.len()),
        });

        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.send(TaskEvent::Progress {
            stage_label: "summary".into(),
            message: "경쟁 블로그를 요약하는 중입니다".into(),
        });
        self.orchestrator.run_summary(session).await?;
        self.send(TaskEvent::StageArtifact {
            name: "summary".into(),
            payload: session.summary.as_ref().map(|s| s.text.clone()).unwrap_or_default(),
        });

        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.send(TaskEvent::Progress {
            stage_label: "writing".into(),
            message: "본문을 작성하는 중입니다".into(),
        });
        self.orchestrator.run_writing(session).await?;
        Ok(())
    }
}

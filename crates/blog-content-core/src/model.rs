//! The pipeline's data model (spec.md §3).
//!
//! These types carry no behavior beyond small invariant-preserving
//! constructors and the "effective value" fallback-chain accessors, mirroring
//! `BusinessProfile::effective_industry_topics` in the teacher's config types.

use serde::{Deserialize, Serialize};

/// Content kind a post is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Review,
    Guide,
    Comparison,
}

/// Review disclosure subtype, only meaningful when `ContentKind::Review`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewSubtype {
    OwnPurchase,
    Sponsored,
    Trial,
    Rental,
}

impl ReviewSubtype {
    /// Sponsored, Trial, and Rental all forbid words meaning "bought"/"purchased"
    /// and require a first-paragraph disclosure. Own-purchase requires neither.
    pub fn requires_disclosure(self) -> bool {
        !matches!(self, ReviewSubtype::OwnPurchase)
    }
}

/// Sentence-ending / phrasing register for the generated article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    CasualInformal,
    PoliteFormal,
    FriendlyPolite,
}

/// User-chosen styling controls, loaded once at startup and consumed
/// read-only by every stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritingSettings {
    pub content_kind: ContentKind,
    pub review_subtype: Option<ReviewSubtype>,
    pub tone: Tone,
    /// Free-text "blogger identity", at most ~80 chars.
    pub blogger_identity: Option<String>,
}

impl WritingSettings {
    /// `review_subtype` is only meaningful for `ContentKind::Review`; this
    /// is the value every stage should actually consult.
    pub fn effective_review_subtype(&self) -> Option<ReviewSubtype> {
        if self.content_kind == ContentKind::Review {
            self.review_subtype
        } else {
            None
        }
    }
}

/// The keyword(s) driving one orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordInput {
    pub main_keyword: String,
    /// Comma-separated order-preserved hints; duplicates allowed.
    pub sub_keywords: Vec<String>,
}

impl KeywordInput {
    /// `main_keyword` non-empty after trim.
    pub fn validate(&self) -> Result<(), crate::ValidationError> {
        if self.main_keyword.trim().is_empty() {
            return Err(crate::ValidationError::MissingField {
                field: "메인 키워드".into(),
            });
        }
        Ok(())
    }
}

/// One AI-proposed title with its paired search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleCandidate {
    pub title: String,
    pub search_query: String,
}

/// A `TitleCandidate` the user picked, with an optional search-query override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedTitle {
    pub candidate: TitleCandidate,
    pub search_query_override: Option<String>,
}

impl SelectedTitle {
    /// Effective search query fallback chain: user override → the
    /// candidate's own paired query → (caller falls back further to the
    /// main keyword if this is also empty, which it never should be).
    pub fn effective_search_query(&self) -> &str {
        match &self.search_query_override {
            Some(q) if !q.trim().is_empty() => q,
            _ => &self.candidate.search_query,
        }
    }
}

/// A bare reference collected during discovery, before enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorRef {
    pub rank: u32,
    pub title: String,
    pub url: String,
}

/// One classified piece of a competitor post's body, in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContentStructureComponent {
    Text { heading_level: Option<u8>, preview: String },
    Image { url: String },
    Gallery { image_urls: Vec<String> },
    ImageStrip { image_urls: Vec<String> },
    Video { platform: String },
    ExternalEmbed { preview: String },
    LinkPreview { url: String, preview: String },
    Quotation { preview: String },
    Table { rows: u32, cols: u32 },
    HorizontalLine,
    Sticker,
    Unknown,
}

/// A `CompetitorRef` enriched with extracted body content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorPost {
    pub reference: CompetitorRef,
    pub body_text: String,
    /// Character count with whitespace stripped.
    pub body_length: usize,
    pub image_count: u32,
    pub gif_count: u32,
    pub video_count: u32,
    pub structure: Vec<ContentStructureComponent>,
    pub hashtags: Vec<String>,
}

impl CompetitorPost {
    /// The sentinel value a fetcher returns when both enrichment paths fail.
    pub fn sentinel(reference: CompetitorRef) -> Self {
        Self {
            reference,
            body_text: String::new(),
            body_length: 0,
            image_count: 0,
            gif_count: 0,
            video_count: 0,
            structure: Vec::new(),
            hashtags: Vec::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.body_length == 0 && self.body_text.is_empty()
    }
}

/// Plain-text summarization output; passed verbatim into the writing prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryArtifact {
    pub text: String,
}

/// The finished article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalArticle {
    pub text: String,
}

impl FinalArticle {
    /// `true` if the first non-empty line is literally `제목: <title>`,
    /// byte-for-byte.
    pub fn starts_with_title(&self, title: &str) -> bool {
        let expected = format!("제목: {title}");
        self.text
            .lines()
            .find(|l| !l.trim().is_empty())
            .map(|l| l == expected)
            .unwrap_or(false)
    }
}

/// A (provider, display-model-name) pair for one dispatch role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderRole {
    /// Stage T and Stage D/S (ideation/summary) — cheaper, faster model.
    SummaryIdeation,
    /// Stage W (final article writing) — higher-quality model.
    Writing,
    /// Exposed but not exercised by the core pipeline.
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSelection {
    pub role: ProviderRole,
    pub provider: Provider,
    pub display_model_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    Openai,
    Gemini,
}

/// The stage cursor of one orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Init,
    TitlesReady,
    TitleSelected,
    CompetitorsDiscovered,
    CompetitorsCurated,
    CompetitorsReady,
    SummaryReady,
    ArticleReady,
    Cancelled,
    Errored,
}

/// One orchestration's carrying state. Owned exclusively by its
/// `TaskRunner`; never shared mutably.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub settings: WritingSettings,
    pub keyword_input: KeywordInput,
    pub stage: Stage,
    pub title_candidates: Vec<TitleCandidate>,
    pub selected_title: Option<SelectedTitle>,
    pub competitor_refs: Vec<CompetitorRef>,
    pub curated_refs: Vec<CompetitorRef>,
    pub competitor_posts: Vec<CompetitorPost>,
    pub summary: Option<SummaryArtifact>,
    pub article: Option<FinalArticle>,
}

impl SessionState {
    pub fn new(settings: WritingSettings, keyword_input: KeywordInput) -> Self {
        Self {
            settings,
            keyword_input,
            stage: Stage::Init,
            title_candidates: Vec::new(),
            selected_title: None,
            competitor_refs: Vec::new(),
            curated_refs: Vec::new(),
            competitor_posts: Vec::new(),
            summary: None,
            article: None,
        }
    }

    /// The string that actually drives `CompetitorFetcher`: user override →
    /// the selected title's paired query → the main keyword.
    pub fn effective_search_query(&self) -> &str {
        match &self.selected_title {
            Some(selected) => {
                let q = selected.effective_search_query();
                if q.trim().is_empty() {
                    &self.keyword_input.main_keyword
                } else {
                    q
                }
            }
            None => &self.keyword_input.main_keyword,
        }
    }
}

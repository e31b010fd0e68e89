//! `CompetitorFetcher` (§4.3): keyword-driven discovery of candidate
//! competitor posts, and enrichment of a given URL into a `CompetitorPost`.
//!
//! The browser-automation collaborator and the stateless HTTP path are both
//! reached through small `async_trait` object-safe traits — the core never
//! imports a concrete automation-driver crate, per §9's "browser-automation
//! coupling is collapsed behind a small interface."

pub mod html;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::EnrichmentError;
use crate::model::{CompetitorPost, CompetitorRef};
use crate::quality;

use html::Document;

/// Maximum candidate refs discovery collects (3 pages x ~10 items).
pub const MAX_DISCOVERY_RESULTS: usize = 30;
/// Stage D's terminal survivor count.
pub const TARGET_SURVIVORS: usize = 3;
/// Body-length admission gate.
pub const MIN_BODY_LENGTH: usize = 1000;

/// Stands in for the UI-out-of-scope browser-automation collaborator
/// (§6): `open_session`/`close_session`/`search_posts_by_keyword`/
/// `fetch_post_dom`/`force_stop`.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn open_session(&self) -> Result<(), EnrichmentError>;
    async fn close_session(&self) -> Result<(), EnrichmentError>;

    /// Pages through up to `max_results` search hits, returning them in
    /// discovery order.
    async fn search_posts_by_keyword(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<(String, String)>, EnrichmentError>;

    /// Fallback enrichment path: executes page scripts and scrolls to load
    /// lazy content, returning a DOM snapshot as HTML.
    async fn fetch_post_dom(&self, url: &str) -> Result<String, EnrichmentError>;

    /// Force-tears-down any live session; called on cancellation because a
    /// hung page load would otherwise block the worker indefinitely.
    async fn force_stop(&self);
}

/// Stands in for the stateless HTTP enrichment path: a GET with a
/// browser-like User-Agent, bounded retries, and a per-call timeout.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, EnrichmentError>;
}

const SENTINEL_TITLE: &str = "분석 실패";

/// Given a raw (possibly wrapper-page) URL, is there an inner iframe
/// commonly used by the platform? Returns its absolute URL if so.
fn find_inner_iframe_url(doc: &Document) -> Option<String> {
    doc.find_one("iframe#mainFrame")
        .or_else(|| doc.find_one("iframe.se-iframe"))
        .and_then(|el| el.attr("src").map(str::to_string))
}

fn resolve_absolute(base: &str, maybe_relative: &str) -> String {
    if maybe_relative.starts_with("http") {
        maybe_relative.to_string()
    } else if let Some(origin_end) = base.find("//").map(|i| i + 2) {
        let origin = base[..base[origin_end..].find('/').map(|i| origin_end + i).unwrap_or(base.len())].to_string();
        format!("{origin}{maybe_relative}")
    } else {
        maybe_relative.to_string()
    }
}

/// Parses a fetched/DOM document into a `CompetitorPost`, resolving the
/// inner-iframe layout when present. `fetch_fn` is called again (with the
/// iframe's absolute URL) only when an iframe is detected; it must not
/// itself try to detect iframes recursively — this function owns that
/// decision (§3's resolved Open Question: frame context is never implicit).
async fn parse_post_document<F, Fut>(
    reference: &CompetitorRef,
    raw_html: &str,
    fetch_fn: F,
) -> CompetitorPost
where
    F: FnOnce(String) -> Fut,
    Fut: std::future::Future<Output = Result<String, EnrichmentError>>,
{
    let outer = Document::parse(raw_html);
    let html_for_body = if let Some(iframe_src) = find_inner_iframe_url(&outer) {
        let absolute = resolve_absolute(&reference.url, &iframe_src);
        match fetch_fn(absolute).await {
            Ok(inner_html) => inner_html,
            Err(_) => raw_html.to_string(),
        }
    } else {
        raw_html.to_string()
    };

    let doc = Document::parse(&html_for_body);
    let body_text = html::extract_body_text(&doc);
    let body_length = html::stripped_char_count(&body_text);
    let (structure, counts) = html::analyze_structure(&doc);
    let hashtags = html::extract_hashtags(&doc, &body_text);

    CompetitorPost {
        reference: reference.clone(),
        body_text,
        body_length,
        image_count: counts.images,
        gif_count: counts.gifs,
        video_count: counts.videos,
        structure,
        hashtags,
    }
}

pub struct CompetitorFetcher<B: BrowserSession, H: HtmlFetcher> {
    browser: B,
    http: H,
}

impl<B: BrowserSession, H: HtmlFetcher> CompetitorFetcher<B, H> {
    pub fn new(browser: B, http: H) -> Self {
        Self { browser, http }
    }

    /// Discovery: collects up to `MAX_DISCOVERY_RESULTS` candidate refs,
    /// deduplicated by URL, preserving discovery order as rank.
    pub async fn discover(&self, search_query: &str) -> Result<Vec<CompetitorRef>, EnrichmentError> {
        self.browser.open_session().await?;
        let raw = self
            .browser
            .search_posts_by_keyword(search_query, MAX_DISCOVERY_RESULTS)
            .await;
        self.browser.close_session().await.ok();
        let raw = raw?;

        let mut seen = std::collections::HashSet::new();
        let mut refs = Vec::new();
        for (rank, (title, url)) in raw.into_iter().enumerate() {
            if seen.insert(url.clone()) {
                refs.push(CompetitorRef { rank: rank as u32 + 1, title, url });
            }
            if refs.len() >= MAX_DISCOVERY_RESULTS {
                break;
            }
        }
        Ok(refs)
    }

    /// Enriches one URL into a `CompetitorPost`. Tries the stateless HTTP
    /// path first; falls back to the browser path when HTTP parsing
    /// returns the sentinel title or zero body length.
    pub async fn enrich(&self, reference: &CompetitorRef) -> CompetitorPost {
        match self.http.get(&reference.url).await {
            Ok(raw_html) => {
                let post = parse_post_document(reference, &raw_html, |url| async move {
                    self.http.get(&url).await
                })
                .await;

                if post.reference.title == SENTINEL_TITLE || post.body_length == 0 {
                    self.enrich_via_browser(reference).await
                } else {
                    post
                }
            }
            Err(_) => self.enrich_via_browser(reference).await,
        }
    }

    async fn enrich_via_browser(&self, reference: &CompetitorRef) -> CompetitorPost {
        match self.browser.fetch_post_dom(&reference.url).await {
            Ok(dom) => {
                parse_post_document(reference, &dom, |url| async move {
                    self.http.get(&url).await
                })
                .await
            }
            Err(_) => CompetitorPost::sentinel(reference.clone()),
        }
    }

    /// Iterates curated refs in order, enriching and filtering each, and
    /// stops once `TARGET_SURVIVORS` have been collected or the list is
    /// exhausted. Checks `cancel` between iterations (§4.6 cooperative
    /// cancellation).
    pub async fn enrich_and_filter(
        &self,
        curated: &[CompetitorRef],
        cancel: &CancellationToken,
    ) -> Vec<CompetitorPost> {
        let mut survivors = Vec::new();
        for reference in curated {
            if cancel.is_cancelled() {
                self.browser.force_stop().await;
                break;
            }
            if survivors.len() >= TARGET_SURVIVORS {
                break;
            }

            let post = self.enrich(reference).await;
            if post.is_sentinel() {
                continue;
            }
            if post.body_length < MIN_BODY_LENGTH {
                continue;
            }
            if quality::is_advertisement(&post.body_text, &post.reference.title) {
                continue;
            }
            if quality::is_low_quality(&post.body_text) {
                continue;
            }
            survivors.push(post);
        }
        survivors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockBrowser {
        dom_responses: Mutex<Vec<String>>,
        force_stop_calls: AtomicUsize,
    }

    #[async_trait]
    impl BrowserSession for MockBrowser {
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
            Ok(vec![
                ("제목1".into(), "https://blog.naver.com/a/1".into()),
                ("제목2".into(), "https://blog.naver.com/a/1".into()), // duplicate URL
                ("제목3".into(), "https://blog.naver.com/a/2".into()),
            ])
        }
        async fn fetch_post_dom(&self, _url: &str) -> Result<String, EnrichmentError> {
            let mut guard = self.dom_responses.lock().unwrap();
            if guard.is_empty() {
                Err(EnrichmentError::Browser("no more mock responses".into()))
            } else {
                Ok(guard.remove(0))
            }
        }
        async fn force_stop(&self) {
            self.force_stop_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockHttp {
        responses: Mutex<Vec<Result<String, EnrichmentError>>>,
    }

    #[async_trait]
    impl HtmlFetcher for MockHttp {
        async fn get(&self, _url: &str) -> Result<String, EnrichmentError> {
            let mut guard = self.responses.lock().unwrap();
            if guard.is_empty() {
                Err(EnrichmentError::Http("no more mock responses".into()))
            } else {
                guard.remove(0)
            }
        }
    }

    fn long_body(core: &str) -> String {
        format!(
            r#"<html><body><div class="se-component se-text"><p>{}</p></div></body></html>"#,
            core.repeat(30)
        )
    }

    #[tokio::test]
    async fn discover_deduplicates_by_url_and_assigns_rank() {
        let fetcher = CompetitorFetcher::new(
            MockBrowser { dom_responses: Mutex::new(vec![]), force_stop_calls: AtomicUsize::new(0) },
            MockHttp { responses: Mutex::new(vec![]) },
        );
        let refs = fetcher.discover("강아지 사료").await.unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].rank, 1);
        assert_eq!(refs[1].rank, 2);
        assert_eq!(refs[1].url, "https://blog.naver.com/a/2");
    }

    #[tokio::test]
    async fn enrich_falls_back_to_browser_on_sentinel_title() {
        let good_html = long_body("오늘은 강아지와 함께 산책을 다녀온 이야기를 해보려고 합니다. ");
        let fetcher = CompetitorFetcher::new(
            MockBrowser {
                dom_responses: Mutex::new(vec![good_html]),
                force_stop_calls: AtomicUsize::new(0),
            },
            MockHttp { responses: Mutex::new(vec![Err(EnrichmentError::Http("boom".into()))]) },
        );
        let reference = CompetitorRef { rank: 1, title: "t".into(), url: "https://blog.naver.com/a/1".into() };
        let post = fetcher.enrich(&reference).await;
        assert!(post.body_length >= MIN_BODY_LENGTH);
    }

    #[tokio::test]
    async fn enrich_falls_back_to_browser_on_zero_body_length() {
        let empty_html = "<html><body></body></html>".to_string();
        let good_html = long_body("오늘은 강아지와 함께 산책을 다녀온 이야기를 해보려고 합니다. ");
        let fetcher = CompetitorFetcher::new(
            MockBrowser {
                dom_responses: Mutex::new(vec![good_html]),
                force_stop_calls: AtomicUsize::new(0),
            },
            MockHttp { responses: Mutex::new(vec![Ok(empty_html)]) },
        );
        let reference = CompetitorRef { rank: 1, title: "t".into(), url: "https://blog.naver.com/a/1".into() };
        let post = fetcher.enrich(&reference).await;
        assert!(post.body_length >= MIN_BODY_LENGTH);
    }

    #[tokio::test]
    async fn enrich_and_filter_drops_short_and_advertorial_and_stops_at_three() {
        let ad_html = long_body("이 제품은 업체로부터 제공받아 작성한 협찬 후기입니다. ");
        let short_html =
            r#"<html><body><div class="se-component se-text"><p>짧은 글</p></div></body></html>"#
                .to_string();
        let good1 = long_body("강아지 사료를 고르는 기준에 대해 자세히 알아보겠습니다. ");
        let good2 = long_body("오늘은 강아지 산책 코스를 소개해드리려고 합니다. ");
        let good3 = long_body("강아지 미용 주기에 대한 솔직한 경험담을 남겨봅니다. ");
        let good4 = long_body("이 글은 읽히지 않아야 하는 네번째 글입니다 여기까지. ");

        let fetcher = CompetitorFetcher::new(
            MockBrowser { dom_responses: Mutex::new(vec![]), force_stop_calls: AtomicUsize::new(0) },
            MockHttp {
                responses: Mutex::new(vec![
                    Ok(ad_html),
                    Ok(short_html),
                    Ok(good1),
                    Ok(good2),
                    Ok(good3),
                    Ok(good4),
                ]),
            },
        );

        let curated: Vec<CompetitorRef> = (1..=6)
            .map(|i| CompetitorRef { rank: i, title: format!("t{i}"), url: format!("https://blog.naver.com/a/{i}") })
            .collect();

        let cancel = CancellationToken::new();
        let survivors = fetcher.enrich_and_filter(&curated, &cancel).await;
        assert_eq!(survivors.len(), TARGET_SURVIVORS);
    }

    #[tokio::test]
    async fn enrich_and_filter_stops_immediately_when_cancelled() {
        let fetcher = CompetitorFetcher::new(
            MockBrowser { dom_responses: Mutex::new(vec![]), force_stop_calls: AtomicUsize::new(0) },
            MockHttp { responses: Mutex::new(vec![]) },
        );
        let curated = vec![CompetitorRef { rank: 1, title: "t".into(), url: "u".into() }];
        let cancel = CancellationToken::new();
        cancel.cancel();
        let survivors = fetcher.enrich_and_filter(&curated, &cancel).await;
        assert!(survivors.is_empty());
    }

    #[test]
    fn resolve_absolute_handles_relative_paths() {
        assert_eq!(
            resolve_absolute("https://blog.naver.com/a/1", "/PostView.naver?id=1"),
            "https://blog.naver.com/PostView.naver?id=1"
        );
        assert_eq!(
            resolve_absolute("https://blog.naver.com/a/1", "https://other.com/x"),
            "https://other.com/x"
        );
    }
}

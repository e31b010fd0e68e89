//! The unified HTML analyzer (§4.3): walks a post body's component
//! containers in document order, classifying each into the sum-typed
//! `ContentStructureComponent`, and separately extracting hashtags.
//!
//! Both the HTTP path (parsing a fetched response body) and the
//! browser-automation path (parsing a DOM snapshot string) funnel through
//! the same `Document` abstraction, so this module never branches on fetch
//! origin.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::model::ContentStructureComponent;

/// A parsed HTML document (or live DOM snapshot), exposing the small
/// `find_one`/`find_all`/`text`/`attr` surface the analyzer needs. Wraps
/// `scraper::Html`; never holds cross-call frame state (§3's resolved Open
/// Question — the caller decides which document, outer or iframe, this is).
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(raw_html: &str) -> Self {
        Self { html: Html::parse_document(raw_html) }
    }

    pub fn find_all(&self, selector: &str) -> Vec<Element<'_>> {
        let Ok(sel) = Selector::parse(selector) else { return Vec::new() };
        self.html.select(&sel).map(Element::new).collect()
    }

    pub fn find_one(&self, selector: &str) -> Option<Element<'_>> {
        self.find_all(selector).into_iter().next()
    }

    /// All text in the document, whitespace-collapsed.
    pub fn full_text(&self) -> String {
        collapse_whitespace(&self.html.root_element().text().collect::<Vec<_>>().join(" "))
    }
}

pub struct Element<'a> {
    inner: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(inner: scraper::ElementRef<'a>) -> Self {
        Self { inner }
    }

    pub fn text(&self) -> String {
        collapse_whitespace(&self.inner.text().collect::<Vec<_>>().join(" "))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.inner.value().attr(name)
    }

    pub fn class_list(&self) -> Vec<&str> {
        self.inner.value().classes().collect()
    }

    pub fn find_all(&self, selector: &str) -> Vec<Element<'_>> {
        let Ok(sel) = Selector::parse(selector) else { return Vec::new() };
        self.inner.select(&sel).map(Element::new).collect()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// GIF predicate
// ---------------------------------------------------------------------------

const GIF_PATTERNS: &[&str] = &[".gif?", ".gifv", "format=gif", "type=gif", "_gif."];

/// Static-CDN / thumbnail markers that short-circuit to "not a GIF"
/// regardless of the GIF patterns above (checked first).
const STATIC_CDN_MARKERS: &[&str] =
    &["postfiles.pstatic.net", "type=w80_blur", "type=w773", "type=w80", ".jpeg", ".jpg", ".png"];

/// True when `url` is an actual (animated) GIF per the platform's naming
/// conventions. Static-CDN/thumbnail markers always win, even if a GIF
/// pattern also matches — this is the literal invariant in spec.md §8.
pub fn is_actual_gif(url: &str) -> bool {
    if STATIC_CDN_MARKERS.iter().any(|marker| url.contains(marker)) {
        return false;
    }
    GIF_PATTERNS.iter().any(|pattern| url.contains(pattern))
}

// ---------------------------------------------------------------------------
// Component classification
// ---------------------------------------------------------------------------

/// Counts accumulated while walking the component list.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureCounts {
    pub images: u32,
    pub gifs: u32,
    pub videos: u32,
}

/// Walks the platform's "component" containers in document order,
/// classifying each by its container's class token, and separately
/// accumulating image/GIF/video counts per the §4.3 counting rules.
pub fn analyze_structure(doc: &Document) -> (Vec<ContentStructureComponent>, StructureCounts) {
    let mut components = Vec::new();
    let mut counts = StructureCounts::default();
    let mut video_player_fallback = 0u32;
    let mut explicit_video_components = 0u32;

    for el in doc.find_all("div.se-component") {
        let classes = el.class_list();

        if classes.iter().any(|c| *c == "se-image") {
            if let Some(img) = el.find_all("img").into_iter().next() {
                let url = img.attr("src").unwrap_or_default().to_string();
                if is_actual_gif(&url) {
                    counts.gifs += 1;
                } else {
                    counts.images += 1;
                }
                components.push(ContentStructureComponent::Image { url });
            }
        } else if classes.iter().any(|c| *c == "se-imageGroup" || *c == "se-gallery") {
            let urls: Vec<String> = el
                .find_all("img")
                .into_iter()
                .map(|img| img.attr("src").unwrap_or_default().to_string())
                .collect();
            let gif_count = urls.iter().filter(|u| is_actual_gif(u)).count() as u32;
            counts.images += urls.len() as u32 - gif_count;
            counts.gifs += gif_count;
            components.push(ContentStructureComponent::Gallery { image_urls: urls });
        } else if classes.iter().any(|c| *c == "se-imageStrip" || *c == "se-imageSlide") {
            let urls: Vec<String> = el
                .find_all("img")
                .into_iter()
                .map(|img| img.attr("src").unwrap_or_default().to_string())
                .collect();
            components.push(ContentStructureComponent::ImageStrip { image_urls: urls });
        } else if classes.iter().any(|c| *c == "se-gifVideo" || *c == "se-gif-video") {
            counts.gifs += 1;
            components.push(ContentStructureComponent::Unknown);
        } else if classes.iter().any(|c| *c == "se-video") {
            explicit_video_components += 1;
            let platform = el
                .find_all("iframe")
                .into_iter()
                .next()
                .and_then(|f| f.attr("src").map(classify_video_platform))
                .unwrap_or_else(|| "unknown".to_string());
            components.push(ContentStructureComponent::Video { platform });
        } else if classes.iter().any(|c| *c == "se-oembed") {
            let preview = el.text();
            if el
                .find_all("iframe")
                .into_iter()
                .any(|f| f.attr("src").is_some_and(is_video_iframe))
            {
                video_player_fallback += 1;
            }
            components.push(ContentStructureComponent::ExternalEmbed { preview });
        } else if classes.iter().any(|c| *c == "se-oglink" || *c == "se-linkThumbnail") {
            let url = el.find_one("a").and_then(|a| a.attr("href")).unwrap_or_default().to_string();
            components.push(ContentStructureComponent::LinkPreview { url, preview: el.text() });
        } else if classes.iter().any(|c| *c == "se-quotation") {
            components.push(ContentStructureComponent::Quotation { preview: el.text() });
        } else if classes.iter().any(|c| *c == "se-table") {
            let rows = el.find_all("tr");
            let cols = rows.first().map(|r| r.find_all("td, th").len()).unwrap_or(0);
            components.push(ContentStructureComponent::Table {
                rows: rows.len() as u32,
                cols: cols as u32,
            });
        } else if classes.iter().any(|c| *c == "se-horizontalLine") {
            components.push(ContentStructureComponent::HorizontalLine);
        } else if classes.iter().any(|c| *c == "se-sticker") {
            components.push(ContentStructureComponent::Sticker);
        } else if classes.iter().any(|c| *c == "se-text") {
            let heading_level = classes.iter().find_map(|c| {
                c.strip_prefix("se-fs")
                    .and_then(|n| n.parse::<u8>().ok())
                    .filter(|n| *n >= 32)
                    .map(|_| 1)
            });
            let full_text = el.text();
            let preview: String = full_text.chars().take(200).collect();
            components.push(ContentStructureComponent::Text { heading_level, preview });
        } else {
            components.push(ContentStructureComponent::Unknown);
        }
    }

    // Video count prefers the explicit video-component count, falls back to
    // a generic media-player element count, then to YouTube/Vimeo iframe counts.
    counts.videos = if explicit_video_components > 0 {
        explicit_video_components
    } else if video_player_fallback > 0 {
        video_player_fallback
    } else {
        doc.find_all("iframe")
            .into_iter()
            .filter(|f| f.attr("src").is_some_and(is_video_iframe))
            .count() as u32
    };

    (components, counts)
}

fn is_video_iframe(src: &str) -> bool {
    src.contains("youtube.com") || src.contains("youtu.be") || src.contains("vimeo.com")
}

fn classify_video_platform(src: &str) -> String {
    if src.contains("youtube.com") || src.contains("youtu.be") {
        "youtube".to_string()
    } else if src.contains("vimeo.com") {
        "vimeo".to_string()
    } else if src.contains("tv.naver.com") {
        "naver-tv".to_string()
    } else {
        "unknown".to_string()
    }
}

// ---------------------------------------------------------------------------
// Body text extraction
// ---------------------------------------------------------------------------

/// Prefers text-module containers (excluding title and caption variants),
/// whitespace-collapsed.
pub fn extract_body_text(doc: &Document) -> String {
    let text_nodes: Vec<String> = doc
        .find_all("div.se-component.se-text")
        .into_iter()
        .filter(|el| {
            let classes = el.class_list();
            !classes.iter().any(|c| *c == "se-title-text" || *c == "se-caption")
        })
        .map(|el| el.text())
        .collect();

    if text_nodes.is_empty() {
        doc.full_text()
    } else {
        text_nodes.join("\n")
    }
}

/// Character count with whitespace stripped.
pub fn stripped_char_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

// ---------------------------------------------------------------------------
// Hashtag extraction
// ---------------------------------------------------------------------------

static HASHTAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\p{Hangul}\w]+)").expect("static pattern is valid"));

static CSS_ID_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("static pattern is valid"));

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{3,8}$").expect("static pattern is valid"));

const ULTRA_GENERIC_TAGS: &[&str] = &["일상", "오늘", "행복", "사진", "블로그"];

/// Prefers the platform's dedicated hashtag element when present; otherwise
/// regex-extracts `#<word>` from body text. Filters CSS-id-like tokens,
/// pure numeric/hex tokens, 1-char tags, and ultra-generic Korean words,
/// dedupes, and sorts length-descending.
pub fn extract_hashtags(doc: &Document, body_text: &str) -> Vec<String> {
    let raw: Vec<String> = {
        let tag_elements = doc.find_all("span.__se-hash-tag");
        if !tag_elements.is_empty() {
            tag_elements
                .into_iter()
                .map(|el| el.text().trim_start_matches('#').to_string())
                .collect()
        } else {
            HASHTAG_PATTERN.captures_iter(body_text).map(|c| c[1].to_string()).collect()
        }
    };

    let mut seen = std::collections::HashSet::new();
    let mut filtered: Vec<String> = raw
        .into_iter()
        .filter(|tag| {
            tag.chars().count() > 1
                && !tag.chars().all(|c| c.is_ascii_digit())
                && !HEX_COLOR.is_match(tag)
                && !CSS_ID_LIKE.is_match(tag)
                && !ULTRA_GENERIC_TAGS.contains(&tag.as_str())
        })
        .filter(|tag| seen.insert(tag.clone()))
        .collect();

    filtered.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    filtered.truncate(15);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_cdn_markers_never_count_as_gif() {
        assert!(!is_actual_gif("https://postfiles.pstatic.net/x.gif?type=w80"));
        assert!(!is_actual_gif("https://cdn.example.com/a/b.jpeg?format=gif"));
    }

    #[test]
    fn gif_pattern_matches_without_static_marker() {
        assert!(is_actual_gif("https://cdn.example.com/animated.gifv"));
        assert!(is_actual_gif("https://cdn.example.com/a_gif.webp"));
    }

    #[test]
    fn ordinary_jpg_is_not_gif() {
        assert!(!is_actual_gif("https://cdn.example.com/photo.jpg"));
    }

    #[test]
    fn analyze_structure_classifies_image_and_text() {
        let html = r#"
            <html><body>
                <div class="se-component se-text"><p>안녕하세요 반갑습니다</p></div>
                <div class="se-component se-image"><img src="https://postfiles.pstatic.net/a.jpg"></div>
                <div class="se-component se-image"><img src="https://cdn.example.com/b.gifv"></div>
            </body></html>
        "#;
        let doc = Document::parse(html);
        let (components, counts) = analyze_structure(&doc);
        assert_eq!(components.len(), 3);
        assert_eq!(counts.images, 1);
        assert_eq!(counts.gifs, 1);
        assert!(matches!(components[0], ContentStructureComponent::Text { .. }));
    }

    #[test]
    fn analyze_structure_counts_gallery_images_minus_gifs() {
        let html = r#"
            <html><body>
                <div class="se-component se-gallery">
                    <img src="https://postfiles.pstatic.net/a.jpg">
                    <img src="https://cdn.example.com/b.gifv">
                    <img src="https://postfiles.pstatic.net/c.jpg">
                </div>
            </body></html>
        "#;
        let doc = Document::parse(html);
        let (_components, counts) = analyze_structure(&doc);
        assert_eq!(counts.images, 2);
        assert_eq!(counts.gifs, 1);
    }

    #[test]
    fn analyze_structure_prefers_explicit_video_count() {
        let html = r#"
            <html><body>
                <div class="se-component se-video"><iframe src="https://youtube.com/embed/x"></iframe></div>
            </body></html>
        "#;
        let doc = Document::parse(html);
        let (_components, counts) = analyze_structure(&doc);
        assert_eq!(counts.videos, 1);
    }

    #[test]
    fn extract_body_text_prefers_text_modules_excluding_title() {
        let html = r#"
            <html><body>
                <div class="se-component se-text se-title-text"><p>제목입니다</p></div>
                <div class="se-component se-text"><p>본문 내용입니다</p></div>
            </body></html>
        "#;
        let doc = Document::parse(html);
        let text = extract_body_text(&doc);
        assert!(text.contains("본문 내용입니다"));
        assert!(!text.contains("제목입니다"));
    }

    #[test]
    fn extract_hashtags_prefers_dedicated_element() {
        let html = r#"<html><body><span class="__se-hash-tag">#강아지</span><span class="__se-hash-tag">#사료추천</span></body></html>"#;
        let doc = Document::parse(html);
        let tags = extract_hashtags(&doc, "");
        assert_eq!(tags, vec!["사료추천".to_string(), "강아지".to_string()]);
    }

    #[test]
    fn extract_hashtags_falls_back_to_body_text_regex() {
        let html = "<html><body></body></html>";
        let doc = Document::parse(html);
        let tags = extract_hashtags(&doc, "오늘의 추천템 #강아지사료 #산책코스 #1");
        assert!(tags.contains(&"강아지사료".to_string()));
        assert!(tags.contains(&"산책코스".to_string()));
        assert!(!tags.contains(&"1".to_string()));
    }

    #[test]
    fn extract_hashtags_filters_generic_and_hex_tokens() {
        let html = "<html><body></body></html>";
        let doc = Document::parse(html);
        let tags = extract_hashtags(&doc, "#일상 #ff00aa #강아지산책기록");
        assert!(!tags.contains(&"일상".to_string()));
        assert!(!tags.contains(&"ff00aa".to_string()));
        assert!(tags.contains(&"강아지산책기록".to_string()));
    }

    #[test]
    fn stripped_char_count_ignores_whitespace() {
        assert_eq!(stripped_char_count("안녕 하세요  "), 4);
    }
}

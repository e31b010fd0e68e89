//! JSON post-processing policy shared by every stage: strip a markdown code
//! fence, then parse under the stage's declared schema, falling back to
//! heuristic extraction only for title ideation.

use crate::model::TitleCandidate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Strips a leading/trailing triple-backtick fence (with optional `json`
/// language tag). Idempotent: applying it twice is the same as once.
pub fn strip_markdown_fence(s: &str) -> String {
    let trimmed = s.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim().to_string()
}

static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+[\.\)]|[-*•])\s*(.+)$").expect("static pattern is valid"));

/// Best-effort extraction of up to 10 plain titles from free text when the
/// declared-JSON parse fails. No paired search queries are recoverable this
/// way, per spec — callers pair an empty query.
pub fn extract_titles_heuristically(text: &str) -> Vec<TitleCandidate> {
    text.lines()
        .filter_map(|line| {
            let caps = NUMBERED_LINE.captures(line)?;
            let candidate = caps.get(1)?.as_str().trim();
            if candidate.is_empty() {
                None
            } else {
                Some(TitleCandidate {
                    title: candidate.to_string(),
                    search_query: String::new(),
                })
            }
        })
        .take(10)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_fence_removes_json_tag() {
        let input = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_markdown_fence(input), "{\"a\":1}");
    }

    #[test]
    fn strip_fence_removes_plain_fence() {
        let input = "```\n{\"a\":1}\n```";
        assert_eq!(strip_markdown_fence(input), "{\"a\":1}");
    }

    #[test]
    fn strip_fence_is_noop_without_fence() {
        assert_eq!(strip_markdown_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn strip_fence_is_idempotent() {
        let input = "```json\n{\"a\":1}\n```";
        let once = strip_markdown_fence(input);
        let twice = strip_markdown_fence(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn extract_titles_from_numbered_list() {
        let text = "1. 강아지 산책 꿀팁\n2. 강아지 사료 고르는 법\n3) 강아지 미용 주기";
        let titles = extract_titles_heuristically(text);
        assert_eq!(titles.len(), 3);
        assert_eq!(titles[0].title, "강아지 산책 꿀팁");
        assert_eq!(titles[0].search_query, "");
    }

    #[test]
    fn extract_titles_caps_at_ten() {
        let text = (1..=15)
            .map(|i| format!("{i}. 제목 {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(extract_titles_heuristically(&text).len(), 10);
    }

    #[test]
    fn extract_titles_ignores_non_numbered_lines() {
        let text = "아래 제목들을 확인하세요:\n1. 첫 번째 제목\n감사합니다.";
        let titles = extract_titles_heuristically(text);
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].title, "첫 번째 제목");
    }
}

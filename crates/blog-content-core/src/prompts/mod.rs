//! Pure functions that, given a stage and fully-typed inputs, produce the
//! exact prompt string and declare the expected response shape. Same
//! inputs always yield byte-identical prompts — no provider calls happen
//! here.

pub mod guidelines;
pub mod parsing;

use crate::model::{CompetitorPost, ContentKind, KeywordInput, SelectedTitle, WritingSettings};
use guidelines::{content_guideline, review_detail_guideline, tone_guideline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

fn content_kind_label(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Review => "후기/리뷰형",
        ContentKind::Guide => "정보/가이드형",
        ContentKind::Comparison => "비교/추천형",
    }
}

/// Stage T: title ideation. Demands 10 titles, each with a paired 2-4-word
/// search query, 30-60 chars, no emoji, no explicit year numerals.
pub fn build_title_prompt(settings: &WritingSettings, keyword_input: &KeywordInput) -> (String, ResponseFormat) {
    let guideline = content_guideline(settings.content_kind);
    let sub_keywords = keyword_input.sub_keywords.join(", ");

    let mut prompt = format!(
        "당신은 네이버 블로그 SEO에 능숙한 콘텐츠 전략가입니다.\n\n\
         메인 키워드: {main}\n",
        main = keyword_input.main_keyword
    );
    if !sub_keywords.is_empty() {
        prompt.push_str(&format!("서브 키워드: {sub_keywords}\n"));
    }
    prompt.push_str(&format!(
        "콘텐츠 유형: {kind} ({approach})\n\
         추천 키워드: {keywords}\n",
        kind = content_kind_label(settings.content_kind),
        approach = guideline.approach,
        keywords = guideline.keywords.join(", "),
    ));

    if let Some(subtype) = settings.effective_review_subtype() {
        let detail = review_detail_guideline(subtype);
        prompt.push_str(&format!(
            "리뷰 세부 유형 설명: {description}\n유의사항: {transparency}\n",
            description = detail.description,
            transparency = detail.transparency,
        ));
    }

    prompt.push_str(
        "\n아래 규칙을 지켜 제목 10개를 제안해주세요:\n\
         1. 키워드가 자연스럽게 포함될 것\n\
         2. 클릭을 유도하는 호기심 자극 문구 포함\n\
         3. 30-60자 내외 권장\n\
         4. 콘텐츠 유형의 특성을 반영할 것\n\
         5. 네이버 SEO에 최적화될 것\n\
         6. 이모티콘 사용 금지\n\
         7. 구체적 년도 표기 금지 (2024, 2025 등 특정 년도 사용 금지. '최신', '현재' 등으로 대체)\n\
         각 제목에는 2-4개 단어로 조합된 검색어를 함께 제시하세요.\n\n\
         다음 JSON 형식으로만 응답하세요:\n\
         {\"titles_with_search\": [{\"title\": \"...\", \"search_query\": \"...\"}, ...]} (10개)\n",
    );

    (prompt, ResponseFormat::Json)
}

/// Stage D: competitor title curation from up to 30 discovered titles.
pub fn build_curation_prompt(
    selected_title: &SelectedTitle,
    effective_search_query: &str,
    main_keyword: &str,
    sub_keywords: &[String],
    content_kind: ContentKind,
    competitor_titles: &[String],
) -> (String, ResponseFormat) {
    let numbered = competitor_titles
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, t))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "아래는 '{query}' 검색으로 찾은 블로그 제목 목록입니다.\n\n\
         목표 제목: {title}\n메인 키워드: {main_keyword}\n콘텐츠 유형: {kind}\n\n\
         {numbered}\n\n\
         다음 기준으로 관련성 높은 제목 최대 10개를 선별하세요:\n\
         1. 목표 제목과의 주제적 연관성\n\
         2. 메인 키워드와의 연관성\n\
         3. 콘텐츠 유형에 맞는 접근 방식인지\n\
         4. 구체적이고 실용적인 정보를 담고 있을 가능성\n\
         5. 광고성 글처럼 보이지 않을 것\n",
        query = effective_search_query,
        title = selected_title.candidate.title,
        kind = content_kind_label(content_kind),
        numbered = numbered,
    );
    if !sub_keywords.is_empty() {
        prompt.push_str(&format!(
            "6. 서브 키워드({})와의 연관성\n",
            sub_keywords.join(", ")
        ));
    }
    prompt.push_str(&format!(
        "\n다음 JSON 형식으로만 응답하세요 (관련성 높은 순, 최대 10개):\n\
         {{\"selected_titles\": [{{\"rank\": 1, \"original_index\": N, \"title\": \"...\", \"relevance_reason\": \"...\"}}, ...]}}\n",
    ));
    let _ = main_keyword; // surfaced via selected_title/content_kind context above
    (prompt, ResponseFormat::Json)
}

/// Tags/image-count summary of the analyzed competitor set, used by
/// `build_writing_prompt`. The fallback constants below apply only when
/// `posts` is empty, never when the computed mean merely falls low.
pub struct CompetitorStats {
    pub avg_image_count: u32,
    pub avg_tag_count: u32,
    pub common_tags: Vec<String>,
}

pub fn compute_competitor_stats(posts: &[CompetitorPost]) -> CompetitorStats {
    if posts.is_empty() {
        return CompetitorStats {
            avg_image_count: 3,
            avg_tag_count: 5,
            common_tags: Vec::new(),
        };
    }
    let n = posts.len() as u32;
    let total_images: u32 = posts.iter().map(|p| p.image_count).sum();
    let total_tags: u32 = posts.iter().map(|p| p.hashtags.len() as u32).sum();

    let mut tag_counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for post in posts {
        for tag in &post.hashtags {
            *tag_counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    let mut common: Vec<(&str, usize)> = tag_counts.into_iter().collect();
    common.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let common_tags = common.into_iter().take(5).map(|(t, _)| t.to_string()).collect();

    CompetitorStats {
        avg_image_count: total_images / n,
        avg_tag_count: total_tags / n,
        common_tags,
    }
}

/// Stage S: summarization. Free text with five fixed Korean section headers.
pub fn build_summary_prompt(
    selected_title: &SelectedTitle,
    effective_search_query: &str,
    main_keyword: &str,
    sub_keywords: &[String],
    content_kind: ContentKind,
    competitor_posts: &[CompetitorPost],
) -> (String, ResponseFormat) {
    let blocks: Vec<serde_json::Value> = competitor_posts
        .iter()
        .enumerate()
        .map(|(i, post)| {
            let truncated: String = post.body_text.chars().take(2000).collect();
            serde_json::json!({
                "blog_number": i + 1,
                "title": post.reference.title,
                "content": truncated,
            })
        })
        .collect();

    let mut target_info = serde_json::json!({
        "selected_title": selected_title.candidate.title,
        "search_query": effective_search_query,
        "main_keyword": main_keyword,
        "content_type": content_kind_label(content_kind),
    });
    if !sub_keywords.is_empty() {
        target_info["sub_keywords"] = serde_json::Value::String(sub_keywords.join(", "));
    }

    let input_data = serde_json::json!({
        "target_info": target_info,
        "competitor_blogs": blocks,
    });
    let input_json = serde_json::to_string_pretty(&input_data).unwrap_or_default();

    let prompt = format!(
        "다음은 경쟁 블로그 분석을 위한 데이터입니다:\n\n{input_json}\n\n\
         위 데이터를 분석하여 아래 5개 항목으로 정리해주세요. 각 항목은 반드시 아래 제목 그대로 사용하세요:\n\n\
         ## 1. 경쟁 블로그 제목들\n\
         ## 2. 핵심 키워드\n\
         ## 3. 필수 내용\n\
         ## 4. 주요 포인트\n\
         ## 5. 부족한 점\n",
    );

    (prompt, ResponseFormat::Text)
}

/// Stage W: final article writing. The selected title is repeated with
/// "do not alter" framing; the summary is embedded verbatim.
pub fn build_writing_prompt(
    settings: &WritingSettings,
    keyword_input: &KeywordInput,
    selected_title: &SelectedTitle,
    effective_search_query: &str,
    competitor_stats: &CompetitorStats,
    summary: Option<&str>,
) -> (String, ResponseFormat) {
    let guideline = content_guideline(settings.content_kind);
    let tone = tone_guideline(settings.tone);
    let title = &selected_title.candidate.title;

    let role_description = match &settings.blogger_identity {
        Some(identity) if !identity.trim().is_empty() => {
            format!("당신은 '{identity}'(으)로 활동하는 블로거입니다.")
        }
        _ => "당신은 인기 있는 글을 쓰는 블로거입니다.".to_string(),
    };

    let competitor_section = match summary {
        Some(text) if !text.trim().is_empty() => format!("경쟁 블로그 분석 요약:\n{text}\n"),
        _ => "참고할 만한 경쟁사 분석 정보가 없으니, 자연스럽고 유용한 컨텐츠로 작성해주세요.\n".to_string(),
    };

    let mut prompt = format!(
        "{role_description}\n\n\
         {competitor_section}\n\
         🚨 절대 규칙: 제목 고정 🚨\n\
         제목: {title}\n\
         제목: {title}\n\
         제목: {title}\n\
         이 제목을 1글자도 바꾸지 말고 정확히 그대로 출력하세요.\n\n\
         기본 정보:\n\
         - 제목: {title}\n\
         - 메인 키워드: {main_keyword}\n\
         - 검색어: {query}\n",
        main_keyword = keyword_input.main_keyword,
        query = effective_search_query,
    );

    if keyword_input.sub_keywords.is_empty() {
        prompt.push_str("- 서브 키워드: 없음 (본문과 어울리는 키워드 3-5개를 직접 생성해 사용)\n");
    } else {
        prompt.push_str(&format!("- 서브 키워드: {}\n", keyword_input.sub_keywords.join(", ")));
    }
    prompt.push_str(&format!(
        "- 콘텐츠 유형: {kind} ({approach})\n",
        kind = content_kind_label(settings.content_kind),
        approach = guideline.approach,
    ));

    if let Some(subtype) = settings.effective_review_subtype() {
        let detail = review_detail_guideline(subtype);
        prompt.push_str(&format!(
            "\n리뷰 세부 유형:\n- 설명: {description}\n- 핵심 포인트: {points}\n- 유의사항: {transparency}\n",
            description = detail.description,
            points = detail.key_points.join(" / "),
            transparency = detail.transparency,
        ));
    }

    prompt.push_str(&format!(
        "\n문체 가이드:\n\
         - 스타일: {style}\n\
         - 예시 표현: {examples}\n\
         - 어미: {ending}\n\
         - 문장 스타일: {sentence_style}\n\
         - 핵심 특징: {key_features}\n",
        style = tone.style,
        examples = tone.examples.join(", "),
        ending = tone.ending,
        sentence_style = tone.sentence_style,
        key_features = tone.key_features.join(", "),
    ));

    prompt.push_str(&format!(
        "\n콘텐츠 구조:\n\
         - 구조: {structure}\n\
         - 중점 영역: {focus_areas}\n\
         - 관련 키워드: {keywords}\n",
        structure = guideline.structure,
        focus_areas = guideline.focus_areas.join(", "),
        keywords = guideline.keywords.join(", "),
    ));

    prompt.push_str(&format!(
        "\nSEO/기술 요구사항:\n\
         - 공백 제외 1700-2000자 분량\n\
         - 메인 키워드 5-6회 반복\n\
         - 서브 키워드 각 3-4회 반복\n\
         - \"(이미지)\" 표시 {image_count}개 내외 배치 (연속 최대 4개까지 허용)\n\
         - \"(동영상)\" 표시 정확히 1개 배치\n",
        image_count = competitor_stats.avg_image_count,
    ));

    prompt.push_str(
        "\n작성 품질 요구사항:\n\
         - 자연스럽고 사람이 쓴 것처럼 보이는 문체 (AI 티 금지)\n\
         - 'XX', 'OO' 같은 플레이스홀더 금지, 대신 '근처 공원'처럼 구체적인 일반 명사 사용\n",
    );

    prompt.push_str(&format!(
        "\n🚨 제목 변경 절대 금지 🚨\n\n\
         다음 형식으로 출력하세요:\n\
         제목: {title}\n\
         (본문: 소제목+본문 / 체크리스트 / 비교표 / TOP5 순위 / 단계별 가이드 / Q&A 형식을 적절히 조합)\n\n\
         추천 태그: ",
    ));
    if !competitor_stats.common_tags.is_empty() {
        prompt.push_str(&format!(
            "[상위 블로그 인기 태그 참고: {}]",
            competitor_stats
                .common_tags
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    prompt.push_str(" (메인/서브 키워드를 섞어 5개 이상)\n");

    (prompt, ResponseFormat::Text)
}

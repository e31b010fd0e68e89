//! Pure predicates rejecting advertorial, sponsored, or low-information
//! competitor posts. The keyword/pattern set below is part of the contract:
//! adding or removing terms changes behavior, and is transcribed verbatim
//! from the original implementation rather than re-derived.

use once_cell::sync::Lazy;
use regex::Regex;

const AD_KEYWORDS: &[&str] = &[
    "광고포스트", "광고 포스트", "광고글", "광고 글", "광고입니다", "광고 입니다",
    "유료광고", "유료 광고", "파트너스", "쿠팡파트너스", "파트너 활동", "추천링크",
    "협찬", "협찬받", "협찬글", "협찬 글", "협찬으로", "협찬을", "제공받", "무료로 제공",
    "브랜드로부터", "업체로부터", "해당업체", "해당 업체", "제품을 제공", "서비스를 제공",
    "제공받아", "제공받은", "지원을 받아", "지원받아", "업체에서 제공", "업체로부터 제품",
    "체험단", "체험 단", "리뷰어", "체험후기", "체험 후기", "체험해보", "체험을",
    "무료체험", "무료 체험", "서포터즈", "앰배서더", "인플루언서",
    "원고료", "대가", "소정의", "혜택을", "증정", "무료로 받", "공짜로",
    "할인코드", "쿠폰", "프로모션", "이벤트 참여",
];

const AD_PATTERNS: &[&str] = &[
    r".*제공받.*작성.*",
    r".*협찬.*받.*글.*",
    r".*무료.*받.*후기.*",
    r".*체험.*참여.*",
    r".*광고.*포함.*",
    r".*업체.*지원.*받.*",
    r".*업체.*제품.*제공.*",
];

static AD_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    AD_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("static ad pattern is valid"))
        .collect()
});

static NUMBERS_AND_SYMBOLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9\s\-,()원₩.+#]").expect("static pattern is valid"));

static NON_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[가-힣ㄱ-ㅎㅏ-ㅣa-zA-Z0-9\s]").expect("static pattern is valid"));

static REPEATED_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)\1{4,}").expect("static pattern is valid"));

/// True when the lowercased (body + title) matches a sponsorship/advertorial
/// keyword or regex pattern.
pub fn is_advertisement(body: &str, title: &str) -> bool {
    if body.is_empty() {
        return false;
    }
    let full_text = format!("{body} {title}").to_lowercase();

    if AD_KEYWORDS.iter().any(|kw| full_text.contains(kw)) {
        return true;
    }
    AD_REGEXES.iter().any(|re| re.is_match(&full_text))
}

/// True for texts >= 100 chars when digits/punctuation dominate, special
/// characters exceed 15%, or a character repeats 5+ times consecutively.
/// Texts shorter than 100 chars are never flagged here.
pub fn is_low_quality(text: &str) -> bool {
    let cleaned = text.trim();
    if cleaned.chars().count() < 100 {
        return false;
    }

    let len = cleaned.chars().count() as f64;

    let numbers_and_symbols = NUMBERS_AND_SYMBOLS.replace_all(cleaned, "");
    let meaningful_ratio = numbers_and_symbols.chars().count() as f64 / len;
    if meaningful_ratio < 0.3 {
        return true;
    }

    let special_chars = NON_SPECIAL.replace_all(cleaned, "");
    let special_ratio = special_chars.chars().count() as f64 / len;
    if special_ratio > 0.15 {
        return true;
    }

    REPEATED_CHAR.is_match(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_not_advertisement() {
        assert!(!is_advertisement("", "제목"));
    }

    #[test]
    fn detects_sponsorship_keyword() {
        assert!(is_advertisement("이 제품은 업체로부터 제공받아 작성한 후기입니다", ""));
    }

    #[test]
    fn detects_ad_pattern_without_exact_keyword() {
        assert!(is_advertisement("해당 제품은 협찬을 받아서 쓴 글입니다", ""));
    }

    #[test]
    fn ordinary_text_is_not_advertisement() {
        assert!(!is_advertisement("오늘은 강아지와 산책을 다녀왔습니다. 날씨가 참 좋았어요.", "산책 후기"));
    }

    #[test]
    fn short_text_is_never_low_quality() {
        assert!(!is_low_quality("짧은 글입니다."));
    }

    #[test]
    fn numeric_listing_is_low_quality() {
        let text = "010-1234-5678, 02-123-4567, 031-555-1234, 1,000원, 2,000원, 3,000원 (문의: 010-1111-2222) ".repeat(2);
        assert!(is_low_quality(&text));
    }

    #[test]
    fn excessive_special_characters_is_low_quality() {
        let text = "!@#$%^&*()_+=-[]{}|;':\",./<>?~`".repeat(10)
            + &"가나다라".repeat(5);
        assert!(is_low_quality(&text));
    }

    #[test]
    fn repeated_character_run_is_low_quality() {
        let text = "정말 좋은 제품이에요 ㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋㅋ 추천합니다 정말 강추 ".repeat(2);
        assert!(is_low_quality(&text));
    }

    #[test]
    fn natural_korean_paragraph_is_not_low_quality() {
        let text = "오늘은 새로 산 블루투스 이어폰을 한 달 동안 사용해본 솔직한 후기를 남겨보려고 합니다. \
                    음질은 기대 이상으로 만족스러웠고, 배터리도 하루 종일 사용해도 충분했습니다. \
                    다만 귀에 맞지 않는 이어팁이 기본으로 들어있어서 따로 구매해야 했던 점은 조금 아쉬웠습니다.";
        assert!(!is_low_quality(text));
    }
}

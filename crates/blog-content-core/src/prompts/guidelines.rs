//! Static Korean guideline tables consumed by the writing prompt. These are
//! part of the contract in the same sense as `quality`'s keyword sets: the
//! exact Korean phrasing is transcribed from the original implementation,
//! not paraphrased, because downstream prompt-content tests assert on it.

use crate::model::{ContentKind, ReviewSubtype, Tone};

pub struct ContentGuideline {
    pub approach: &'static str,
    pub structure: &'static str,
    pub keywords: &'static [&'static str],
    pub focus_areas: &'static [&'static str],
}

pub fn content_guideline(kind: ContentKind) -> ContentGuideline {
    match kind {
        ContentKind::Review => ContentGuideline {
            approach: "개인 경험과 솔직한 후기를 중심으로 '유일무이한 콘텐츠' 작성",
            structure: "사용 전 고민 → 직접 사용 경험 → 장단점 솔직 후기 → 최종 평가 및 추천",
            keywords: &["후기", "리뷰", "장단점", "추천", "솔직한"],
            focus_areas: &["개인 경험", "구체적 사용감", "장단점 비교", "최종 추천 여부"],
        },
        ContentKind::Guide => ContentGuideline {
            approach: "독자가 바로 실행할 수 있는 정보와 노하우를 체계적으로 전달",
            structure: "문제 제기 → 핵심 정보/노하우 → 단계별 설명 → 요약 및 팁",
            keywords: &["가이드", "방법", "정보", "노하우", "팁"],
            focus_areas: &["실용성", "단계별 설명", "구체적 수치", "초보자 친화"],
        },
        ContentKind::Comparison => ContentGuideline {
            approach: "여러 선택지를 객관적 기준으로 비교하여 최적의 선택을 돕는 콘텐츠 작성",
            structure: "비교 기준 제시 → 선택지별 장단점 → 비교표 → 상황별 추천",
            keywords: &["비교", "추천", "순위", "BEST", "선택 기준"],
            focus_areas: &["객관적 기준", "비교표", "상황별 추천", "가성비"],
        },
    }
}

pub struct ReviewDetailGuideline {
    pub description: &'static str,
    pub key_points: &'static [&'static str],
    pub transparency: &'static str,
}

pub fn review_detail_guideline(subtype: ReviewSubtype) -> ReviewDetailGuideline {
    match subtype {
        ReviewSubtype::OwnPurchase => ReviewDetailGuideline {
            description: "직접 구매하여 사용해본 경험을 바탕으로 한 솔직한 후기",
            key_points: &["직접 구매 이유와 고민 과정을 먼저 서술", "실사용 경험 중심 서술", "가격 대비 만족도 언급"],
            transparency: "구매 사실을 자연스럽게 밝혀도 무방함",
        },
        ReviewSubtype::Sponsored => ReviewDetailGuideline {
            description: "업체로부터 제품/서비스를 협찬받아 작성하는 후기",
            key_points: &["협찬받았다는 사실을 본문 제일 첫번째에 명시", "객관적인 장단점 서술 유지", "과도한 홍보성 표현 지양"],
            transparency: "절대 '구매했다', '샀다' 등의 표현 사용 금지",
        },
        ReviewSubtype::Trial => ReviewDetailGuideline {
            description: "체험단으로 선정되어 무료로 체험해보고 작성하는 후기",
            key_points: &["체험단으로 제공받았다는 사실을 본문 제일 첫번째에 명시", "체험 기간과 조건을 자연스럽게 언급", "솔직한 사용 경험 전달"],
            transparency: "절대 '구매했다', '샀다' 등의 표현 사용 금지",
        },
        ReviewSubtype::Rental => ReviewDetailGuideline {
            description: "대여/렌탈 서비스를 통해 제공받아 작성하는 후기",
            key_points: &["대여/렌탈로 제공받았다는 사실을 본문 제일 첫번째에 명시", "대여 기간 중 사용 경험 위주로 서술", "반납 조건 등은 자연스럽게만 언급"],
            transparency: "절대 '구매했다', '샀다' 등의 표현 사용 금지",
        },
    }
}

pub struct ToneGuideline {
    pub style: &'static str,
    pub examples: &'static [&'static str],
    pub ending: &'static str,
    pub sentence_style: &'static str,
    pub key_features: &'static [&'static str],
}

pub fn tone_guideline(tone: Tone) -> ToneGuideline {
    match tone {
        Tone::CasualInformal => ToneGuideline {
            style: "친구에게 이야기하듯 편안하고 친근한 반말체",
            examples: &["~했어", "~인 것 같아", "진짜 좋더라"],
            ending: "~했어 / ~더라 / ~인듯",
            sentence_style: "짧고 경쾌한 문장 위주, 감탄사 활용",
            key_features: &["친근함", "생동감", "솔직한 감정 표현"],
        },
        Tone::PoliteFormal => ToneGuideline {
            style: "예의를 갖춘 정중한 존댓말체",
            examples: &["~합니다", "~였습니다", "~해보시기 바랍니다"],
            ending: "~습니다 / ~입니다",
            sentence_style: "정돈된 문장, 객관적 서술 위주",
            key_features: &["신뢰감", "전문성", "정보 전달력"],
        },
        Tone::FriendlyPolite => ToneGuideline {
            style: "친근하면서도 예의를 갖춘 존댓말체",
            examples: &["~해요", "~했어요", "~좋더라구요"],
            ending: "~해요 / ~이에요 / ~네요",
            sentence_style: "부드럽고 따뜻한 문장, 공감 표현 활용",
            key_features: &["친근함과 예의의 균형", "공감대 형성", "부드러운 어조"],
        },
    }
}

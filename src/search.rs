//! 검색·필터 엔진
//!
//! 검색 조건을 정규화 데이터셋에 적용한다. 모든 조건은 AND 결합이며,
//! 설비명 검색은 단어 토큰 기반 한/영 혼용 매칭을 쓴다.

use crate::category::is_separator;
use crate::dataset::Record;
use crate::mappings::{CategoryMappings, TermMappings};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    /// 단어 토큰: 영숫자·한글 음절의 연속 구간
    static ref TOKEN_PATTERN: Regex = Regex::new(r"[a-z0-9가-힣]+").unwrap();
}

/// 검색 조건 (모든 필드는 공백이면 미적용)
#[derive(Debug, Clone, Default)]
pub struct SearchSelection {
    /// 설비번호 부분 일치
    pub equipment_no: String,
    /// 오더번호 부분 일치
    pub order_no: String,
    /// 설비명/오더명 단어 토큰 검색
    pub equipment_name: String,
    /// 상위 분류 (설비호기)
    pub top_category: String,
    /// 중위 분류 (작업반 별칭)
    pub middle_category: String,
    /// 하위 분류 (설비유형)
    pub sub_category: String,
    /// 첨부 링크 있는 오더만
    pub with_links: bool,
    /// 상세내역(자재·작업자) 검색어
    pub detail_query: String,
}

/// 텍스트를 소문자 단어 토큰으로 분해
///
/// 특수문자·공백 경계로 잘라 각 토큰을 독립 단어로 취급한다.
/// 예: "SLP-C Pump" → ["slp", "c", "pump"]
pub fn extract_word_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// 검색 토큰별 동치 집합 (토큰 자신 + 한/영 대응어)
fn expand_tokens(tokens: &[String], terms: &TermMappings) -> Vec<HashSet<String>> {
    tokens
        .iter()
        .map(|token| {
            let mut set: HashSet<String> = HashSet::new();
            set.insert(token.clone());
            for equivalent in terms.equivalents(token) {
                set.insert(equivalent);
            }
            set
        })
        .collect()
}

/// 모든 검색 토큰 집합이 본문 토큰에서 하나 이상 일치하는지
///
/// "slp c"는 "SLP-C"(→ ["slp","c"])와 일치하지만, "c"가 독립 단어로
/// 없는 "SLP COUPLING"(→ ["slp","coupling"])과는 일치하지 않는다.
fn contains_all_token_sets(text_tokens: &[String], token_sets: &[HashSet<String>]) -> bool {
    token_sets.iter().all(|set| {
        text_tokens
            .iter()
            .any(|candidate| set.contains(candidate.as_str()))
    })
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// 검색 조건을 적용해 일치하는 레코드를 입력 순서대로 돌려준다.
pub fn apply_filters<'a>(
    records: &'a [Record],
    selection: &SearchSelection,
    category_mappings: &CategoryMappings,
    terms: &TermMappings,
) -> Vec<&'a Record> {
    let mut filtered: Vec<&Record> = records.iter().collect();

    let equipment_no = selection.equipment_no.trim();
    if !equipment_no.is_empty() {
        filtered.retain(|r| contains_ci(&r.equipment, equipment_no));
    }

    let order_no = selection.order_no.trim();
    if !order_no.is_empty() {
        filtered.retain(|r| contains_ci(&r.order_no, order_no));
    }

    let equipment_name = selection.equipment_name.trim();
    if !equipment_name.is_empty() {
        let search_tokens = extract_word_tokens(equipment_name);
        if !search_tokens.is_empty() {
            let token_sets = expand_tokens(&search_tokens, terms);
            filtered.retain(|r| {
                let short_tokens = extract_word_tokens(&r.order_short_text);
                if contains_all_token_sets(&short_tokens, &token_sets) {
                    return true;
                }
                let equi_tokens = extract_word_tokens(&r.equi_text);
                contains_all_token_sets(&equi_tokens, &token_sets)
            });
        }
    }

    let top_category = selection.top_category.trim();
    if !top_category.is_empty() && !is_separator(top_category) {
        let included = category_mappings.categories_to_include(top_category);
        filtered.retain(|r| included.iter().any(|c| c == r.cost_center_text.trim()));
    }

    let middle_category = selection.middle_category.trim();
    if !middle_category.is_empty() {
        filtered.retain(|r| r.workctr_alias == middle_category);
    }

    let sub_category = selection.sub_category.trim();
    if !sub_category.is_empty() {
        filtered.retain(|r| r.object_type_text.trim() == sub_category);
    }

    if selection.with_links {
        filtered.retain(|r| r.has_link);
    }

    let detail_query = selection.detail_query.trim();
    if !detail_query.is_empty() {
        // 행 단위 일치를 오더 단위로 승격: 한 행이라도 맞으면
        // 그 오더의 모든 행이 통과한다.
        let matching_orders: HashSet<&str> = filtered
            .iter()
            .filter(|r| {
                contains_ci(&r.material, detail_query)
                    || contains_ci(&r.material_desc, detail_query)
                    || contains_ci(&r.worker_name, detail_query)
            })
            .map(|r| r.order_no.as_str())
            .collect();
        filtered.retain(|r| matching_orders.contains(r.order_no.as_str()));
    }

    filtered
}

/// 제한 적용 전의 고유 오더 수 (결과 "N건 중 M건" 표시용)
pub fn count_distinct_orders(filtered: &[&Record]) -> usize {
    let orders: HashSet<&str> = filtered.iter().map(|r| r.order_no.as_str()).collect();
    orders.len()
}

/// 설비번호 필터가 있을 때 첫 일치 레코드의 (설비번호, 설비명)
pub fn equipment_info<'a>(
    filtered: &[&'a Record],
    equipment_no: &str,
) -> Option<(&'a str, &'a str)> {
    let needle = equipment_no.trim();
    if needle.is_empty() {
        return None;
    }
    filtered
        .iter()
        .find(|r| contains_ci(&r.equipment, needle))
        .map(|r| (r.equipment.as_str(), r.equi_text.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CanonicalDataset;

    fn terms() -> TermMappings {
        TermMappings::from_pairs(
            vec![("펌프".to_string(), "pump".to_string())].into_iter(),
        )
    }

    fn record(order_no: &str, short_text: &str, equi_text: &str) -> Record {
        Record {
            order_no: order_no.to_string(),
            order_short_text: short_text.to_string(),
            equi_text: equi_text.to_string(),
            short_text: "내용".to_string(),
            ..Default::default()
        }
    }

    fn run_name_filter<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
        let selection = SearchSelection {
            equipment_name: query.to_string(),
            ..Default::default()
        };
        apply_filters(records, &selection, &CategoryMappings::default(), &terms())
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(extract_word_tokens("SLP-C Pump"), vec!["slp", "c", "pump"]);
        assert_eq!(
            extract_word_tokens("[정산] CC#56 SLP-C 외주"),
            vec!["정산", "cc", "56", "slp", "c", "외주"]
        );
        assert!(extract_word_tokens("--- !!").is_empty());
    }

    #[test]
    fn test_word_match_not_substring() {
        let records = vec![
            record("1", "SLP-C Pump 점검", ""),
            record("2", "SLP COUPLING 교체", ""),
        ];

        // "c"는 독립 단어로 존재해야 한다: "coupling"의 부분 문자열로는 불일치
        let matched = run_name_filter(&records, "slp c");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].order_no, "1");
    }

    #[test]
    fn test_bilingual_match_both_directions() {
        let records = vec![
            record("1", "급수 펌프 정비", ""),
            record("2", "Feed Water Pump Overhaul", ""),
        ];

        assert_eq!(run_name_filter(&records, "pump").len(), 2);
        assert_eq!(run_name_filter(&records, "펌프").len(), 2);
    }

    #[test]
    fn test_name_match_either_field() {
        let records = vec![
            record("1", "정기 점검", "SLP Screen Wash Pump"),
            record("2", "정기 점검", "콘덴서"),
        ];

        // Order Short Text 또는 Equi. Text 한쪽만 전부 일치해도 통과
        let matched = run_name_filter(&records, "slp pump");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].order_no, "1");
    }

    #[test]
    fn test_substring_filters_case_insensitive() {
        let mut rec = record("WO-100", "", "");
        rec.equipment = "20007936".to_string();
        let records = vec![rec];

        let selection = SearchSelection {
            order_no: "wo-1".to_string(),
            equipment_no: "0079".to_string(),
            ..Default::default()
        };
        let matched = apply_filters(
            &records,
            &selection,
            &CategoryMappings::default(),
            &terms(),
        );
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_top_category_umbrella_inclusion() {
        let mappings = CategoryMappings::from_json(
            r#"{"category_includes": {"인천복합발전3호기": ["공통설비"]}}"#,
        )
        .unwrap();

        let mut a = record("1", "", "");
        a.cost_center_text = "인천복합발전3호기".to_string();
        let mut b = record("2", "", "");
        b.cost_center_text = "공통설비".to_string();
        let mut c = record("3", "", "");
        c.cost_center_text = "인천복합발전4호기".to_string();
        let records = vec![a, b, c];

        let selection = SearchSelection {
            top_category: "인천복합발전3호기".to_string(),
            ..Default::default()
        };
        let matched = apply_filters(&records, &selection, &mappings, &terms());
        let orders: Vec<&str> = matched.iter().map(|r| r.order_no.as_str()).collect();
        assert_eq!(orders, vec!["1", "2"]);
    }

    #[test]
    fn test_separator_top_category_ignored() {
        let mut rec = record("1", "", "");
        rec.cost_center_text = "가스터빈동".to_string();
        let records = vec![rec];

        let selection = SearchSelection {
            top_category: "─".repeat(20),
            ..Default::default()
        };
        let matched = apply_filters(
            &records,
            &selection,
            &CategoryMappings::default(),
            &terms(),
        );
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_with_links_filter() {
        let mut linked = record("1", "", "");
        linked.long_text = "자료 http://x.example.com/a?b=1 참고".to_string();
        let plain = record("2", "", "");

        // 파생 컬럼(has_link)을 채우려면 스냅샷 빌드를 거친다
        let dataset = CanonicalDataset::build(vec![linked, plain]);

        let selection = SearchSelection {
            with_links: true,
            ..Default::default()
        };
        let matched = apply_filters(
            dataset.records(),
            &selection,
            &CategoryMappings::default(),
            &terms(),
        );
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].order_no, "1");
    }

    #[test]
    fn test_detail_query_promotes_whole_order() {
        let mut with_material = record("1", "", "");
        with_material.material_desc = "GASKET SPIRAL".to_string();
        let sibling = record("1", "", "");
        let other = record("2", "", "");
        let records = vec![with_material, sibling, other];

        let selection = SearchSelection {
            detail_query: "gasket".to_string(),
            ..Default::default()
        };
        let matched = apply_filters(
            &records,
            &selection,
            &CategoryMappings::default(),
            &terms(),
        );
        // 오더 1의 두 행 모두 통과
        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(|r| r.order_no == "1"));
    }

    #[test]
    fn test_count_and_equipment_info() {
        let mut a = record("1", "", "");
        a.equipment = "20007936".to_string();
        a.equi_text = "급수 펌프".to_string();
        let b = record("1", "", "");
        let c = record("2", "", "");
        let records = vec![a, b, c];
        let filtered: Vec<&Record> = records.iter().collect();

        assert_eq!(count_distinct_orders(&filtered), 2);
        let info = equipment_info(&filtered, "2000").unwrap();
        assert_eq!(info, ("20007936", "급수 펌프"));
    }
}

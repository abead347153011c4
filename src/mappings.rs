//! 분류·용어 매핑 모듈
//!
//! 작업반(중분류) 표기 별칭과 한/영 용어 대응표를 관리한다.
//! 매핑 파일이 없거나 깨져 있으면 빈 테이블로 동작한다(치명적 오류 아님).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// 기본 결과 건수 제한
pub const DEFAULT_RESULT_LIMIT: usize = 200;

/// 우선순위 그룹 판정에 쓰는 기본 마커 (Order Short Text 부분 일치)
pub const DEFAULT_PRIORITY_MARKER: &str = "도면정보";

/// 작업반 표기 별칭 → 정규 명칭
const MIDDLE_CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("기계반", "기계"),
    ("수산인더스트리 기계", "기계"),
    ("수산인더스트리-기계", "기계"),
    ("수산인더스트리_기계", "기계"),
    ("수산인더스트리기계", "기계"),
    ("기계반과수산인더스트리 기계", "기계"),
    ("기계반과수산인더스트리기계", "기계"),
    ("영진-기계", "기계"),
    ("영진기계", "기계"),
    ("영진 기계", "기계"),
];

/// 공백·하이픈·언더스코어를 제거한 비교용 표기
fn strip_separators(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect()
}

/// 작업반 표기를 정규 명칭으로 정규화
///
/// 원문 그대로와 구분자 제거형 양쪽으로 별칭 테이블을 조회하여
/// 표기 차이만 있는 값들을 같은 명칭으로 모은다.
pub fn alias_middle_value(value: &str) -> String {
    let key = value.trim();
    if key.is_empty() {
        return String::new();
    }

    for (alias, canonical) in MIDDLE_CATEGORY_ALIASES {
        if *alias == key {
            return (*canonical).to_string();
        }
    }

    let normalized = strip_separators(key);
    for (alias, canonical) in MIDDLE_CATEGORY_ALIASES {
        if strip_separators(alias) == normalized {
            return (*canonical).to_string();
        }
    }

    key.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CategoryMappingsFile {
    #[serde(default)]
    hidden_categories: Vec<String>,
    #[serde(default)]
    category_includes: HashMap<String, Vec<String>>,
    #[serde(default)]
    priority_marker: Option<String>,
}

/// 상위 분류(설비호기) 매핑
///
/// - `hidden_categories`: 드롭다운에서 숨길 분류
/// - `category_includes`: 상위 분류 선택 시 함께 포함할 분류(우산 포함)
/// - `priority_marker`: 우선순위 그룹 판정 마커(기본 "도면정보")
#[derive(Debug, Clone)]
pub struct CategoryMappings {
    pub hidden_categories: Vec<String>,
    pub category_includes: HashMap<String, Vec<String>>,
    pub priority_marker: String,
}

impl Default for CategoryMappings {
    fn default() -> Self {
        Self {
            hidden_categories: Vec::new(),
            category_includes: HashMap::new(),
            priority_marker: DEFAULT_PRIORITY_MARKER.to_string(),
        }
    }
}

impl CategoryMappings {
    /// JSON 파일에서 로드. 파일이 없거나 형식이 잘못되면 기본값.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn from_json(json: &str) -> Option<Self> {
        let file: CategoryMappingsFile = serde_json::from_str(json).ok()?;
        Some(Self {
            hidden_categories: file.hidden_categories,
            category_includes: file.category_includes,
            priority_marker: file
                .priority_marker
                .unwrap_or_else(|| DEFAULT_PRIORITY_MARKER.to_string()),
        })
    }

    /// 상위 분류 선택 시 검색 대상이 되는 분류 목록 (자기 자신 + 우산 포함)
    pub fn categories_to_include(&self, top: &str) -> Vec<String> {
        let mut categories = vec![top.to_string()];
        if let Some(extra) = self.category_includes.get(top) {
            categories.extend(extra.iter().cloned());
        }
        categories
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TermMappingsFile {
    #[serde(default)]
    term_replacements: HashMap<String, String>,
    #[serde(default)]
    cjk_units: HashMap<String, String>,
}

/// 한/영 용어 대응표
///
/// 양방향(정방향·역방향)으로 보관하며 양쪽 모두 소문자로 정규화한다.
#[derive(Debug, Clone, Default)]
pub struct TermMappings {
    forward: HashMap<String, String>,
    reverse: HashMap<String, String>,
}

impl TermMappings {
    /// JSON 파일에서 로드. 파일이 없거나 형식이 잘못되면 빈 테이블.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn from_json(json: &str) -> Option<Self> {
        let file: TermMappingsFile = serde_json::from_str(json).ok()?;
        let mut merged = file.term_replacements;
        merged.extend(file.cjk_units);
        Some(Self::from_pairs(merged.into_iter()))
    }

    pub fn from_pairs(pairs: impl Iterator<Item = (String, String)>) -> Self {
        let mut forward = HashMap::new();
        let mut reverse = HashMap::new();
        for (key, value) in pairs {
            let key = key.to_lowercase();
            let value = value.to_lowercase();
            forward.insert(key.clone(), value.clone());
            reverse.insert(value, key);
        }
        Self { forward, reverse }
    }

    /// 토큰의 대응어를 양방향으로 조회
    pub fn equivalents(&self, token: &str) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(mapped) = self.forward.get(token) {
            out.push(mapped.clone());
        }
        if let Some(mapped) = self.reverse.get(token) {
            out.push(mapped.clone());
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// 요청 건수 제한 해석: 미지정이거나 기본값보다 작으면 기본값으로 올림
pub fn resolve_limit(raw: Option<usize>) -> usize {
    match raw {
        Some(value) if value > DEFAULT_RESULT_LIMIT => value,
        _ => DEFAULT_RESULT_LIMIT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_exact_match() {
        assert_eq!(alias_middle_value("기계반"), "기계");
        assert_eq!(alias_middle_value("영진-기계"), "기계");
    }

    #[test]
    fn test_alias_separator_variants() {
        // 구분자만 다른 표기도 같은 정규 명칭으로
        assert_eq!(alias_middle_value("영진_기계"), "기계");
        assert_eq!(alias_middle_value("수산인더스트리 - 기계"), "기계");
    }

    #[test]
    fn test_alias_passthrough() {
        assert_eq!(alias_middle_value("전기"), "전기");
        assert_eq!(alias_middle_value("  전기  "), "전기");
        assert_eq!(alias_middle_value(""), "");
    }

    #[test]
    fn test_term_mappings_bidirectional() {
        let json = r#"{"term_replacements": {"펌프": "Pump"}, "cjk_units": {"쿨링": "cooling"}}"#;
        let terms = TermMappings::from_json(json).unwrap();

        assert_eq!(terms.equivalents("펌프"), vec!["pump".to_string()]);
        assert_eq!(terms.equivalents("pump"), vec!["펌프".to_string()]);
        assert_eq!(terms.equivalents("cooling"), vec!["쿨링".to_string()]);
        assert!(terms.equivalents("slp").is_empty());
    }

    #[test]
    fn test_term_mappings_malformed_json() {
        assert!(TermMappings::from_json("{not json").is_none());
        let loaded = TermMappings::load(std::path::Path::new("/no/such/file.json"));
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_category_mappings_defaults() {
        let mappings = CategoryMappings::from_json("{}").unwrap();
        assert!(mappings.hidden_categories.is_empty());
        assert_eq!(mappings.priority_marker, DEFAULT_PRIORITY_MARKER);
    }

    #[test]
    fn test_categories_to_include() {
        let json = r#"{"category_includes": {"인천복합발전3호기": ["공통설비"]}}"#;
        let mappings = CategoryMappings::from_json(json).unwrap();
        assert_eq!(
            mappings.categories_to_include("인천복합발전3호기"),
            vec!["인천복합발전3호기".to_string(), "공통설비".to_string()]
        );
        assert_eq!(
            mappings.categories_to_include("기타"),
            vec!["기타".to_string()]
        );
    }

    #[test]
    fn test_resolve_limit_floor() {
        assert_eq!(resolve_limit(None), 200);
        assert_eq!(resolve_limit(Some(50)), 200);
        assert_eq!(resolve_limit(Some(500)), 500);
    }
}

//! 분류 옵션 인덱스
//!
//! 정규화 데이터셋에서 상위(설비호기) → 중위(작업반) → 하위(설비유형)
//! 3단계 분류 옵션을 파생한다. 데이터셋이 다시 빌드되면 함께 빌드된다.

use crate::dataset::{clean_value, CanonicalDataset};
use crate::mappings::CategoryMappings;
use std::collections::{BTreeSet, HashMap};

/// 항상 제외하는 상위 분류 (섹션 단위 값)
const EXCLUDED_TOP_CATEGORIES: &[&str] =
    &["기계섹션", "예방정비 섹션", "계전섹션", "교육지원섹션"];

/// 드롭다운 맨 앞에 고정 배치하는 호기 목록
const PRIORITY_TOP_CATEGORIES: &[&str] = &[
    "인천복합발전3호기",
    "인천복합발전4호기",
    "인천복합발전5호기",
    "인천복합발전6호기",
    "인천복합발전7호기",
    "인천복합발전8호기",
    "인천복합발전9호기",
];

/// 우선 호기와 나머지 값 사이에 넣는 구분선 개수
const SEPARATOR_COUNT: usize = 15;

/// 구분선 항목인지 (선택 불가 항목)
pub fn is_separator(value: &str) -> bool {
    value.starts_with('─')
}

fn separator_entry() -> String {
    "─".repeat(20)
}

/// 3단계 분류 옵션 인덱스
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    /// 상위 분류 옵션 (우선 호기 → 구분선 → 나머지 가나다순)
    pub top_options: Vec<String>,
    /// 상위 분류별 중위(작업반 별칭) 옵션
    pub middle_options: HashMap<String, Vec<String>>,
    /// (상위, 중위)별 하위 옵션
    pub sub_options: HashMap<(String, String), Vec<String>>,
    /// 상위 무관 전체 중위 옵션
    pub all_middle_options: Vec<String>,
    /// 중위만 지정된 경우의 하위 옵션
    pub sub_by_middle: HashMap<String, Vec<String>>,
    /// 상위만 지정된 경우의 하위 옵션
    pub sub_by_top: HashMap<String, Vec<String>>,
    /// 전체 하위 옵션
    pub all_sub_options: Vec<String>,
}

impl CategoryIndex {
    pub fn build(dataset: &CanonicalDataset, mappings: &CategoryMappings) -> Self {
        let mut all_top_values: BTreeSet<String> = BTreeSet::new();
        for record in dataset.records() {
            let value = clean_value(&record.cost_center_text);
            if value.is_empty() {
                continue;
            }
            if EXCLUDED_TOP_CATEGORIES.contains(&value) {
                continue;
            }
            if mappings.hidden_categories.iter().any(|h| h == value) {
                continue;
            }
            all_top_values.insert(value.to_string());
        }

        // 우선 호기 → 구분선 → 나머지 가나다순
        let mut top_options: Vec<String> = Vec::new();
        for priority in PRIORITY_TOP_CATEGORIES {
            if all_top_values.contains(*priority) {
                top_options.push((*priority).to_string());
            }
        }
        for _ in 0..SEPARATOR_COUNT {
            top_options.push(separator_entry());
        }
        for value in &all_top_values {
            if !PRIORITY_TOP_CATEGORIES.contains(&value.as_str()) {
                top_options.push(value.clone());
            }
        }

        let mut middle_options: HashMap<String, Vec<String>> = HashMap::new();
        let mut all_middle_set: BTreeSet<String> = BTreeSet::new();
        let mut sub_options: HashMap<(String, String), Vec<String>> = HashMap::new();
        let mut sub_by_middle: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut sub_by_top: HashMap<String, BTreeSet<String>> = HashMap::new();

        for top in &top_options {
            if is_separator(top) {
                continue;
            }

            let mut aliases: BTreeSet<String> = BTreeSet::new();
            for record in dataset.records() {
                if record.cost_center_text.trim() == top {
                    let alias = record.workctr_alias.trim();
                    if !alias.is_empty() {
                        aliases.insert(alias.to_string());
                    }
                }
            }
            let alias_list: Vec<String> = aliases.into_iter().collect();
            all_middle_set.extend(alias_list.iter().cloned());

            let mut top_subs: BTreeSet<String> = BTreeSet::new();
            for alias in &alias_list {
                let mut subs: BTreeSet<String> = BTreeSet::new();
                for record in dataset.records() {
                    if record.cost_center_text.trim() == top
                        && record.workctr_alias.trim() == alias
                    {
                        let sub = clean_value(&record.object_type_text);
                        if !sub.is_empty() {
                            subs.insert(sub.to_string());
                        }
                    }
                }
                if !subs.is_empty() {
                    sub_by_middle
                        .entry(alias.clone())
                        .or_default()
                        .extend(subs.iter().cloned());
                    top_subs.extend(subs.iter().cloned());
                }
                sub_options.insert((top.clone(), alias.clone()), subs.into_iter().collect());
            }
            sub_by_top.insert(top.clone(), top_subs);
            middle_options.insert(top.clone(), alias_list);
        }

        let mut all_sub_set: BTreeSet<String> = BTreeSet::new();
        for record in dataset.records() {
            let sub = clean_value(&record.object_type_text);
            if !sub.is_empty() {
                all_sub_set.insert(sub.to_string());
            }
        }

        Self {
            top_options,
            middle_options,
            sub_options,
            all_middle_options: all_middle_set.into_iter().collect(),
            sub_by_middle: sub_by_middle
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            sub_by_top: sub_by_top
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            all_sub_options: all_sub_set.into_iter().collect(),
        }
    }

    /// 현재 선택에 맞는 중위 옵션 (상위 미선택 시 전체)
    pub fn middle_choices(&self, top: &str) -> &[String] {
        if top.is_empty() {
            return &self.all_middle_options;
        }
        self.middle_options
            .get(top)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 현재 선택에 맞는 하위 옵션 (부분 선택 시 평탄화 폴백)
    pub fn sub_choices(&self, top: &str, middle: &str) -> &[String] {
        if !top.is_empty() && !middle.is_empty() {
            return self
                .sub_options
                .get(&(top.to_string(), middle.to_string()))
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
        }
        if !middle.is_empty() {
            return self
                .sub_by_middle
                .get(middle)
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
        }
        if !top.is_empty() {
            return self
                .sub_by_top
                .get(top)
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
        }
        &self.all_sub_options
    }
}

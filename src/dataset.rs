//! 정규화 레코드와 스냅샷 데이터셋
//!
//! 로더가 읽은 원본 행을 정규화 레코드로 보관하고, 파생 컬럼
//! (작업반 별칭, 숫자 오더번호, 링크 여부, 대표 작업일자)을 계산한다.

use crate::mappings::alias_middle_value;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

lazy_static! {
    /// long text 안의 첨부 링크 패턴
    ///
    /// 줄바꿈으로 감긴 링크를 이어 붙이기 위해 \r\n은 허용하되,
    /// 공백에서는 끊는다 (뒤따르는 본문을 삼키지 않도록).
    pub static ref URL_PATTERN: Regex = Regex::new(
        r#"(?i)https?://[A-Za-z0-9\-\._~:/?#\[\]@!$&'()*+,;=%\r\n]+"#
    ).unwrap();
}

/// 원본 소스 한 행의 정규화 레코드
///
/// 모든 원본 필드는 문자열로 유지한다(식별자 정밀도 보존).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub order_no: String,
    pub equipment: String,
    pub order_short_text: String,
    pub equi_text: String,
    pub cost_center_text: String,
    pub workctr_text: String,
    pub object_type_text: String,
    pub confirm_text: String,
    /// 정비실적 short text
    pub short_text: String,
    /// 정비실적 long text (첨부 링크 포함 가능)
    pub long_text: String,
    pub material: String,
    pub material_desc: String,
    pub qty: String,
    pub uom: String,
    pub worker_name: String,
    pub actual_work: String,
    pub work_unit: String,
    pub start_of_execution: String,
    pub bsc_start: String,
    pub actual_start: String,
    pub required_start: String,
    pub total_cost: String,
    pub labor_cost: String,
    pub material_cost: String,
    pub other_cost: String,

    // 파생 컬럼 (스냅샷 빌드 시 채워짐)
    #[serde(default)]
    pub workctr_alias: String,
    #[serde(default)]
    pub order_no_numeric: f64,
    #[serde(default)]
    pub has_link: bool,
    /// 오더 대표 작업일자 (ISO, 없으면 빈 문자열)
    #[serde(default)]
    pub work_date: String,
}

/// 빈 값으로 취급하는 센티널 표기인지
pub fn is_blank_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || matches!(v.to_lowercase().as_str(), "none" | "nan" | "nat")
}

/// 센티널을 걸러낸 값 (없으면 빈 문자열)
pub fn clean_value(value: &str) -> &str {
    if is_blank_sentinel(value) {
        ""
    } else {
        value.trim()
    }
}

/// 날짜 문자열을 해석해 ISO 표기로 정규화. 시각 부분은 버린다.
pub fn parse_work_date(raw: &str) -> Option<String> {
    let cleaned = clean_value(raw);
    if cleaned.is_empty() {
        return None;
    }
    // "2024-01-05 00:00:00" 형태에서 날짜부만
    let date_part = cleaned.split_whitespace().next()?;

    const FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%d.%m.%Y"];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

/// 대표 작업일자 후보 컬럼 (우선순위 순)
fn date_candidates(record: &Record) -> [&str; 4] {
    [
        &record.start_of_execution,
        &record.bsc_start,
        &record.actual_start,
        &record.required_start,
    ]
}

/// 스냅샷 한 건의 정규화 데이터셋 (입력 행 순서 유지, 불변)
#[derive(Debug, Clone, Default)]
pub struct CanonicalDataset {
    records: Vec<Record>,
}

impl CanonicalDataset {
    /// 로더 출력에서 스냅샷을 빌드한다.
    ///
    /// 1. 파생 컬럼 계산 (작업반 별칭, 숫자 오더번호, 링크 여부)
    /// 2. 오더별 대표 작업일자 계산 (전체 데이터 기준, 컬럼 우선순위)
    /// 3. 오더 단위 보존 필터: short text / long text / 자재 중
    ///    하나라도 있는 오더만 유지
    pub fn build(mut records: Vec<Record>) -> Self {
        for record in &mut records {
            record.workctr_alias = alias_middle_value(&record.workctr_text);
            record.order_no_numeric = record
                .order_no
                .trim()
                .parse::<f64>()
                .unwrap_or(f64::NEG_INFINITY);
            record.has_link = URL_PATTERN.is_match(&record.long_text);
        }

        let order_dates = compute_order_dates(&records);
        for record in &mut records {
            if let Some(date) = order_dates.get(record.order_no.as_str()) {
                record.work_date = date.clone();
            }
        }

        let retained = retained_orders(&records);
        records.retain(|r| retained.contains(r.order_no.as_str()));

        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// 오더별 대표 작업일자 계산
///
/// 우선순위가 높은 날짜 컬럼부터, 해당 컬럼에서 해석 가능한 날짜의
/// 최솟값(가장 이른 날짜)을 오더에 부여한다. 이미 날짜가 정해진
/// 오더는 이후 컬럼에서 갱신하지 않는다.
fn compute_order_dates(records: &[Record]) -> HashMap<String, String> {
    let mut dates: HashMap<String, String> = HashMap::new();

    for column in 0..4 {
        let mut column_min: HashMap<&str, String> = HashMap::new();
        for record in records {
            if dates.contains_key(record.order_no.as_str()) {
                continue;
            }
            let Some(parsed) = parse_work_date(date_candidates(record)[column]) else {
                continue;
            };
            match column_min.get(record.order_no.as_str()) {
                Some(existing) if *existing <= parsed => {}
                _ => {
                    column_min.insert(record.order_no.as_str(), parsed);
                }
            }
        }
        for (order_no, date) in column_min {
            dates.insert(order_no.to_string(), date);
        }
    }

    dates
}

/// 보존 대상 오더 집합: 그룹 내 한 행이라도 short text / long text /
/// 자재 코드가 있으면 그 오더 전체를 유지한다.
fn retained_orders(records: &[Record]) -> HashSet<String> {
    let mut retained = HashSet::new();
    for record in records {
        if !clean_value(&record.short_text).is_empty()
            || !clean_value(&record.long_text).is_empty()
            || !clean_value(&record.material).is_empty()
        {
            retained.insert(record.order_no.clone());
        }
    }
    retained
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_no: &str) -> Record {
        Record {
            order_no: order_no.to_string(),
            short_text: "점검 완료".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_work_date() {
        assert_eq!(
            parse_work_date("2024-01-05 00:00:00").as_deref(),
            Some("2024-01-05")
        );
        assert_eq!(parse_work_date("2024/01/05").as_deref(), Some("2024-01-05"));
        assert_eq!(parse_work_date("nan"), None);
        assert_eq!(parse_work_date(""), None);
        assert_eq!(parse_work_date("미정"), None);
    }

    #[test]
    fn test_derived_columns() {
        let mut rec = record("1008483");
        rec.workctr_text = "기계반".to_string();
        rec.long_text = "자료: http://example.com/doc 참고".to_string();

        let dataset = CanonicalDataset::build(vec![rec]);
        let built = &dataset.records()[0];
        assert_eq!(built.workctr_alias, "기계");
        assert_eq!(built.order_no_numeric, 1008483.0);
        assert!(built.has_link);
    }

    #[test]
    fn test_non_numeric_order_no() {
        let dataset = CanonicalDataset::build(vec![record("ORD-A")]);
        assert_eq!(dataset.records()[0].order_no_numeric, f64::NEG_INFINITY);
    }

    #[test]
    fn test_order_date_earliest_within_priority_column() {
        let mut first = record("100");
        first.start_of_execution = "2024-03-02".to_string();
        let mut second = record("100");
        second.start_of_execution = "2024-03-01".to_string();

        let dataset = CanonicalDataset::build(vec![first, second]);
        for rec in dataset.records() {
            assert_eq!(rec.work_date, "2024-03-01");
        }
    }

    #[test]
    fn test_order_date_column_priority() {
        // Start of Execution이 비어 있으면 Bsc start로 내려간다.
        let mut rec = record("200");
        rec.bsc_start = "2023-11-20".to_string();
        rec.required_start = "2023-01-01".to_string();

        let dataset = CanonicalDataset::build(vec![rec]);
        assert_eq!(dataset.records()[0].work_date, "2023-11-20");
    }

    #[test]
    fn test_group_date_invariant() {
        // 같은 오더의 모든 행은 같은 대표 작업일자를 가진다.
        let mut first = record("300");
        first.start_of_execution = "2024-05-10".to_string();
        let second = record("300");

        let dataset = CanonicalDataset::build(vec![first, second]);
        let dates: Vec<&str> = dataset
            .records()
            .iter()
            .map(|r| r.work_date.as_str())
            .collect();
        assert_eq!(dates, vec!["2024-05-10", "2024-05-10"]);
    }

    #[test]
    fn test_retention_is_order_level() {
        // 내용 없는 행도 같은 오더에 내용 있는 행이 있으면 유지
        let with_text = record("400");
        let mut empty_row = Record {
            order_no: "400".to_string(),
            ..Default::default()
        };
        empty_row.worker_name = "홍길동".to_string();

        let mut dropped = Record {
            order_no: "500".to_string(),
            ..Default::default()
        };
        dropped.short_text = "nan".to_string();

        let dataset = CanonicalDataset::build(vec![with_text, empty_row, dropped]);
        assert_eq!(dataset.len(), 2);
        assert!(dataset.records().iter().all(|r| r.order_no == "400"));
    }

    #[test]
    fn test_build_idempotent() {
        let mut rec = record("600");
        rec.start_of_execution = "2024-01-01".to_string();
        let first = CanonicalDataset::build(vec![rec.clone()]);
        let second = CanonicalDataset::build(vec![rec]);
        assert_eq!(first.len(), second.len());
        assert_eq!(
            first.records()[0].work_date,
            second.records()[0].work_date
        );
    }
}

//! 결과 행·상세 페이로드 빌더
//!
//! 필터된 레코드를 오더 단위로 묶어 목록 화면용 행(TableRow)과
//! 드릴다운용 상세 페이로드(DetailPayload)를 만든다.
//! "첫 등장 우선" 원칙: 대표 필드와 중복 제거 모두 입력 행 순서를 따른다.

use crate::dataset::{clean_value, Record, URL_PATTERN};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 자재 한 줄
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub material: String,
    pub description: String,
    pub qty: String,
    pub uom: String,
}

/// 작업 내역 한 줄
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkDetailEntry {
    /// 작업 시작일 (시각 제거)
    pub start_of_execution: String,
    pub worker_name: String,
    /// 작업 시간 (0이면 빈 문자열)
    pub actual_work: String,
    pub work_unit: String,
}

/// 오더 하나의 상세 페이로드
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailPayload {
    pub order_no: String,
    /// 대표 작업일자
    pub work_date: String,
    /// 링크를 떼어낸 long text
    pub long_text: String,
    /// long text에서 추출한 첨부 링크 (첫 등장 순, 중복 제거)
    pub long_text_links: Vec<String>,
    pub materials: Vec<MaterialEntry>,
    pub work_details: Vec<WorkDetailEntry>,
}

/// 검색 결과 한 행 (오더당 하나)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRow {
    pub work_date: String,
    pub order_no: String,
    pub order_short_text: String,
    pub equipment: String,
    pub equi_text: String,
    pub workctr: String,
    pub cost_center: String,
    /// 확인 텍스트 (중복 제거 후 줄바꿈 결합)
    pub confirm_text: String,
    pub has_links: bool,
    pub detail: DetailPayload,
}

/// 선택된 오더 목록 순서대로 결과 행을 만든다.
/// 필터 결과에 없는 오더는 건너뛴다.
pub fn build_table_rows(filtered: &[&Record], selected_orders: &[String]) -> Vec<TableRow> {
    if filtered.is_empty() {
        return Vec::new();
    }

    let mut groups: HashMap<&str, Vec<&Record>> = HashMap::new();
    for record in filtered {
        groups.entry(record.order_no.as_str()).or_default().push(*record);
    }

    let mut rows = Vec::new();
    for order_no in selected_orders {
        let Some(group) = groups.get(order_no.as_str()) else {
            continue;
        };
        rows.push(build_row(order_no, group));
    }
    rows
}

fn build_row(order_no: &str, group: &[&Record]) -> TableRow {
    let first = group[0];

    let confirm_text = collect_confirm_texts(group).join("\n");

    let mut long_text_parts: Vec<String> = Vec::new();
    let mut links: Vec<String> = Vec::new();
    let mut seen_links: HashSet<String> = HashSet::new();
    for value in unique_preserve(group.iter().map(|r| r.long_text.as_str())) {
        let (cleaned, extracted) = extract_links(&value);
        if !cleaned.is_empty() {
            long_text_parts.push(cleaned);
        }
        for link in extracted {
            if seen_links.insert(link.clone()) {
                links.push(link);
            }
        }
    }
    let long_text = long_text_parts.join("\n").trim().to_string();

    let materials = collect_materials(group);
    let work_details = collect_work_details(group);
    let work_date = clean_value(&first.work_date).to_string();

    TableRow {
        work_date: work_date.clone(),
        order_no: order_no.to_string(),
        order_short_text: first.order_short_text.clone(),
        equipment: first.equipment.clone(),
        equi_text: first.equi_text.clone(),
        workctr: first.workctr_text.clone(),
        cost_center: first.cost_center_text.clone(),
        confirm_text,
        has_links: !links.is_empty(),
        detail: DetailPayload {
            order_no: order_no.to_string(),
            work_date,
            long_text,
            long_text_links: links,
            materials,
            work_details,
        },
    }
}

/// 첫 등장 순서를 유지하는 중복 제거 (센티널 값 제외)
fn unique_preserve<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::new();
    for raw in values {
        let value = clean_value(raw);
        if value.is_empty() || !seen.insert(value) {
            continue;
        }
        ordered.push(value.to_string());
    }
    ordered
}

/// 확인 텍스트 수집: Confirm text 컬럼 먼저, 그다음 정비실적 short text.
/// 컬럼을 넘어서도 같은 값은 한 번만 쓴다.
fn collect_confirm_texts(group: &[&Record]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut results = Vec::new();

    let confirm = unique_preserve(group.iter().map(|r| r.confirm_text.as_str()));
    let short = unique_preserve(group.iter().map(|r| r.short_text.as_str()));
    for value in confirm.into_iter().chain(short) {
        if seen.insert(value.clone()) {
            results.push(value);
        }
    }
    results
}

/// long text에서 링크를 추출하고 본문을 정리한다.
///
/// 링크 자리에는 공백 하나를 남겨 주변 문장이 붙지 않게 하고,
/// 링크 구간 안에 줄바꿈이 있었다면 줄바꿈은 보존한다.
pub fn extract_links(text: &str) -> (String, Vec<String>) {
    if text.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut links = Vec::new();
    let cleaned = URL_PATTERN.replace_all(text, |caps: &regex::Captures<'_>| {
        let raw = caps.get(0).map(|m| m.as_str()).unwrap_or("");
        let link: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if !link.is_empty() {
            links.push(link);
        }

        let newlines: String = raw.chars().filter(|c| matches!(c, '\n' | '\r')).collect();
        if newlines.is_empty() {
            " ".to_string()
        } else {
            newlines
        }
    });

    // 링크 자리 치환으로 생긴 연속 공백을 하나로
    let mut collapsed = String::with_capacity(cleaned.len());
    let mut prev_space = false;
    for c in cleaned.chars() {
        if c == ' ' {
            if !prev_space {
                collapsed.push(c);
            }
            prev_space = true;
        } else {
            collapsed.push(c);
            prev_space = false;
        }
    }

    (collapsed.trim().to_string(), links)
}

/// 자재 수집: (코드, 설명, 수량, 단위) 튜플 중복 제거.
/// 코드나 설명이 있거나, 수량이 양수로 해석되면 유지한다.
/// 숫자로 해석 안 되는 수량 표기는 "있음"으로 취급해 버리지 않는다.
fn collect_materials(group: &[&Record]) -> Vec<MaterialEntry> {
    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();
    let mut entries = Vec::new();

    for record in group {
        let entry = MaterialEntry {
            material: clean_value(&record.material).to_string(),
            description: clean_value(&record.material_desc).to_string(),
            qty: clean_value(&record.qty).to_string(),
            uom: clean_value(&record.uom).to_string(),
        };

        let key = (
            entry.material.clone(),
            entry.description.clone(),
            entry.qty.clone(),
            entry.uom.clone(),
        );
        if !seen.insert(key) {
            continue;
        }

        let has_text = !entry.material.is_empty() || !entry.description.is_empty();
        let qty_value = entry.qty.replace(',', "");
        let has_qty = if qty_value.is_empty() {
            false
        } else {
            match qty_value.parse::<f64>() {
                Ok(parsed) => parsed > 0.0,
                Err(_) => true,
            }
        };
        if has_text || has_qty {
            entries.push(entry);
        }
    }
    entries
}

/// 작업 내역 수집: 행 순서 유지, 완전 중복 제거.
/// 작업 시간 0은 빈 값으로 정규화하고, 네 필드 모두 빈 행은 버린다.
fn collect_work_details(group: &[&Record]) -> Vec<WorkDetailEntry> {
    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();
    let mut entries = Vec::new();

    for record in group {
        let start = clean_value(&record.start_of_execution)
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();

        let mut actual_work = clean_value(&record.actual_work).to_string();
        if !actual_work.is_empty() {
            let normalized = actual_work.replace(',', "");
            if let Ok(parsed) = normalized.parse::<f64>() {
                if parsed == 0.0 {
                    actual_work = String::new();
                }
            }
        }

        let entry = WorkDetailEntry {
            start_of_execution: start,
            worker_name: clean_value(&record.worker_name).to_string(),
            actual_work,
            work_unit: clean_value(&record.work_unit).to_string(),
        };

        if entry.start_of_execution.is_empty()
            && entry.worker_name.is_empty()
            && entry.actual_work.is_empty()
            && entry.work_unit.is_empty()
        {
            continue;
        }

        let key = (
            entry.start_of_execution.clone(),
            entry.worker_name.clone(),
            entry.actual_work.clone(),
            entry.work_unit.clone(),
        );
        if seen.insert(key) {
            entries.push(entry);
        }
    }
    entries
}

/// 오더 상세 화면의 기본 정보 필드 (비용은 "원", 작업 시간은 "H" 표기)
pub fn order_info_fields(first: &Record) -> Vec<(String, String)> {
    let fields: [(&str, &str, FieldKind); 11] = [
        ("Order No", first.order_no.as_str(), FieldKind::Plain),
        ("Equipment", first.equipment.as_str(), FieldKind::Plain),
        (
            "Object type text",
            first.object_type_text.as_str(),
            FieldKind::Plain,
        ),
        (
            "Order Short Text",
            first.order_short_text.as_str(),
            FieldKind::Plain,
        ),
        (
            "Cost Center Text",
            first.cost_center_text.as_str(),
            FieldKind::Plain,
        ),
        ("WorkCtr.Text", first.workctr_text.as_str(), FieldKind::Plain),
        ("Actual Work", first.actual_work.as_str(), FieldKind::Hours),
        ("Total Cost", first.total_cost.as_str(), FieldKind::Cost),
        ("Labor Cost", first.labor_cost.as_str(), FieldKind::Cost),
        ("Material Cost", first.material_cost.as_str(), FieldKind::Cost),
        ("Other Cost", first.other_cost.as_str(), FieldKind::Cost),
    ];

    fields
        .into_iter()
        .map(|(label, raw, kind)| {
            let value = clean_value(raw);
            let formatted = match kind {
                FieldKind::Plain => value.to_string(),
                FieldKind::Cost => format_cost(value),
                FieldKind::Hours => format_hours(value),
            };
            (label.to_string(), formatted)
        })
        .collect()
}

enum FieldKind {
    Plain,
    Cost,
    Hours,
}

/// 비용 표기: 천 단위 구분 + "원". 해석 불가면 원문 유지.
pub fn format_cost(value: &str) -> String {
    let cleaned = clean_value(value);
    if cleaned.is_empty() || cleaned == "-" {
        return cleaned.to_string();
    }
    match cleaned.replace(',', "").parse::<f64>() {
        Ok(parsed) => format!("{} 원", thousands(parsed.round() as i64)),
        Err(_) => cleaned.to_string(),
    }
}

/// 작업 시간 표기: 소수 첫째 자리 + "H". 해석 불가면 원문 유지.
pub fn format_hours(value: &str) -> String {
    let cleaned = clean_value(value);
    if cleaned.is_empty() || cleaned == "-" {
        return cleaned.to_string();
    }
    match cleaned.replace(',', "").parse::<f64>() {
        Ok(parsed) => {
            let whole = parsed.trunc() as i64;
            let tenth = ((parsed - parsed.trunc()).abs() * 10.0).round() as i64;
            format!("{}.{} H", thousands(whole), tenth)
        }
        Err(_) => cleaned.to_string(),
    }
}

fn thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

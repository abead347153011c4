//! 오더 선별·정렬
//!
//! 필터된 행을 오더 단위로 중복 제거하고 결정적 순서로 정렬한다.
//! 우선순위 마커(기본 "도면정보") 그룹 → 일반 그룹 순서이며, 각 그룹
//! 안에서는 작업일자 있는 오더(최신순) → 없는 오더 순서다.

use crate::dataset::Record;
use crate::mappings::resolve_limit;
use std::cmp::Ordering;
use std::collections::HashSet;

/// 오더 대표 행의 정렬 키
struct OrderKey<'a> {
    order_no: &'a str,
    order_no_numeric: f64,
    work_date: &'a str,
    has_marker: bool,
}

/// 일치 행에서 오더번호 목록을 만든다: 중복 제거(첫 등장 기준),
/// 결정적 정렬, limit 상한 적용 (limit은 기본값 200으로 하한 보정).
pub fn select_order_numbers(
    filtered: &[&Record],
    limit: Option<usize>,
    priority_marker: &str,
) -> Vec<String> {
    if filtered.is_empty() {
        return Vec::new();
    }
    let limit = resolve_limit(limit);

    let marker = priority_marker.to_lowercase();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut keys: Vec<OrderKey> = Vec::new();
    for record in filtered {
        if !seen.insert(record.order_no.as_str()) {
            continue;
        }
        let has_marker = !marker.is_empty()
            && record.order_short_text.to_lowercase().contains(&marker);
        keys.push(OrderKey {
            order_no: &record.order_no,
            order_no_numeric: record.order_no_numeric,
            work_date: &record.work_date,
            has_marker,
        });
    }

    let (marked, plain): (Vec<OrderKey>, Vec<OrderKey>) =
        keys.into_iter().partition(|key| key.has_marker);

    let mut ordered = sort_tier(marked);
    ordered.extend(sort_tier(plain));

    ordered
        .into_iter()
        .take(limit)
        .map(|key| key.order_no.to_string())
        .collect()
}

/// 그룹 내 정렬: 작업일자 있는 오더(일자 내림차순) 먼저, 없는 오더 뒤.
/// 동순위는 숫자 오더번호 내림차순, 문자열 오더번호 내림차순.
fn sort_tier(keys: Vec<OrderKey>) -> Vec<OrderKey> {
    let (mut dated, mut undated): (Vec<OrderKey>, Vec<OrderKey>) = keys
        .into_iter()
        .partition(|key| !key.work_date.is_empty());

    dated.sort_by(|a, b| {
        b.work_date
            .cmp(a.work_date)
            .then_with(|| compare_order_no_desc(a, b))
    });
    undated.sort_by(compare_order_no_desc);

    dated.extend(undated);
    dated
}

fn compare_order_no_desc(a: &OrderKey, b: &OrderKey) -> Ordering {
    b.order_no_numeric
        .total_cmp(&a.order_no_numeric)
        .then_with(|| b.order_no.cmp(a.order_no))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings::DEFAULT_PRIORITY_MARKER;

    fn record(order_no: &str, work_date: &str, short_text: &str) -> Record {
        Record {
            order_no: order_no.to_string(),
            order_no_numeric: order_no.parse().unwrap_or(f64::NEG_INFINITY),
            work_date: work_date.to_string(),
            order_short_text: short_text.to_string(),
            ..Default::default()
        }
    }

    fn select(records: &[Record]) -> Vec<String> {
        let refs: Vec<&Record> = records.iter().collect();
        select_order_numbers(&refs, None, DEFAULT_PRIORITY_MARKER)
    }

    #[test]
    fn test_marker_tier_before_dated_tier() {
        // A: 도면정보 마커, B: 더 최신 일자, C: 일자 없음
        let records = vec![
            record("1", "2024-01-15", "도면정보 등록"),
            record("2", "2024-02-10", "펌프 정비"),
            record("3", "", "밸브 점검"),
        ];
        assert_eq!(select(&records), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_newest_first_within_tier() {
        let records = vec![
            record("1", "2024-01-01", ""),
            record("2", "2024-03-01", ""),
            record("3", "2024-02-01", ""),
        ];
        assert_eq!(select(&records), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_same_date_numeric_descending() {
        let records = vec![
            record("99", "2024-01-01", ""),
            record("1008483", "2024-01-01", ""),
        ];
        assert_eq!(select(&records), vec!["1008483", "99"]);
    }

    #[test]
    fn test_non_numeric_order_sorts_last() {
        let records = vec![
            record("WO-B", "", ""),
            record("500", "", ""),
            record("WO-A", "", ""),
        ];
        // 숫자 해석 불가는 -inf로 취급, 문자열 내림차순으로 보조 정렬
        assert_eq!(select(&records), vec!["500", "WO-B", "WO-A"]);
    }

    #[test]
    fn test_dedup_first_occurrence() {
        let records = vec![
            record("1", "2024-01-01", ""),
            record("1", "2024-01-01", ""),
            record("2", "", ""),
        ];
        assert_eq!(select(&records), vec!["1", "2"]);
    }

    #[test]
    fn test_limit_truncates_after_floor() {
        let records: Vec<Record> = (1..=250)
            .map(|n| record(&n.to_string(), "", ""))
            .collect();
        let refs: Vec<&Record> = records.iter().collect();

        // 50을 요청해도 하한 200으로 보정
        let selected = select_order_numbers(&refs, Some(50), DEFAULT_PRIORITY_MARKER);
        assert_eq!(selected.len(), 200);
        assert_eq!(selected[0], "250");

        let wide = select_order_numbers(&refs, Some(500), DEFAULT_PRIORITY_MARKER);
        assert_eq!(wide.len(), 250);
    }

    #[test]
    fn test_marker_case_insensitive() {
        let refs_owner = vec![
            record("1", "", "drawing info 등록"),
            record("2", "2024-05-01", ""),
        ];
        let refs: Vec<&Record> = refs_owner.iter().collect();
        let selected = select_order_numbers(&refs, None, "Drawing Info");
        assert_eq!(selected, vec!["1", "2"]);
    }
}

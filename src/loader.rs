//! 데이터 소스 로더
//!
//! 원본 테이블(CSV 또는 SQLite 단일 테이블)을 문자열 컬럼으로 읽어
//! 정규화 레코드 목록을 만든다. 숫자 강제 변환은 하지 않는다
//! (오더번호·설비번호의 정밀도 보존).
//!
//! - 파일이 없으면 빈 목록 (치명적 오류 아님, "데이터 없음" 상태로 동작)
//! - 파일은 있는데 어떤 인코딩으로도 해석되지 않으면 치명적 오류

use crate::dataset::Record;
use crate::error::{Result, SearchError};
use encoding_rs::EUC_KR;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// SQLite 소스의 테이블명
pub const SOURCE_TABLE: &str = "sap_reports";

/// long text 정본 컬럼명
pub const LONG_TEXT_COLUMN: &str = "정비실적 long text";

/// 뒤따르는 ".0"을 제거하는 숫자형 식별자 컬럼
const NUMERIC_ID_COLUMNS: &[&str] = &["Order No", "Equipment", "Material", "Qty", "Actual Work"];

/// 정본 컬럼명 목록 (레코드 필드와 1:1)
const CANONICAL_COLUMNS: &[&str] = &[
    "Order No",
    "Equipment",
    "Order Short Text",
    "Equi. Text",
    "Cost Center Text",
    "WorkCtr.Text",
    "Object type text",
    "Confirm text",
    "정비실적 short text",
    LONG_TEXT_COLUMN,
    "Material",
    "Material Desc.",
    "Qty",
    "UoM",
    "작업자 이름",
    "Actual Work",
    "Unit",
    "Start of Execution",
    "Bsc start",
    "Actual Start (Time)",
    "Required Start",
    "Total Cost",
    "Labor Cost",
    "Material Cost",
    "Other Cost",
];

/// 소스를 읽어 정규화 레코드 목록을 만든다.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        warn!(path = %path.display(), "데이터 소스가 없어 빈 데이터셋으로 동작");
        return Ok(Vec::new());
    }

    let is_sqlite = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("db"))
        .unwrap_or(false);

    let (headers, rows) = if is_sqlite {
        read_sqlite(path)?
    } else {
        read_csv(path)?
    };

    let column_map = ColumnMap::new(&headers);
    let records = rows
        .iter()
        .map(|row| column_map.record_from_row(row))
        .collect::<Vec<_>>();

    debug!(rows = records.len(), "데이터 소스 로드 완료");
    Ok(records)
}

/// CSV를 인코딩 후보 순서대로 해석한다: utf-8-sig → cp949 → utf-8.
fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let bytes = std::fs::read(path)?;
    let text = decode_with_fallback(&bytes, path)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SearchError::CsvParse(format!("{}: {}", path.display(), e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| SearchError::CsvParse(format!("{}: {}", path.display(), e)))?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    Ok((headers, rows))
}

fn decode_with_fallback(bytes: &[u8], path: &Path) -> Result<String> {
    // utf-8-sig: BOM이 있으면 제거
    let without_bom = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(without_bom) {
        return Ok(text.to_string());
    }

    let (decoded, _, had_errors) = EUC_KR.decode(bytes);
    if !had_errors {
        debug!(path = %path.display(), "cp949 인코딩으로 해석");
        return Ok(decoded.into_owned());
    }

    Err(SearchError::Decode(path.display().to_string()))
}

/// SQLite 단일 테이블을 전부 문자열로 읽는다.
fn read_sqlite(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let conn = rusqlite::Connection::open_with_flags(
        path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
    )
    .map_err(|e| SearchError::Database(e.to_string()))?;

    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {SOURCE_TABLE}"))
        .map_err(|e| SearchError::Database(e.to_string()))?;

    let headers: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    let column_count = headers.len();

    let mut rows = Vec::new();
    let mut query = stmt
        .query([])
        .map_err(|e| SearchError::Database(e.to_string()))?;
    while let Some(row) = query
        .next()
        .map_err(|e| SearchError::Database(e.to_string()))?
    {
        let mut cells = Vec::with_capacity(column_count);
        for index in 0..column_count {
            cells.push(cell_to_string(row, index));
        }
        rows.push(cells);
    }

    Ok((headers, rows))
}

fn cell_to_string(row: &rusqlite::Row<'_>, index: usize) -> String {
    use rusqlite::types::ValueRef;

    match row.get_ref(index) {
        Ok(ValueRef::Null) => String::new(),
        Ok(ValueRef::Integer(v)) => v.to_string(),
        Ok(ValueRef::Real(v)) => v.to_string(),
        Ok(ValueRef::Text(v)) => String::from_utf8_lossy(v).into_owned(),
        Ok(ValueRef::Blob(_)) | Err(_) => String::new(),
    }
}

/// 정본 컬럼명 → 소스 컬럼 인덱스 목록
///
/// 중복 헤더는 첫 번째만 유지한다. long text는 별칭 헤더가 여럿
/// 존재할 수 있어 정본 컬럼 뒤에 별칭 컬럼을 헤더 순서로 붙인다:
/// 셀 값은 앞에서부터 처음으로 비어 있지 않은 값을 쓴다
/// (별칭은 빈칸만 채우고 정본 값을 덮어쓰지 않는다).
struct ColumnMap {
    indexes: HashMap<&'static str, Vec<usize>>,
}

impl ColumnMap {
    fn new(headers: &[String]) -> Self {
        let mut indexes: HashMap<&'static str, Vec<usize>> = HashMap::new();
        let mut seen_headers: Vec<&str> = Vec::new();

        for (index, header) in headers.iter().enumerate() {
            let header = header.trim();
            // 완전 중복 헤더는 첫 등장만
            if seen_headers.contains(&header) {
                continue;
            }
            seen_headers.push(header);

            if let Some(canonical) = canonical_for(header) {
                let slots = indexes.entry(canonical).or_default();
                if header == canonical {
                    // 정본 헤더는 맨 앞
                    slots.insert(0, index);
                } else {
                    slots.push(index);
                }
            }
        }

        Self { indexes }
    }

    fn value(&self, row: &[String], canonical: &str) -> String {
        let Some(slots) = self.indexes.get(canonical) else {
            return String::new();
        };

        for &index in slots {
            let raw = row.get(index).map(|s| s.trim()).unwrap_or("");
            let cleaned = match raw {
                "nan" | "NaN" | "None" => "",
                other => other,
            };
            if !cleaned.is_empty() {
                let mut value = cleaned.to_string();
                if NUMERIC_ID_COLUMNS.contains(&canonical) {
                    if let Some(stripped) = value.strip_suffix(".0") {
                        value = stripped.trim().to_string();
                    }
                }
                return value;
            }
        }
        String::new()
    }

    fn record_from_row(&self, row: &[String]) -> Record {
        let mut record = Record::default();
        for &canonical in CANONICAL_COLUMNS {
            let value = self.value(row, canonical);
            assign_field(&mut record, canonical, value);
        }
        record
    }
}

/// 헤더를 정본 컬럼명으로 정규화. 모르는 컬럼은 None (무시).
fn canonical_for(header: &str) -> Option<&'static str> {
    for &canonical in CANONICAL_COLUMNS {
        if header == canonical {
            return Some(canonical);
        }
    }
    if is_long_text_alias(header) {
        return Some(LONG_TEXT_COLUMN);
    }
    None
}

/// long text 별칭 헤더 판정
///
/// "정비실적 Long Text", "정비실적_long_text", "Order Long Text" 등
/// 공백·구분자·대소문자 변형을 전부 같은 컬럼으로 취급한다.
fn is_long_text_alias(header: &str) -> bool {
    let normalized: String = header
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '\u{3000}' | '\u{a0}'))
        .collect();
    matches!(
        normalized.as_str(),
        "정비실적longtext" | "주요정비실적longtext" | "orderlongtext" | "longtext"
    )
}

/// 정본 컬럼명으로 레코드 필드를 채운다.
fn assign_field(record: &mut Record, canonical: &str, value: String) {
    match canonical {
        "Order No" => record.order_no = value,
        "Equipment" => record.equipment = value,
        "Order Short Text" => record.order_short_text = value,
        "Equi. Text" => record.equi_text = value,
        "Cost Center Text" => record.cost_center_text = value,
        "WorkCtr.Text" => record.workctr_text = value,
        "Object type text" => record.object_type_text = value,
        "Confirm text" => record.confirm_text = value,
        "정비실적 short text" => record.short_text = value,
        LONG_TEXT_COLUMN => record.long_text = value,
        "Material" => record.material = value,
        "Material Desc." => record.material_desc = value,
        "Qty" => record.qty = value,
        "UoM" => record.uom = value,
        "작업자 이름" => record.worker_name = value,
        "Actual Work" => record.actual_work = value,
        "Unit" => record.work_unit = value,
        "Start of Execution" => record.start_of_execution = value,
        "Bsc start" => record.bsc_start = value,
        "Actual Start (Time)" => record.actual_start = value,
        "Required Start" => record.required_start = value,
        "Total Cost" => record.total_cost = value,
        "Labor Cost" => record.labor_cost = value,
        "Material Cost" => record.material_cost = value,
        "Other Cost" => record.other_cost = value,
        _ => {}
    }
}

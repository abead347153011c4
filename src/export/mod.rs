//! 내보내기 포매터
//!
//! 결과 행(TableRow)을 반복 그룹(작업 내역, 자재) 전개 방식으로
//! 평탄화해 스프레드시트용 행(ExportRow)을 만든다. 오더 경계마다
//! 빈 구분 행을 넣는다.

pub mod excel;

use crate::rows::TableRow;

/// 내보내기 컬럼 제목 (순서 고정)
pub const EXPORT_HEADERS: [&str; 17] = [
    "작업일자",
    "Order No",
    "Order Short Text",
    "Equipment",
    "설비명",
    "설비호기",
    "작업반",
    "정비 Short Text",
    "작업 시작일",
    "작업자 이름",
    "작업 시간",
    "작업 시간 단위",
    "정비실적 Long Text",
    "자재 코드",
    "자재 설명",
    "수량",
    "단위",
];

/// 스프레드시트 한 행 (구분 행은 전 컬럼 빈 문자열)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportRow {
    pub work_date: String,
    pub order_no: String,
    pub order_short_text: String,
    pub equipment: String,
    pub equi_text: String,
    pub cost_center: String,
    pub workctr: String,
    pub confirm_text: String,
    pub work_start: String,
    pub worker_name: String,
    pub work_hours: String,
    pub work_unit: String,
    pub long_text: String,
    pub material: String,
    pub material_desc: String,
    pub qty: String,
    pub uom: String,
}

impl ExportRow {
    /// 컬럼 제목 순서와 같은 값 배열
    pub fn values(&self) -> [&str; 17] {
        [
            &self.work_date,
            &self.order_no,
            &self.order_short_text,
            &self.equipment,
            &self.equi_text,
            &self.cost_center,
            &self.workctr,
            &self.confirm_text,
            &self.work_start,
            &self.worker_name,
            &self.work_hours,
            &self.work_unit,
            &self.long_text,
            &self.material,
            &self.material_desc,
            &self.qty,
            &self.uom,
        ]
    }

    pub fn is_separator(&self) -> bool {
        self.values().iter().all(|v| v.is_empty())
    }
}

/// 오더 하나를 반복 그룹 전개로 평탄화한다.
///
/// i = 0..max(작업 내역 수, 자재 수, 1) 범위로 행을 만들고,
/// 기본 컬럼은 매 행 반복, long text는 첫 행(i == 0)에만 싣는다.
fn flatten_order(row: &TableRow) -> Vec<ExportRow> {
    let details = &row.detail.work_details;
    let materials = &row.detail.materials;
    let row_count = details.len().max(materials.len()).max(1);

    (0..row_count)
        .map(|i| {
            let mut out = ExportRow {
                work_date: row.work_date.clone(),
                order_no: row.order_no.clone(),
                order_short_text: row.order_short_text.clone(),
                equipment: row.equipment.clone(),
                equi_text: row.equi_text.clone(),
                cost_center: row.cost_center.clone(),
                workctr: row.workctr.clone(),
                confirm_text: row.confirm_text.clone(),
                ..Default::default()
            };
            if i == 0 {
                out.long_text = row.detail.long_text.clone();
            }
            if let Some(detail) = details.get(i) {
                out.work_start = detail.start_of_execution.clone();
                out.worker_name = detail.worker_name.clone();
                out.work_hours = detail.actual_work.clone();
                out.work_unit = detail.work_unit.clone();
            }
            if let Some(material) = materials.get(i) {
                out.material = material.material.clone();
                out.material_desc = material.description.clone();
                out.qty = material.qty.clone();
                out.uom = material.uom.clone();
            }
            out
        })
        .collect()
}

/// 결과 행 전체를 평탄화한다 (구분 행 없음).
pub fn flatten_rows(rows: &[TableRow]) -> Vec<ExportRow> {
    rows.iter().flat_map(flatten_order).collect()
}

/// 오더 경계마다 빈 구분 행을 넣는다.
/// 첫 오더 앞과 같은 오더의 행 사이에는 넣지 않는다.
pub fn insert_separators(flattened: Vec<ExportRow>) -> Vec<ExportRow> {
    let mut out: Vec<ExportRow> = Vec::with_capacity(flattened.len());
    let mut prev_order: Option<String> = None;
    for row in flattened {
        if let Some(prev) = &prev_order {
            if *prev != row.order_no {
                out.push(ExportRow::default());
            }
        }
        prev_order = Some(row.order_no.clone());
        out.push(row);
    }
    out
}

/// 결과 행을 구분 행 포함 최종 시트 행으로 만든다.
pub fn build_export_rows(rows: &[TableRow]) -> Vec<ExportRow> {
    insert_separators(flatten_rows(rows))
}

/// 기본 파일 이름: 설비번호 필터가 있으면 앞에 붙인다.
pub fn default_export_name(equipment_no: &str) -> String {
    let equipment_no = equipment_no.trim();
    if equipment_no.is_empty() {
        "search_results.xlsx".to_string()
    } else {
        format!("{}_search_results.xlsx", equipment_no)
    }
}

//! Excel 생성
//!
//! 평탄화된 내보내기 행을 rust_xlsxwriter로 기록한다.
//! 컬럼 폭은 셀 내용의 가장 긴 줄 기준으로 계산해 최소/최대로 자른다.

use crate::error::{Result, SearchError};
use crate::export::{ExportRow, EXPORT_HEADERS};
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::path::Path;

const SHEET_NAME: &str = "Search Results";
const MIN_COLUMN_WIDTH: f64 = 10.0;
const MAX_COLUMN_WIDTH: f64 = 80.0;
const ROW_HEIGHT: f64 = 25.0;

/// 시트 행을 xlsx 바이트로 만든다.
pub fn generate_excel_buffer(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(rows)?;
    workbook
        .save_to_buffer()
        .map_err(|e| SearchError::ExcelGeneration(format!("버퍼 저장 실패: {}", e)))
}

/// 시트 행을 xlsx 파일로 저장한다.
pub fn generate_excel(rows: &[ExportRow], output_path: &Path) -> Result<()> {
    let mut workbook = build_workbook(rows)?;
    workbook
        .save(output_path)
        .map_err(|e| SearchError::ExcelGeneration(format!("파일 저장 실패: {}", e)))?;
    Ok(())
}

fn build_workbook(rows: &[ExportRow]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| SearchError::ExcelGeneration(format!("시트 이름 설정 실패: {}", e)))?;

    let header_format = Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top);
    let cell_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(|e| SearchError::ExcelGeneration(format!("머리글 기록 실패: {}", e)))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let sheet_row = (i + 1) as u32;
        for (col, value) in row.values().iter().enumerate() {
            worksheet
                .write_string_with_format(sheet_row, col as u16, *value, &cell_format)
                .map_err(|e| SearchError::ExcelGeneration(format!("셀 기록 실패: {}", e)))?;
        }
    }

    // 컬럼 폭: 머리글 포함, 여러 줄 셀은 가장 긴 줄 기준
    for (col, width) in column_widths(rows).into_iter().enumerate() {
        worksheet
            .set_column_width(col as u16, width)
            .map_err(|e| SearchError::ExcelGeneration(format!("컬럼 폭 설정 실패: {}", e)))?;
    }

    // 머리글 포함 전 행 고정 높이
    for sheet_row in 0..=(rows.len() as u32) {
        worksheet
            .set_row_height(sheet_row, ROW_HEIGHT)
            .map_err(|e| SearchError::ExcelGeneration(format!("행 높이 설정 실패: {}", e)))?;
    }

    Ok(workbook)
}

/// 컬럼별 폭 계산: 가장 긴 줄 길이 + 2, [최소, 최대] 범위로 제한
fn column_widths(rows: &[ExportRow]) -> [f64; 17] {
    let mut longest = [0usize; 17];
    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        longest[col] = header.chars().count();
    }
    for row in rows {
        for (col, value) in row.values().iter().enumerate() {
            for line in value.lines() {
                longest[col] = longest[col].max(line.chars().count());
            }
        }
    }
    longest.map(|len| ((len + 2) as f64).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH))
}

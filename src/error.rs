use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("데이터 소스 디코딩 실패: {0} (utf-8-sig/cp949/utf-8 모두 실패)")]
    Decode(String),

    #[error("CSV 행 해석 오류: {0}")]
    CsvParse(String),

    #[error("데이터베이스 읽기 오류: {0}")]
    Database(String),

    #[error("JSON 해석 오류: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO 오류: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel 생성 오류: {0}")]
    ExcelGeneration(String),

    #[error("검색 결과가 없습니다")]
    NoResults,

    #[error("오더를 찾을 수 없습니다: {0}")]
    OrderNotFound(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

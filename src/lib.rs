//! SAP 정비 오더 검색 라이브러리
//!
//! 원본 테이블(CSV/SQLite)을 메모리 스냅샷으로 빌드하고,
//! 다중 조건 검색과 오더 단위 집계, Excel 내보내기를 제공한다.

pub mod category;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod export;
pub mod loader;
pub mod mappings;
pub mod rows;
pub mod search;
pub mod selector;
pub mod store;

pub use category::CategoryIndex;
pub use dataset::{CanonicalDataset, Record};
pub use error::{Result, SearchError};
pub use export::{build_export_rows, default_export_name, ExportRow};
pub use mappings::{CategoryMappings, TermMappings, DEFAULT_RESULT_LIMIT};
pub use rows::{build_table_rows, DetailPayload, TableRow};
pub use search::{apply_filters, count_distinct_orders, SearchSelection};
pub use selector::select_order_numbers;
pub use store::{DataStore, Snapshot};

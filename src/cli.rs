use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sap-maint-search")]
#[command(about = "SAP 정비 오더 검색·엑셀 내보내기 도구", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 원본 데이터 파일 (.csv 또는 .db)
    #[arg(long, default_value = "data/sap_reports.csv", global = true)]
    pub source: PathBuf,

    /// 매핑 문서 디렉터리 (top_category_mappings.json 등)
    #[arg(long, default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// 상세 로그를 출력
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 조건 검색 후 결과 목록을 출력
    Search {
        /// 설비번호 부분 일치
        #[arg(short = 'e', long)]
        equipment_no: Option<String>,

        /// 오더번호 부분 일치
        #[arg(short = 'o', long)]
        order_no: Option<String>,

        /// 설비명/오더명 단어 검색 (한/영 혼용)
        #[arg(short = 'q', long)]
        name: Option<String>,

        /// 상위 분류 (설비호기)
        #[arg(long)]
        top: Option<String>,

        /// 중위 분류 (작업반)
        #[arg(long)]
        middle: Option<String>,

        /// 하위 분류 (설비유형)
        #[arg(long)]
        sub: Option<String>,

        /// 첨부 링크 있는 오더만
        #[arg(long)]
        with_links: bool,

        /// 상세내역(자재·작업자) 검색어
        #[arg(long)]
        detail: Option<String>,

        /// 결과 건수 제한 (기본 200, 그보다 작은 값은 200으로 보정)
        #[arg(short, long)]
        limit: Option<usize>,

        /// 결과를 JSON으로 출력
        #[arg(long)]
        json: bool,

        /// Excel 파일로 내보내기 (디렉터리를 주면 기본 이름으로 저장)
        #[arg(short = 'x', long, value_name = "PATH")]
        export: Option<PathBuf>,
    },

    /// 오더 하나의 상세 내역을 출력
    Detail {
        /// 오더번호 (정확히 일치)
        #[arg(required = true)]
        order_no: String,

        /// 상세 페이로드를 JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 분류 옵션 트리를 출력
    Categories {
        /// 상위 분류 지정 시 해당 트리만
        #[arg(long)]
        top: Option<String>,
    },
}

//! 스냅샷 저장소
//!
//! 빌드된 데이터셋과 분류 인덱스를 소스 수정 시각 기준으로 캐시한다.
//! 수정 시각이 바뀌면 전체를 다시 빌드해 통째로 교체한다
//! (증분 갱신 없음). 재빌드는 뮤텍스로 직렬화되어 동시에 하나만
//! 실행되고, 그동안 다른 요청은 잠시 대기한다.

use crate::category::CategoryIndex;
use crate::dataset::CanonicalDataset;
use crate::error::Result;
use crate::loader::load_records;
use crate::mappings::{CategoryMappings, TermMappings};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::info;

/// 소스 수정 시각을 읽을 수 없을 때 쓰는 센티널
const MTIME_UNKNOWN: SystemTime = SystemTime::UNIX_EPOCH;

/// 한 번의 빌드 결과 (불변, 요청 간 공유)
#[derive(Debug, Default)]
pub struct Snapshot {
    pub dataset: CanonicalDataset,
    pub index: CategoryIndex,
}

struct CachedState {
    mtime: SystemTime,
    snapshot: Arc<Snapshot>,
}

/// 데이터셋 저장소
///
/// 전역 가변 상태 대신 핸들러에 주입해 쓰는 명시적 객체.
pub struct DataStore {
    source_path: PathBuf,
    category_mappings: CategoryMappings,
    terms: TermMappings,
    cached: Mutex<Option<CachedState>>,
}

impl DataStore {
    pub fn new(
        source_path: impl Into<PathBuf>,
        category_mappings: CategoryMappings,
        terms: TermMappings,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            category_mappings,
            terms,
            cached: Mutex::new(None),
        }
    }

    /// 매핑 문서를 데이터 디렉터리 관례 위치에서 읽어 저장소를 만든다.
    /// (`top_category_mappings.json`, `unit_mappings.json` — 없으면 빈 테이블)
    pub fn open(source_path: impl Into<PathBuf>, data_dir: &Path) -> Self {
        let category_mappings = CategoryMappings::load(&data_dir.join("top_category_mappings.json"));
        let terms = TermMappings::load(&data_dir.join("unit_mappings.json"));
        Self::new(source_path, category_mappings, terms)
    }

    pub fn category_mappings(&self) -> &CategoryMappings {
        &self.category_mappings
    }

    pub fn terms(&self) -> &TermMappings {
        &self.terms
    }

    pub fn priority_marker(&self) -> &str {
        &self.category_mappings.priority_marker
    }

    /// 현재 스냅샷을 돌려준다. 소스 수정 시각이 캐시와 다르면
    /// (또는 아직 캐시가 없으면) 동기적으로 다시 빌드한다.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let current_mtime = self.source_mtime();

        // 오염된 락도 복구해 쓴다: 보호 대상이 (mtime, 스냅샷) 교체뿐이라
        // 찢어진 중간 상태가 없고, 최악의 경우 한 번 더 재빌드할 뿐이다.
        let mut cached = match self.cached.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(state) = cached.as_ref() {
            if state.mtime == current_mtime {
                return Ok(Arc::clone(&state.snapshot));
            }
        }

        let snapshot = Arc::new(self.rebuild()?);
        info!(
            source = %self.source_path.display(),
            records = snapshot.dataset.len(),
            "스냅샷 재빌드"
        );
        *cached = Some(CachedState {
            mtime: current_mtime,
            snapshot: Arc::clone(&snapshot),
        });
        Ok(snapshot)
    }

    fn rebuild(&self) -> Result<Snapshot> {
        let records = load_records(&self.source_path)?;
        let dataset = CanonicalDataset::build(records);
        let index = CategoryIndex::build(&dataset, &self.category_mappings);
        Ok(Snapshot { dataset, index })
    }

    fn source_mtime(&self) -> SystemTime {
        std::fs::metadata(&self.source_path)
            .and_then(|meta| meta.modified())
            .unwrap_or(MTIME_UNKNOWN)
    }
}

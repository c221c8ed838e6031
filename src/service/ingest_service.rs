use crate::common::*;

use crate::model::configs::indices_config::*;
use crate::model::index_info::*;
use crate::model::indexing_rate::*;
use crate::model::store::*;

use crate::traits::service::ingest_service_trait::*;

/* 3분 주기 수집 가정으로 슬롯 오프셋 1/5/20 이 3/15/60분 창이 된다 */
const WINDOW_OFFSET_3M: usize = 1;
const WINDOW_OFFSET_15M: usize = 5;
const WINDOW_OFFSET_60M: usize = 20;

#[doc = "히스토리 링에서 샤드당 색인속도를 유도하는 서비스"]
#[derive(Debug, new)]
pub struct IngestServiceImpl {
    store: Arc<MetricStore>,
}

/* (스냅샷 시각, index_base 로 키잉한 엔트리) - 창 하나의 조회 테이블 */
struct WindowLookup<'a> {
    snapshot_time: i64,
    by_base: HashMap<&'a str, &'a IndexInfo>,
}

impl<'a> WindowLookup<'a> {
    fn from_snapshot(snapshot: Option<&'a Arc<IndicesSnapshot>>) -> Option<Self> {
        let snapshot: &Arc<IndicesSnapshot> = snapshot?;
        Some(WindowLookup {
            snapshot_time: snapshot.snapshot_time,
            by_base: snapshot
                .entries
                .values()
                .map(|info| (info.index_base.as_str(), info))
                .collect(),
        })
    }
}

#[doc = "창 하나의 속도 계산."]
/// 이전 스냅샷에 같은 index_base 가 같은 seq_no 로 존재하고 (롤오버 없음),
/// 스토리지가 줄지 않았고 시간차가 양수일 때만 값이 나온다. 그 외에는 -1.
fn window_rate(
    current: &IndexInfo,
    current_time: i64,
    shards: f64,
    window: Option<&WindowLookup<'_>>,
) -> f64 {
    let window: &WindowLookup<'_> = match window {
        Some(window) => window,
        None => return RATE_UNAVAILABLE,
    };

    let prev: &IndexInfo = match window.by_base.get(current.index_base.as_str()) {
        Some(prev) => prev,
        None => return RATE_UNAVAILABLE,
    };

    if current.seq_no != prev.seq_no {
        return RATE_UNAVAILABLE;
    }

    let time_diff: f64 = (current_time - window.snapshot_time) as f64;
    if time_diff <= 0.0 || current.primary_storage < prev.primary_storage {
        return RATE_UNAVAILABLE;
    }

    let storage_diff: f64 = (current.primary_storage - prev.primary_storage) as f64;
    (storage_diff * 1000.0) / (shards * time_diff)
}

fn creation_rate(current: &IndexInfo, current_time: i64, shards: f64) -> f64 {
    if current.creation_time <= 0 || current_time <= current.creation_time {
        return RATE_UNAVAILABLE;
    }

    let time_diff: f64 = (current_time - current.creation_time) as f64;
    (current.primary_storage as f64 * 1000.0) / (shards * time_diff)
}

impl IngestServiceImpl {
    #[doc = "클러스터 하나의 색인속도 유도 - 링이 비어있으면 None"]
    fn derive_cluster_rate(history: &IndicesHistory) -> Option<ClusterIndexingRate> {
        let ring: Vec<Option<Arc<IndicesSnapshot>>> = history.clone_ring();
        let latest_idx: usize = ring.iter().rposition(Option::is_some)?;
        let latest: &Arc<IndicesSnapshot> = ring[latest_idx].as_ref()?;

        fn window_snapshot(
            ring: &[Option<Arc<IndicesSnapshot>>],
            latest_idx: usize,
            offset: usize,
        ) -> Option<&Arc<IndicesSnapshot>> {
            if latest_idx < offset {
                return None;
            }
            ring[latest_idx - offset].as_ref()
        }

        let p_3m = WindowLookup::from_snapshot(window_snapshot(&ring, latest_idx, WINDOW_OFFSET_3M));
        let p_15m =
            WindowLookup::from_snapshot(window_snapshot(&ring, latest_idx, WINDOW_OFFSET_15M));
        let p_60m =
            WindowLookup::from_snapshot(window_snapshot(&ring, latest_idx, WINDOW_OFFSET_60M));

        let current_time: i64 = latest.snapshot_time;
        let mut per_index: HashMap<String, IndexingRate> = HashMap::new();

        for current in latest.entries.values() {
            let shards: f64 = current.primary_shards.max(1) as f64;

            let rate: IndexingRate = IndexingRate {
                from_creation: creation_rate(current, current_time, shards),
                last_3_minutes: window_rate(current, current_time, shards, p_3m.as_ref()),
                last_15_minutes: window_rate(current, current_time, shards, p_15m.as_ref()),
                last_60_minutes: window_rate(current, current_time, shards, p_60m.as_ref()),
                number_of_shards: current.primary_shards,
            };

            per_index.insert(current.index_base.clone(), rate);
        }

        Some(ClusterIndexingRate {
            timestamp: current_time,
            per_index,
        })
    }
}

#[async_trait]
impl IngestService for IngestServiceImpl {
    #[doc = "전체 클러스터의 색인속도를 유도해서 저장소에 원자적으로 교체"]
    async fn analyse_ingest(&self, params: ExcludeParams) -> Result<()> {
        info!("[analyseIngest] Starting indexing rate analysis");

        let histories: Vec<(String, Arc<IndicesHistory>)> = self.store.histories_snapshot();

        let mut processed: usize = 0;
        let mut skipped: usize = 0;

        for (cluster_name, history) in histories {
            if params.exclude_clusters.contains(&cluster_name) {
                info!("[analyseIngest] Skipping excluded cluster: {}", cluster_name);
                skipped += 1;
                continue;
            }

            match Self::derive_cluster_rate(&history) {
                Some(cluster_rate) => {
                    info!(
                        "[analyseIngest] Cluster {}: Calculated rates for {} indices",
                        cluster_name,
                        cluster_rate.per_index.len()
                    );
                    self.store.set_indexing_rate(&cluster_name, cluster_rate);
                    processed += 1;
                }
                None => {
                    warn!(
                        "[analyseIngest] Cluster {}: No snapshots yet, skipping",
                        cluster_name
                    );
                    skipped += 1;
                }
            }
        }

        info!(
            "[analyseIngest] Completed: {} clusters processed, {} skipped",
            processed, skipped
        );

        Ok(())
    }
}

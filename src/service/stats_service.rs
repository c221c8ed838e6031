use crate::common::*;

use crate::model::configs::indices_config::*;
use crate::model::index_info::*;
use crate::model::stat_by_day::*;
use crate::model::store::*;

use crate::utils_modules::io_utils::*;
use crate::utils_modules::time_utils::*;

use crate::traits::service::stats_service_trait::*;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[doc = "일별 인덱스 통계 엔진 - 백업파일 복원/롤포워드/갱신/영속화"]
#[derive(Debug, new)]
pub struct StatsServiceImpl {
    store: Arc<MetricStore>,
    backup_path: PathBuf,
    history_days: usize,
}

impl StatsServiceImpl {
    #[doc = "클러스터별 최신 스냅샷을 미리 모아주는 함수 - 통계 락과 히스토리 락을 겹쳐 잡지 않기 위함"]
    fn latest_snapshots(&self) -> HashMap<String, Arc<IndicesSnapshot>> {
        self.store
            .histories_snapshot()
            .into_iter()
            .filter_map(|(cluster_name, history)| {
                history
                    .latest_snapshot()
                    .map(|snapshot| (cluster_name, snapshot))
            })
            .collect()
    }

    fn restore_from_backup(&self, exclude_clusters: &[String]) -> Result<()> {
        let content: String = std::fs::read_to_string(&self.backup_path).map_err(|e| {
            anyhow!(
                "[StatsServiceImpl->restore_from_backup] read {:?}: {:?}",
                self.backup_path,
                e
            )
        })?;

        let mut restored: HashMap<String, IndicesStatsByDay> = serde_json::from_str(&content)
            .map_err(|e| {
                anyhow!(
                    "[StatsServiceImpl->restore_from_backup] decode {:?}: {:?}",
                    self.backup_path,
                    e
                )
            })?;

        for cluster_name in exclude_clusters {
            if restored.remove(cluster_name).is_some() {
                info!(
                    "[updateStatsByDay] Removed excluded cluster from stats: {}",
                    cluster_name
                );
            }
        }

        info!(
            "[updateStatsByDay] Restored statistics for {} clusters from backup",
            restored.len()
        );
        self.store.replace_stats(restored);

        Ok(())
    }

    #[doc = "복원된 통계를 경과일수만큼 밀고 최신 스냅샷으로 슬롯 0 을 덮어쓰는 함수"]
    fn refresh_clusters(
        &self,
        days_forward: usize,
        snapshots: &HashMap<String, Arc<IndicesSnapshot>>,
        now: i64,
    ) {
        self.store.with_stats_mut(|all_stats| {
            for (cluster_name, cluster_stats) in all_stats.iter_mut() {
                let snapshot: &Arc<IndicesSnapshot> = match snapshots.get(cluster_name) {
                    Some(snapshot) => snapshot,
                    None => {
                        warn!(
                            "[updateStatsByDay] No snapshots found for cluster {}, skipping update",
                            cluster_name
                        );
                        continue;
                    }
                };

                /* 스냅샷에서 사라진 인덱스는 (롤오버 등) 통계에서도 제거 */
                cluster_stats
                    .stat_history
                    .retain(|index_name, _| snapshot.entries.contains_key(index_name));

                for (index_name, info) in &snapshot.entries {
                    let current_stat: IndexStat =
                        IndexStat::new(snapshot.snapshot_time, info.total_storage, info.doc_count);

                    match cluster_stats.stat_history.get_mut(index_name) {
                        Some(stat_history) => {
                            stat_history.roll_forward(days_forward);
                            stat_history.stats[0] = Some(current_stat);
                        }
                        None => {
                            let mut stat_history: IndexStatHistory =
                                IndexStatHistory::new(index_name, self.history_days);
                            stat_history.stats[0] = Some(current_stat);
                            cluster_stats
                                .stat_history
                                .insert(index_name.clone(), stat_history);
                            info!(
                                "[updateStatsByDay] Added new index {} to cluster {} stats",
                                index_name, cluster_name
                            );
                        }
                    }
                }

                cluster_stats.last_update_time = now;
                info!(
                    "[updateStatsByDay] Updated stats for cluster {} with {} indices",
                    cluster_name,
                    cluster_stats.stat_history.len()
                );
            }
        });
    }

    #[doc = "백업이 없을 때 최신 스냅샷으로 통계를 초기화"]
    fn initialize_stats(
        &self,
        exclude_clusters: &[String],
        snapshots: &HashMap<String, Arc<IndicesSnapshot>>,
        now: i64,
    ) {
        let cluster_names: Vec<String> = self
            .store
            .cluster_names()
            .into_iter()
            .filter(|name| !exclude_clusters.contains(name))
            .collect();

        info!(
            "[updateStatsByDay] Initializing statistics for {} clusters",
            cluster_names.len()
        );

        for cluster_name in cluster_names {
            let snapshot: &Arc<IndicesSnapshot> = match snapshots.get(&cluster_name) {
                Some(snapshot) => snapshot,
                None => {
                    warn!(
                        "[updateStatsByDay] No history found for cluster {}, skipping",
                        cluster_name
                    );
                    continue;
                }
            };

            let mut cluster_stats: IndicesStatsByDay = IndicesStatsByDay {
                last_update_time: now,
                stat_history: HashMap::new(),
            };

            for (index_name, info) in &snapshot.entries {
                let mut stat_history: IndexStatHistory =
                    IndexStatHistory::new(index_name, self.history_days);
                stat_history.stats[0] = Some(IndexStat::new(
                    snapshot.snapshot_time,
                    info.total_storage,
                    info.doc_count,
                ));
                cluster_stats
                    .stat_history
                    .insert(index_name.clone(), stat_history);
            }

            info!(
                "[updateStatsByDay] Initialized stats for cluster {} with {} indices",
                cluster_name,
                cluster_stats.stat_history.len()
            );

            self.store.with_stats_mut(|all_stats| {
                all_stats.insert(cluster_name.clone(), cluster_stats);
            });
        }
    }

    #[doc = "직렬화는 저장소의 read lock 안에서, 파일쓰기는 락 해제 후. 실패는 로그만 남긴다 (다음 주기에 재시도)"]
    fn persist(&self) {
        let content: String = match self.store.stats_to_pretty_json() {
            Ok(content) => content,
            Err(e) => {
                error!("[updateStatsByDay] Failed to serialize stats: {:?}", e);
                return;
            }
        };

        match write_json_atomic(&self.backup_path, &content) {
            Ok(_) => info!(
                "[updateStatsByDay] Saved statistics to backup file: {:?}",
                self.backup_path
            ),
            Err(e) => error!("[updateStatsByDay] Failed to save backup: {:?}", e),
        }
    }
}

#[async_trait]
impl StatsService for StatsServiceImpl {
    async fn update_stats_by_day(&self, params: ExcludeParams) -> Result<()> {
        info!("[updateStatsByDay] Starting daily statistics update job");

        let now: i64 = time_now_millis();
        let snapshots: HashMap<String, Arc<IndicesSnapshot>> = self.latest_snapshots();

        if self.backup_path.is_file() {
            info!(
                "[updateStatsByDay] Backup file found at {:?}, restoring...",
                self.backup_path
            );
            self.restore_from_backup(&params.exclude_clusters)?;

            let last_update_time: i64 = self
                .store
                .with_stats_mut(|all_stats| {
                    all_stats.values().next().map(|stats| stats.last_update_time)
                })
                .ok_or_else(|| {
                    anyhow!("[StatsServiceImpl->update_stats_by_day] no statistics found after restore")
                })?;

            let hours_elapsed: f64 = (now - last_update_time) as f64 / MILLIS_PER_HOUR;

            if hours_elapsed < 24.0 {
                info!(
                    "[updateStatsByDay] Last update was {:.1} hours ago, no update needed",
                    hours_elapsed
                );
            } else {
                let days_forward: usize = (hours_elapsed / 24.0).ceil() as usize;
                info!(
                    "[updateStatsByDay] Last update was {:.1} hours ago ({} days), updating statistics",
                    hours_elapsed, days_forward
                );
                self.refresh_clusters(days_forward, &snapshots, now);
            }
        } else {
            info!("[updateStatsByDay] No backup file found, initializing new statistics");
            self.initialize_stats(&params.exclude_clusters, &snapshots, now);
        }

        self.persist();

        info!("[updateStatsByDay] Daily statistics update completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::enums::index_health::IndexHealth;
    use crate::model::index_info::IndexInfo;

    fn seed_snapshot(store: &MetricStore, cluster: &str, time: i64, docs: u64, storage: u64) {
        let mut snapshot = IndicesSnapshot::new(time);
        snapshot.entries.insert(
            String::from("logs-001"),
            IndexInfo::new(
                IndexHealth::Green,
                true,
                docs,
                String::from("logs-001"),
                String::from("logs"),
                1,
                1,
                time - 1000,
                storage,
                storage / 2,
            ),
        );

        let history = store.history_or_create(cluster, 5);
        history.append(Arc::new(snapshot));
    }

    fn backup_with_slot0(
        last_update_time: i64,
        slot0: IndexStat,
        days: usize,
    ) -> HashMap<String, IndicesStatsByDay> {
        let mut stat_history = IndexStatHistory::new("logs-001", days);
        stat_history.stats[0] = Some(slot0);

        let mut per_index = HashMap::new();
        per_index.insert(String::from("logs-001"), stat_history);

        let mut map = HashMap::new();
        map.insert(
            String::from("es01"),
            IndicesStatsByDay {
                last_update_time,
                stat_history: per_index,
            },
        );
        map
    }

    #[tokio::test]
    async fn roll_forward_three_days() {
        let dir = tempfile::tempdir().unwrap();
        let backup_path = dir.path().join("statsInDays.json");

        let now: i64 = time_now_millis();
        let old_stat = IndexStat::new(now - 259_000_000, 111, 42);

        /* 3일 전보다 1분 덜 지난 시점 -> daysForward = 3 */
        let backup = backup_with_slot0(now - (72 * 3_600_000 - 60_000), old_stat, 30);
        std::fs::write(&backup_path, serde_json::to_string_pretty(&backup).unwrap()).unwrap();

        let store = Arc::new(MetricStore::new());
        store.upsert_cluster_with("es01", |_| {});
        seed_snapshot(&store, "es01", now - 5_000, 99, 5_000);

        let service = StatsServiceImpl::new(Arc::clone(&store), backup_path.clone(), 30);
        service
            .update_stats_by_day(ExcludeParams::default())
            .await
            .unwrap();

        let stats = store.stats_for("es01").unwrap();
        let history = stats.stat_history.get("logs-001").unwrap();

        assert_eq!(history.stats[3], Some(old_stat));
        assert_eq!(history.stats[1], None);
        assert_eq!(history.stats[2], None);

        let current = history.stats[0].unwrap();
        assert_eq!(current.doc_count, 99);
        assert_eq!(current.total_size, 5_000);

        /* 백업파일이 다시 영속화되었는지 */
        let persisted: HashMap<String, IndicesStatsByDay> =
            serde_json::from_str(&std::fs::read_to_string(&backup_path).unwrap()).unwrap();
        assert_eq!(persisted.get("es01").unwrap(), &stats);
    }

    #[tokio::test]
    async fn fresh_restore_skips_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let backup_path = dir.path().join("statsInDays.json");

        let now: i64 = time_now_millis();
        let slot0 = IndexStat::new(now - 3_600_000, 500, 7);
        let backup = backup_with_slot0(now - 3_600_000, slot0, 30);
        std::fs::write(&backup_path, serde_json::to_string(&backup).unwrap()).unwrap();

        let store = Arc::new(MetricStore::new());
        store.upsert_cluster_with("es01", |_| {});
        seed_snapshot(&store, "es01", now, 999, 9_999);

        let service = StatsServiceImpl::new(Arc::clone(&store), backup_path, 30);
        service
            .update_stats_by_day(ExcludeParams::default())
            .await
            .unwrap();

        /* 24시간 미경과 - 복원된 슬롯 0 이 그대로 남는다 */
        let stats = store.stats_for("es01").unwrap();
        assert_eq!(stats.stat_history.get("logs-001").unwrap().stats[0], Some(slot0));
    }

    #[tokio::test]
    async fn no_backup_initializes_from_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let backup_path = dir.path().join("statsInDays.json");

        let store = Arc::new(MetricStore::new());
        store.upsert_cluster_with("es01", |_| {});
        store.upsert_cluster_with("skipme", |_| {});

        let now: i64 = time_now_millis();
        seed_snapshot(&store, "es01", now, 10, 1_000);
        seed_snapshot(&store, "skipme", now, 10, 1_000);

        let service = StatsServiceImpl::new(Arc::clone(&store), backup_path.clone(), 30);
        service
            .update_stats_by_day(ExcludeParams {
                exclude_clusters: vec![String::from("skipme")],
            })
            .await
            .unwrap();

        let stats = store.stats_for("es01").unwrap();
        let slot0 = stats.stat_history.get("logs-001").unwrap().stats[0].unwrap();
        assert_eq!(slot0.doc_count, 10);

        assert!(store.stats_for("skipme").is_none());
        assert!(backup_path.is_file());
    }

    #[test]
    fn backup_round_trip_is_lossless() {
        let now: i64 = 1_700_000_000_000;
        let backup = backup_with_slot0(now, IndexStat::new(now, 123, 456), 30);

        let encoded = serde_json::to_string_pretty(&backup).unwrap();
        let decoded: HashMap<String, IndicesStatsByDay> = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, backup);
    }
}

use crate::common::*;

use crate::model::bulk_tasks::*;
use crate::model::cluster::*;
use crate::model::index_info::*;
use crate::model::indexing_rate::*;
use crate::model::stat_by_day::*;
use crate::model::tpw_queue::*;
use crate::model::write_pressure::*;

#[derive(Debug, Default)]
struct ClusterRegistry {
    map: HashMap<String, ClusterData>,
    order: Vec<String>,
}

#[doc = "프로세스 단위 공유상태 저장소."]
/// 맵마다 독립된 RwLock 을 가진다. 둘 이상을 잡아야 하면 clusters 를 먼저 잡는다.
/// 락을 잡은 채로 네트워크/파일 I/O 를 해서는 안 되며, 읽기측은 필요한 것을
/// 복사한 뒤 즉시 락을 푼다.
#[derive(Debug, Default)]
pub struct MetricStore {
    clusters: RwLock<ClusterRegistry>,
    indices_history: RwLock<HashMap<String, Arc<IndicesHistory>>>,
    indexing_rate: RwLock<HashMap<String, Arc<ClusterIndexingRate>>>,
    stats_by_day: RwLock<HashMap<String, IndicesStatsByDay>>,
    tpw_queue: RwLock<HashMap<String, ClustersTpwQueue>>,
    bulk_tasks: RwLock<HashMap<String, BulkTaskHistory>>,
    write_pressure: RwLock<HashMap<String, WritePressureEvent>>,
    master_endpoints: RwLock<HashMap<String, String>>,
}

fn read_guard<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_guard<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MetricStore {
    pub fn new() -> Self {
        MetricStore::default()
    }

    /* ---------- clusters ---------- */

    #[doc = "이름으로 클러스터를 찾거나 새로 만든 뒤 클로저로 수정해주는 함수"]
    pub fn upsert_cluster_with<F>(&self, cluster_name: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut ClusterData),
    {
        let mut registry = write_guard(&self.clusters);

        let created: bool = if !registry.map.contains_key(cluster_name) {
            registry
                .map
                .insert(cluster_name.to_string(), ClusterData::named(cluster_name));
            registry.order.push(cluster_name.to_string());
            true
        } else {
            false
        };

        if let Some(cluster) = registry.map.get_mut(cluster_name) {
            mutate(cluster);
        }

        created
    }

    #[doc = "이미 등록된 클러스터만 수정 - 없으면 false"]
    pub fn update_cluster<F>(&self, cluster_name: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut ClusterData),
    {
        let mut registry = write_guard(&self.clusters);
        match registry.map.get_mut(cluster_name) {
            Some(cluster) => {
                mutate(cluster);
                true
            }
            None => false,
        }
    }

    pub fn cluster(&self, cluster_name: &str) -> Option<ClusterData> {
        read_guard(&self.clusters).map.get(cluster_name).cloned()
    }

    #[doc = "등록순서를 유지한 전체 클러스터 복사본"]
    pub fn clusters_snapshot(&self) -> Vec<ClusterData> {
        let registry = read_guard(&self.clusters);
        registry
            .order
            .iter()
            .filter_map(|name| registry.map.get(name).cloned())
            .collect()
    }

    pub fn cluster_names(&self) -> Vec<String> {
        read_guard(&self.clusters).order.clone()
    }

    pub fn cluster_count(&self) -> usize {
        read_guard(&self.clusters).map.len()
    }

    pub fn set_active_endpoint(&self, cluster_name: &str, endpoint: Option<String>) -> bool {
        self.update_cluster(cluster_name, |cluster| cluster.active_endpoint = endpoint)
    }

    /* ---------- indices history ---------- */

    pub fn history_for(&self, cluster_name: &str) -> Option<Arc<IndicesHistory>> {
        read_guard(&self.indices_history).get(cluster_name).cloned()
    }

    #[doc = "히스토리가 없으면 지정된 용량으로 만들어서 반환"]
    pub fn history_or_create(&self, cluster_name: &str, slots: usize) -> Arc<IndicesHistory> {
        let mut histories = write_guard(&self.indices_history);
        histories
            .entry(cluster_name.to_string())
            .or_insert_with(|| Arc::new(IndicesHistory::new(slots)))
            .clone()
    }

    pub fn histories_snapshot(&self) -> Vec<(String, Arc<IndicesHistory>)> {
        read_guard(&self.indices_history)
            .iter()
            .map(|(name, history)| (name.clone(), history.clone()))
            .collect()
    }

    /* ---------- indexing rate ---------- */

    pub fn set_indexing_rate(&self, cluster_name: &str, rate: ClusterIndexingRate) {
        write_guard(&self.indexing_rate).insert(cluster_name.to_string(), Arc::new(rate));
    }

    pub fn indexing_rate(&self, cluster_name: &str) -> Option<Arc<ClusterIndexingRate>> {
        read_guard(&self.indexing_rate).get(cluster_name).cloned()
    }

    pub fn indexing_rate_count(&self) -> usize {
        read_guard(&self.indexing_rate).len()
    }

    /* ---------- daily stats ---------- */

    pub fn replace_stats(&self, stats: HashMap<String, IndicesStatsByDay>) {
        *write_guard(&self.stats_by_day) = stats;
    }

    pub fn stats_for(&self, cluster_name: &str) -> Option<IndicesStatsByDay> {
        read_guard(&self.stats_by_day).get(cluster_name).cloned()
    }

    pub fn with_stats_mut<F, R>(&self, mutate: F) -> R
    where
        F: FnOnce(&mut HashMap<String, IndicesStatsByDay>) -> R,
    {
        mutate(&mut write_guard(&self.stats_by_day))
    }

    #[doc = "백업 직렬화는 read lock 안에서, 파일쓰기는 락을 푼 뒤 호출측에서"]
    pub fn stats_to_pretty_json(&self) -> Result<String> {
        let stats = read_guard(&self.stats_by_day);
        serde_json::to_string_pretty(&*stats)
            .map_err(|e| anyhow!("[MetricStore->stats_to_pretty_json] {:?}", e))
    }

    pub fn stats_cluster_count(&self) -> usize {
        read_guard(&self.stats_by_day).len()
    }

    /* ---------- thread pool write queue ---------- */

    pub fn tpw_for(&self, cluster_name: &str) -> Option<ClustersTpwQueue> {
        read_guard(&self.tpw_queue).get(cluster_name).cloned()
    }

    pub fn tpw_cluster_names(&self) -> Vec<String> {
        read_guard(&self.tpw_queue).keys().cloned().collect()
    }

    pub fn with_tpw_mut<F, R>(&self, mutate: F) -> R
    where
        F: FnOnce(&mut HashMap<String, ClustersTpwQueue>) -> R,
    {
        mutate(&mut write_guard(&self.tpw_queue))
    }

    /* ---------- bulk tasks ---------- */

    pub fn with_bulk_tasks_mut<F, R>(&self, mutate: F) -> R
    where
        F: FnOnce(&mut HashMap<String, BulkTaskHistory>) -> R,
    {
        mutate(&mut write_guard(&self.bulk_tasks))
    }

    pub fn with_bulk_tasks<F, R>(&self, read: F) -> R
    where
        F: FnOnce(&HashMap<String, BulkTaskHistory>) -> R,
    {
        read(&read_guard(&self.bulk_tasks))
    }

    /* ---------- write pressure ---------- */

    #[doc = "이벤트 키가 없을 때만 기록 - 새로 기록되면 true"]
    pub fn record_write_pressure(&self, event: WritePressureEvent) -> bool {
        let mut events = write_guard(&self.write_pressure);
        let key: String = event.key();

        if events.contains_key(&key) {
            return false;
        }

        events.insert(key, event);
        true
    }

    #[doc = "키 suffix 의 epoch seconds 가 기준보다 오래된 이벤트를 제거"]
    pub fn cleanup_write_pressure_before(&self, epoch_secs: i64) -> usize {
        let mut events = write_guard(&self.write_pressure);
        let before: usize = events.len();

        events.retain(|key, _| match event_key_timestamp(key) {
            Some(ts) => ts >= epoch_secs,
            None => true,
        });

        before - events.len()
    }

    pub fn write_pressure_events(&self) -> Vec<WritePressureEvent> {
        read_guard(&self.write_pressure).values().cloned().collect()
    }

    /* ---------- master endpoints ---------- */

    pub fn set_master_endpoint(&self, cluster_name: &str, endpoint: String) {
        write_guard(&self.master_endpoints).insert(cluster_name.to_string(), endpoint);
    }

    pub fn master_endpoint(&self, cluster_name: &str) -> Option<String> {
        read_guard(&self.master_endpoints).get(cluster_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_preserves_insertion_order() {
        let store = MetricStore::new();

        assert!(store.upsert_cluster_with("b", |_| {}));
        assert!(store.upsert_cluster_with("a", |_| {}));
        assert!(!store.upsert_cluster_with("b", |cluster| {
            cluster.owner = String::from("team-search");
        }));

        assert_eq!(store.cluster_names(), vec!["b", "a"]);
        assert_eq!(store.cluster("b").unwrap().owner, "team-search");
    }

    #[test]
    fn write_pressure_event_recorded_once() {
        let store = MetricStore::new();
        let event =
            WritePressureEvent::new(1000, String::from("host1"), String::from("c1"));

        assert!(store.record_write_pressure(event.clone()));
        assert!(!store.record_write_pressure(event));

        assert_eq!(store.cleanup_write_pressure_before(999), 0);
        assert_eq!(store.cleanup_write_pressure_before(1001), 1);
        assert!(store.write_pressure_events().is_empty());
    }

    #[test]
    fn history_created_once_per_cluster() {
        let store = MetricStore::new();
        let first = store.history_or_create("c1", 5);
        let second = store.history_or_create("c1", 99);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.size(), 5);
    }
}

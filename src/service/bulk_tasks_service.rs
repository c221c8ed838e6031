use crate::common::*;

use crate::model::bulk_tasks::*;
use crate::model::cluster::*;
use crate::model::configs::bulk_tasks_config::*;
use crate::model::elastic_dto::tasks_response::*;
use crate::model::store::*;

use crate::utils_modules::time_utils::*;

use crate::traits::repository::es_repository_trait::*;
use crate::traits::service::bulk_tasks_service_trait::*;

const TASKS_TIMEOUT: Duration = Duration::from_secs(30);

const BULK_ACTION_PREFIX: &str = "indices:data/write/bulk[s]";

/* description 예: "requests[236], index[index03][2]" */
static TASK_DESC_RE: once_lazy<Regex> = once_lazy::new(|| {
    Regex::new(r"requests\[(\d+)\].*index\[([^\]]+)\]\[(\d+)\]").unwrap_or_else(|e| panic!("{:?}", e))
});

static SHARD_SUFFIX_RE: once_lazy<Regex> =
    once_lazy::new(|| Regex::new(r"_\d+$").unwrap_or_else(|e| panic!("{:?}", e)));

#[doc = "마스터의 _tasks 에서 활성 bulk[s] 태스크를 샤드/노드/인덱스/클러스터 레벨로 집계하는 서비스"]
#[derive(Debug, new)]
pub struct BulkTasksServiceImpl<R: EsRepository> {
    store: Arc<MetricStore>,
    es_repo: Arc<R>,
}

#[doc = "집계맵에서 내림차순 정렬키 목록을 만들어주는 함수 - 동률은 키 사전순으로 고정"]
fn sorted_keys_desc<F>(aggs: &HashMap<String, ShardTaskAgg>, metric: F) -> Vec<String>
where
    F: Fn(&ShardTaskAgg) -> u64,
{
    let mut keys: Vec<String> = aggs.keys().cloned().collect();
    keys.sort_by(|a, b| {
        metric(&aggs[b])
            .cmp(&metric(&aggs[a]))
            .then_with(|| a.cmp(b))
    });
    keys
}

impl<R: EsRepository + Sync + Send> BulkTasksServiceImpl<R> {
    #[doc = "노드 한 대의 태스크 목록을 샤드 단위로 집계 - bulk[s] 가 없으면 None"]
    fn aggregate_node(node: &TasksNode, cluster: &ClusterData) -> Option<NodeBulkTasks> {
        let mut by_shard: HashMap<String, ShardTaskAgg> = HashMap::new();

        for task in node.tasks.values() {
            if !task.action.starts_with(BULK_ACTION_PREFIX) {
                continue;
            }

            let caps = match TASK_DESC_RE.captures(&task.description) {
                Some(caps) => caps,
                None => {
                    debug!(
                        "[getBulkWriteTasks] Unparsable task description: '{}'",
                        task.description
                    );
                    continue;
                }
            };

            let requests: u64 = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            let index_name: &str = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let shard_num: &str = caps.get(3).map(|m| m.as_str()).unwrap_or("0");

            let shard_key: String = format!("{}_{}", index_name, shard_num);
            let time_taken_ms: u64 = (task.running_time_in_nanos / 1_000_000.0).round() as u64;

            let agg: &mut ShardTaskAgg = by_shard.entry(shard_key).or_default();
            agg.number_of_tasks += 1;
            agg.total_requests += requests;
            agg.total_time_taken_ms += time_taken_ms;
        }

        if by_shard.is_empty() {
            return None;
        }

        let mut node_tasks: NodeBulkTasks = NodeBulkTasks {
            zone: cluster.node_zone(&node.host),
            ..NodeBulkTasks::default()
        };

        for agg in by_shard.values() {
            node_tasks.total_tasks += agg.number_of_tasks;
            node_tasks.total_requests += agg.total_requests;
            node_tasks.total_time_taken_ms += agg.total_time_taken_ms;
        }

        node_tasks.shards_by_tasks = sorted_keys_desc(&by_shard, |agg| agg.number_of_tasks);
        node_tasks.shards_by_time_taken = sorted_keys_desc(&by_shard, |agg| agg.total_time_taken_ms);
        node_tasks.shards_by_requests = sorted_keys_desc(&by_shard, |agg| agg.total_requests);
        node_tasks.by_shard = by_shard;

        Some(node_tasks)
    }

    #[doc = "_tasks 응답 전체를 클러스터 스냅샷으로 집계"]
    fn build_snapshot(
        response: &TasksResponse,
        cluster: &ClusterData,
        snapshot_time: i64,
    ) -> ClusterBulkTasksSnapshot {
        let mut snapshot: ClusterBulkTasksSnapshot = ClusterBulkTasksSnapshot {
            snapshot_time,
            ..ClusterBulkTasksSnapshot::default()
        };

        for node in response.nodes.values() {
            if node.host.is_empty() {
                continue;
            }

            if let Some(node_tasks) = Self::aggregate_node(node, cluster) {
                snapshot.by_node.insert(node.host.clone(), node_tasks);
            }
        }

        /* 인덱스 레벨 집계 - 샤드키에서 "_<번호>" 를 떼어낸다 */
        for node_tasks in snapshot.by_node.values() {
            for (shard_key, agg) in &node_tasks.by_shard {
                let index_name: String = SHARD_SUFFIX_RE.replace(shard_key, "").to_string();

                let index_agg: &mut ShardTaskAgg =
                    snapshot.by_index.entry(index_name).or_default();
                index_agg.number_of_tasks += agg.number_of_tasks;
                index_agg.total_requests += agg.total_requests;
                index_agg.total_time_taken_ms += agg.total_time_taken_ms;
            }
        }

        /* 호스트 정렬뷰 - 노드 합계를 임시 집계 형태로 재사용 */
        let host_aggs: HashMap<String, ShardTaskAgg> = snapshot
            .by_node
            .iter()
            .map(|(host, node_tasks)| {
                (
                    host.clone(),
                    ShardTaskAgg {
                        number_of_tasks: node_tasks.total_tasks,
                        total_requests: node_tasks.total_requests,
                        total_time_taken_ms: node_tasks.total_time_taken_ms,
                    },
                )
            })
            .collect();

        snapshot.hosts_by_tasks = sorted_keys_desc(&host_aggs, |agg| agg.number_of_tasks);
        snapshot.hosts_by_time_taken = sorted_keys_desc(&host_aggs, |agg| agg.total_time_taken_ms);
        snapshot.hosts_by_requests = sorted_keys_desc(&host_aggs, |agg| agg.total_requests);

        snapshot.indices_by_tasks = sorted_keys_desc(&snapshot.by_index, |agg| agg.number_of_tasks);
        snapshot.indices_by_time_taken =
            sorted_keys_desc(&snapshot.by_index, |agg| agg.total_time_taken_ms);
        snapshot.indices_by_requests =
            sorted_keys_desc(&snapshot.by_index, |agg| agg.total_requests);

        snapshot
    }

    #[doc = "대상 클러스터 목록 구성 - includeClusters 가 있으면 존재검증 후 그것만"]
    fn build_cluster_list(&self, params: &BulkTasksParams) -> Vec<String> {
        let known: Vec<String> = self.store.cluster_names();

        if !params.include_clusters.is_empty() {
            return params
                .include_clusters
                .iter()
                .filter(|name| {
                    let exists: bool = known.contains(name);
                    if !exists {
                        warn!(
                            "[getBulkWriteTasks] Cluster {} in includeClusters not found in global cluster list",
                            name
                        );
                    }
                    exists
                })
                .cloned()
                .collect();
        }

        known
            .into_iter()
            .filter(|name| !params.exclude_clusters.contains(name))
            .collect()
    }

    async fn collect_cluster(
        &self,
        cluster_name: &str,
        insecure_override: bool,
        history_size: usize,
    ) -> Result<()> {
        let master_endpoint: String = self
            .store
            .master_endpoint(cluster_name)
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "[BulkTasksServiceImpl->collect_cluster] no master endpoint found for cluster {}",
                    cluster_name
                )
            })?;

        let mut cluster: ClusterData = self.store.cluster(cluster_name).ok_or_else(|| {
            anyhow!(
                "[BulkTasksServiceImpl->collect_cluster] cluster {} not found",
                cluster_name
            )
        })?;
        cluster.insecure_tls = cluster.insecure_tls || insecure_override;

        let url: String = format!(
            "{}/_tasks?pretty&human&detailed=true",
            master_endpoint.trim_end_matches('/')
        );

        let response: TasksResponse = self
            .es_repo
            .get_json::<TasksResponse>(&cluster, &url, TASKS_TIMEOUT)
            .await
            .map_err(|e| {
                anyhow!(
                    "[BulkTasksServiceImpl->collect_cluster] {}: {:?}",
                    cluster_name,
                    e
                )
            })?;

        let snapshot: ClusterBulkTasksSnapshot =
            Self::build_snapshot(&response, &cluster, time_now_millis());

        let node_count: usize = snapshot.by_node.len();
        let index_count: usize = snapshot.by_index.len();

        self.store.with_bulk_tasks_mut(|all_histories| {
            let history: &mut BulkTaskHistory = all_histories
                .entry(cluster_name.to_string())
                .or_insert_with(|| BulkTaskHistory::new(cluster_name, history_size));
            history.prepend(Arc::new(snapshot));
        });

        info!(
            "[getBulkWriteTasks] Successfully processed cluster {}: {} nodes, {} indices",
            cluster_name, node_count, index_count
        );

        Ok(())
    }
}

#[async_trait]
impl<R: EsRepository + Sync + Send> BulkTasksService for BulkTasksServiceImpl<R> {
    async fn get_bulk_write_tasks(&self, params: BulkTasksParams) -> Result<()> {
        info!("[getBulkWriteTasks] Starting bulk write tasks monitoring job");

        let params: BulkTasksParams = params.clamped();

        info!(
            "[getBulkWriteTasks] Config: historySize={}, insecureTLS={}, maxConcurrent={}",
            params.history_size, params.insecure_tls, params.max_concurrent
        );

        let cluster_list: Vec<String> = self.build_cluster_list(&params);
        info!(
            "[getBulkWriteTasks] Processing {} clusters in parallel",
            cluster_list.len()
        );

        let semaphore: Arc<Semaphore> = Arc::new(Semaphore::new(params.max_concurrent));

        let futures = cluster_list.iter().map(|cluster_name| {
            let semaphore: Arc<Semaphore> = Arc::clone(&semaphore);
            let insecure: bool = params.insecure_tls;
            let history_size: usize = params.history_size;
            async move {
                let _permit = semaphore.acquire().await;
                let result = self
                    .collect_cluster(cluster_name, insecure, history_size)
                    .await;
                (cluster_name.clone(), result)
            }
        });

        let results = join_all(futures).await;

        let mut succeeded: usize = 0;
        let mut failed: usize = 0;

        for (cluster_name, result) in results {
            match result {
                Ok(_) => succeeded += 1,
                Err(e) => {
                    error!(
                        "[getBulkWriteTasks] Failed to process cluster {}: {:?}",
                        cluster_name, e
                    );
                    failed += 1;
                }
            }
        }

        info!(
            "[getBulkWriteTasks] Completed: {} succeeded, {} failed",
            succeeded, failed
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::repository::es_repository::EsRepositoryImpl;

    type TestService = BulkTasksServiceImpl<EsRepositoryImpl>;

    fn task(action: &str, description: &str, nanos: f64) -> TaskEntry {
        TaskEntry {
            action: action.to_string(),
            description: description.to_string(),
            running_time_in_nanos: nanos,
        }
    }

    fn tasks_response() -> TasksResponse {
        let mut tasks = HashMap::new();
        tasks.insert(
            String::from("t1"),
            task(
                "indices:data/write/bulk[s]",
                "requests[100], index[logs-01][2]",
                2_000_000.0,
            ),
        );
        tasks.insert(
            String::from("t2"),
            task(
                "indices:data/write/bulk[s][p]",
                "requests[50], index[logs-01][2]",
                1_000_000.0,
            ),
        );
        tasks.insert(
            String::from("t3"),
            task(
                "indices:data/write/bulk[s]",
                "requests[10], index[metrics][0]",
                500_000.0,
            ),
        );
        tasks.insert(
            String::from("t4"),
            task("cluster:monitor/tasks/lists", "irrelevant", 100.0),
        );
        tasks.insert(
            String::from("t5"),
            task("indices:data/write/bulk[s]", "no match here", 100.0),
        );

        let mut nodes = HashMap::new();
        nodes.insert(
            String::from("node-id-1"),
            TasksNode {
                host: String::from("host-a"),
                tasks,
            },
        );

        TasksResponse { nodes }
    }

    fn cluster_with_zone() -> ClusterData {
        let mut cluster = ClusterData::named("es01");
        let mut node = Node::with_default_ports();
        node.host_name = String::from("host-a");
        node.zone = String::from("z1");
        cluster.nodes = vec![node];
        cluster
    }

    #[test]
    fn node_aggregation_groups_by_shard() {
        let response = tasks_response();
        let cluster = cluster_with_zone();

        let snapshot = TestService::build_snapshot(&response, &cluster, 1_700_000_000_000);

        let node = snapshot.by_node.get("host-a").unwrap();
        assert_eq!(node.zone, "z1");
        assert_eq!(node.total_tasks, 3);
        assert_eq!(node.total_requests, 160);
        assert_eq!(node.total_time_taken_ms, 4); /* 2ms + 1ms + 1ms(반올림 0.5->1) */

        let logs_shard = node.by_shard.get("logs-01_2").unwrap();
        assert_eq!(logs_shard.number_of_tasks, 2);
        assert_eq!(logs_shard.total_requests, 150);

        assert_eq!(node.shards_by_tasks[0], "logs-01_2");
        assert_eq!(node.shards_by_requests, vec!["logs-01_2", "metrics_0"]);
    }

    #[test]
    fn index_aggregation_strips_shard_suffix() {
        let response = tasks_response();
        let cluster = cluster_with_zone();

        let snapshot = TestService::build_snapshot(&response, &cluster, 0);

        assert_eq!(snapshot.by_index.len(), 2);
        let logs = snapshot.by_index.get("logs-01").unwrap();
        assert_eq!(logs.number_of_tasks, 2);
        assert_eq!(logs.total_requests, 150);

        assert_eq!(snapshot.indices_by_requests, vec!["logs-01", "metrics"]);
        assert_eq!(snapshot.hosts_by_tasks, vec!["host-a"]);
    }

    #[test]
    fn node_without_bulk_tasks_is_dropped() {
        let mut response = tasks_response();
        response.nodes.insert(
            String::from("node-id-2"),
            TasksNode {
                host: String::from("host-idle"),
                tasks: HashMap::new(),
            },
        );

        let snapshot = TestService::build_snapshot(&response, &cluster_with_zone(), 0);
        assert!(!snapshot.by_node.contains_key("host-idle"));
    }
}

use crate::common::*;

#[doc = "샤드(또는 인덱스) 단위 bulk[s] 태스크 집계값"]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardTaskAgg {
    pub number_of_tasks: u64,
    pub total_requests: u64,
    pub total_time_taken_ms: u64,
}

#[doc = "노드 단위 집계 - by_shard 키는 \"{index}_{shard}\""]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBulkTasks {
    pub zone: String,
    pub total_tasks: u64,
    pub total_requests: u64,
    pub total_time_taken_ms: u64,
    pub by_shard: HashMap<String, ShardTaskAgg>,
    pub shards_by_tasks: Vec<String>,
    pub shards_by_time_taken: Vec<String>,
    pub shards_by_requests: Vec<String>,
}

#[doc = "클러스터 단위 bulk 태스크 스냅샷 - 정렬뷰는 수집시 즉시 구축"]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBulkTasksSnapshot {
    pub snapshot_time: i64,
    pub by_node: HashMap<String, NodeBulkTasks>,
    pub by_index: HashMap<String, ShardTaskAgg>,
    pub hosts_by_tasks: Vec<String>,
    pub hosts_by_time_taken: Vec<String>,
    pub hosts_by_requests: Vec<String>,
    pub indices_by_tasks: Vec<String>,
    pub indices_by_time_taken: Vec<String>,
    pub indices_by_requests: Vec<String>,
}

#[doc = "클러스터별 스냅샷 링 - 슬롯 0 이 최신, 용량 H+1"]
#[derive(Debug)]
pub struct BulkTaskHistory {
    pub cluster_name: String,
    pub history_size: usize,
    pub latest_snapshot_time: i64,
    ring: Vec<Option<Arc<ClusterBulkTasksSnapshot>>>,
}

impl BulkTaskHistory {
    pub fn new(cluster_name: &str, history_size: usize) -> Self {
        BulkTaskHistory {
            cluster_name: cluster_name.to_string(),
            history_size,
            latest_snapshot_time: 0,
            ring: vec![None; history_size + 1],
        }
    }

    #[doc = "새 스냅샷을 슬롯 0 에 넣고 나머지를 한 칸씩 밀어주는 함수"]
    pub fn prepend(&mut self, snapshot: Arc<ClusterBulkTasksSnapshot>) {
        self.latest_snapshot_time = snapshot.snapshot_time;

        for i in (1..=self.history_size).rev() {
            self.ring[i] = self.ring[i - 1].take();
        }
        self.ring[0] = Some(snapshot);
    }

    pub fn latest(&self) -> Option<Arc<ClusterBulkTasksSnapshot>> {
        self.ring[0].clone()
    }

    #[doc = "최신순으로 채워진 슬롯만 반환"]
    pub fn snapshots(&self) -> Vec<Arc<ClusterBulkTasksSnapshot>> {
        self.ring.iter().flatten().cloned().collect()
    }
}

use crate::common::*;

use crate::model::configs::tpw_config::*;
use crate::model::elastic_dto::tpw_response::*;
use crate::model::store::*;
use crate::model::tpw_queue::*;

use crate::utils_modules::time_utils::*;

use crate::traits::repository::es_repository_trait::*;
use crate::traits::service::tpw_service_trait::*;

const TPW_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/* 모니터링 클러스터의 node_stats 문서에서 호스트별 write queue 깊이를 뽑는 기본 쿼리 */
pub const DEFAULT_TPW_QUERY: &str = r#"{
    "aggs": {
        "hostname": {
            "terms": {
                "field": "source_node.host",
                "order": { "2[node_stats.thread_pool.write.queue]": "desc" },
                "size": 250
            },
            "aggs": {
                "2": {
                    "top_metrics": {
                        "metrics": { "field": "node_stats.thread_pool.write.queue" },
                        "size": 1,
                        "sort": { "timestamp": "desc" }
                    }
                },
                "date_bucket": {
                    "date_histogram": {
                        "field": "source_node.timestamp",
                        "fixed_interval": "__INTERVAL__",
                        "time_zone": "US/Eastern"
                    },
                    "aggs": {
                        "2": {
                            "top_metrics": {
                                "metrics": { "field": "node_stats.thread_pool.write.queue" },
                                "size": 1,
                                "sort": { "timestamp": "desc" }
                            }
                        }
                    }
                }
            }
        }
    },
    "size": 0,
    "query": {
        "bool": {
            "filter": [
                { "match_phrase": { "cluster_uuid": "__UUID__" } },
                { "match_phrase": { "type": "node_stats" } },
                {
                    "range": {
                        "source_node.timestamp": {
                            "format": "strict_date_optional_time",
                            "gte": "now-__TIME_SPAN__",
                            "lte": "now"
                        }
                    }
                }
            ],
            "must_not": [
                { "match_phrase": { "node_stats.indices.docs.count": 0 } }
            ]
        }
    }
}"#;

#[doc = "모니터링 클러스터에서 호스트별 write queue 시계열을 수집하는 서비스"]
#[derive(Debug, new)]
pub struct TpwServiceImpl<R: EsRepository> {
    store: Arc<MetricStore>,
    es_repo: Arc<R>,
    data_sets: usize,
}

impl<R: EsRepository + Sync + Send> TpwServiceImpl<R> {
    #[doc = "aggregation 응답을 호스트별 TpwQueue 로 변환."]
    /// 최신 포인트를 슬롯 0 으로 두고 (latest - ts)/interval 위치에 슬롯팅한다.
    /// 중간에 빠진 버킷은 dataExists=false 로 남는다.
    fn parse_response(
        response: TpwAggResponse,
        total_points: usize,
        points_per_dataset: usize,
        interval_ms: i64,
    ) -> (HashMap<String, TpwQueue>, Vec<String>) {
        let mut host_data: HashMap<String, TpwQueue> = HashMap::new();
        let mut hostnames: Vec<String> = Vec::new();

        for bucket in response.aggregations.hostname.buckets {
            if bucket.key.is_empty() {
                continue;
            }

            let mut points: Vec<(i64, u32)> = bucket
                .date_bucket
                .buckets
                .iter()
                .filter_map(|date_bucket| {
                    date_bucket
                        .queue_value()
                        .map(|queue| (date_bucket.key, queue))
                })
                .collect();

            points.sort_by(|a, b| b.0.cmp(&a.0));

            let mut tpwq: TpwQueue = TpwQueue::new(total_points);

            if let Some(&(latest, _)) = points.first() {
                for (idx, &(timestamp, queue)) in points.iter().enumerate() {
                    if idx >= points_per_dataset {
                        break;
                    }

                    let slot: i64 = (latest - timestamp) / interval_ms;
                    if slot >= 0 && (slot as usize) < points_per_dataset {
                        tpwq.set_point(slot as usize, timestamp, queue);
                    }
                }
            }

            hostnames.push(bucket.key.clone());
            host_data.insert(bucket.key, tpwq);
        }

        (host_data, hostnames)
    }

    #[doc = "수집 결과를 전역 상태에 병합."]
    /// 기존 호스트는 포인트 배열을 한 데이터셋만큼 밀고 머리를 덮어쓰고,
    /// 새 호스트는 뒤에 붙이고, 이번 수집에 없는 호스트는 버린다.
    fn merge_cluster(
        &self,
        cluster_name: &str,
        new_data: HashMap<String, TpwQueue>,
        hostnames: Vec<String>,
        points_per_dataset: usize,
    ) {
        self.store.with_tpw_mut(|all_queues| {
            let existing: &mut ClustersTpwQueue = match all_queues.get_mut(cluster_name) {
                Some(existing) => existing,
                None => {
                    all_queues.insert(
                        cluster_name.to_string(),
                        ClustersTpwQueue {
                            host_order: hostnames,
                            per_host: new_data,
                        },
                    );
                    return;
                }
            };

            for (host, fresh) in &new_data {
                match existing.per_host.get_mut(host) {
                    Some(current) => current.roll_in(fresh, points_per_dataset),
                    None => {
                        existing.per_host.insert(host.clone(), fresh.clone());
                        existing.host_order.push(host.clone());
                    }
                }
            }

            let keep: HashSet<String> = hostnames.iter().cloned().collect();
            existing.host_order.retain(|host| keep.contains(host));
            existing.per_host.retain(|host, _| keep.contains(host));
        });
    }

    async fn collect_cluster(
        &self,
        cluster_name: &str,
        cluster_uuid: &str,
        params: &TpwQueueParams,
        interval_ms: i64,
        points_per_dataset: usize,
        total_points: usize,
    ) -> Result<(HashMap<String, TpwQueue>, Vec<String>)> {
        let template: &str = params.query.as_deref().unwrap_or(DEFAULT_TPW_QUERY);
        let query: String = template
            .replace("__UUID__", cluster_uuid)
            .replace("__INTERVAL__", &params.span_interval)
            .replace("__TIME_SPAN__", &params.time_span);

        let mut last_err: Option<EsClientError> = None;

        for endpoint in &params.api_end_points {
            match self
                .es_repo
                .post_monitoring_json::<TpwAggResponse>(
                    endpoint,
                    &params.api_key,
                    params.insecure_tls,
                    query.clone(),
                    TPW_QUERY_TIMEOUT,
                )
                .await
            {
                Ok(response) => {
                    return Ok(Self::parse_response(
                        response,
                        total_points,
                        points_per_dataset,
                        interval_ms,
                    ));
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(anyhow!(
            "[TpwServiceImpl->collect_cluster] {}: all endpoints failed: {:?}",
            cluster_name,
            last_err
        ))
    }
}

#[async_trait]
impl<R: EsRepository + Sync + Send> TpwService for TpwServiceImpl<R> {
    async fn get_thread_pool_write_queue(&self, params: TpwQueueParams) -> Result<()> {
        info!("[getThreadPoolWriteQueue] Starting thread pool write queue monitoring job");

        if params.api_end_points.is_empty() {
            return Err(anyhow!(
                "[TpwServiceImpl->get_thread_pool_write_queue] APIEndPoints parameter is required"
            ));
        }
        if params.api_key.is_empty() {
            return Err(anyhow!(
                "[TpwServiceImpl->get_thread_pool_write_queue] APIKEY parameter is required"
            ));
        }

        let interval_ms: i64 = parse_duration_to_millis(&params.span_interval);
        if interval_ms <= 0 {
            return Err(anyhow!(
                "[TpwServiceImpl->get_thread_pool_write_queue] invalid spanInterval '{}'",
                params.span_interval
            ));
        }

        let span_ms: i64 = parse_duration_to_millis(&params.time_span);
        let points_per_dataset: usize = if span_ms <= 0 {
            20
        } else {
            (span_ms / interval_ms).max(1) as usize
        };
        let total_points: usize = self.data_sets * points_per_dataset;

        info!(
            "[getThreadPoolWriteQueue] Config: dataSets={}, pointsPerSet={}, total={}, intervalMs={}",
            self.data_sets, points_per_dataset, total_points, interval_ms
        );

        /* UUID 없는 클러스터는 모니터링 문서를 찾을 수 없으므로 건너뛴다 */
        let clusters: Vec<(String, String)> = self
            .store
            .clusters_snapshot()
            .into_iter()
            .filter(|cluster| !params.exclude_clusters.contains(&cluster.cluster_name))
            .filter_map(|cluster| {
                if cluster.cluster_uuid.is_empty() {
                    warn!(
                        "[getThreadPoolWriteQueue] Cluster {} has no UUID, skipping",
                        cluster.cluster_name
                    );
                    None
                } else {
                    Some((cluster.cluster_name, cluster.cluster_uuid))
                }
            })
            .collect();

        info!(
            "[getThreadPoolWriteQueue] Processing {} clusters",
            clusters.len()
        );

        let semaphore: Arc<Semaphore> = Arc::new(Semaphore::new(params.parallel_routines.max(1)));

        let futures = clusters.iter().map(|(cluster_name, cluster_uuid)| {
            let semaphore: Arc<Semaphore> = Arc::clone(&semaphore);
            let params: &TpwQueueParams = &params;
            async move {
                let _permit = semaphore.acquire().await;
                let result = self
                    .collect_cluster(
                        cluster_name,
                        cluster_uuid,
                        params,
                        interval_ms,
                        points_per_dataset,
                        total_points,
                    )
                    .await;
                (cluster_name.clone(), result)
            }
        });

        let results = join_all(futures).await;

        /* 병합은 직렬로 - 전역 맵 쓰기구간을 짧게 유지 */
        let mut succeeded: usize = 0;
        let mut failed: usize = 0;

        for (cluster_name, result) in results {
            match result {
                Ok((host_data, hostnames)) => {
                    let host_count: usize = hostnames.len();
                    self.merge_cluster(&cluster_name, host_data, hostnames, points_per_dataset);
                    succeeded += 1;
                    info!(
                        "[getThreadPoolWriteQueue] Cluster {} processed successfully with {} hosts",
                        cluster_name, host_count
                    );
                }
                Err(e) => {
                    error!(
                        "[getThreadPoolWriteQueue] Cluster {} failed: {:?}",
                        cluster_name, e
                    );
                    failed += 1;
                }
            }
        }

        info!(
            "[getThreadPoolWriteQueue] Completed: {} succeeded, {} failed",
            succeeded, failed
        );

        Ok(())
    }
}

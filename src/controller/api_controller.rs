use crate::common::*;

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::model::store::*;
use crate::model::tpw_queue::*;

use crate::service::scheduler_service::*;

use crate::utils_modules::parse_utils::*;
use crate::utils_modules::time_utils::*;

#[doc = "읽기전용 API 의 공유 컨텍스트"]
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<MetricStore>,
    pub scheduler: Arc<SchedulerService>,
}

pub fn build_router(context: ApiContext) -> Router {
    Router::new()
        .route("/api/clusters", get(get_clusters))
        .route("/api/clusters/{clusterName}/nodes", get(get_cluster_nodes))
        .route("/api/indexingRate/{clusterName}", get(get_indexing_rate))
        .route(
            "/api/staleIndices/{clusterName}/{days}",
            get(get_stale_indices),
        )
        .route("/api/tpwqueue/{clusterName}", get(get_tpw_queue_cluster))
        .route(
            "/api/tpwqueue/{clusterName}/{hostName}",
            get(get_tpw_queue_host),
        )
        .route("/api/bulkTasks/clusters", get(get_bulk_tasks_clusters))
        .route("/api/bulkTasks/{clusterName}", get(get_bulk_tasks_history))
        .route(
            "/api/bulkTasks/{clusterName}/latest",
            get(get_bulk_tasks_latest),
        )
        .route("/api/status", get(get_status))
        .route("/api/jobs", get(get_jobs))
        .route("/api/jobs/{jobName}/trigger", post(trigger_job))
        .with_state(context)
}

fn respond_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

#[doc = "cluster 이름 검증 + 존재확인 - 400/404 를 여기서 일괄 처리"]
fn ensure_cluster(context: &ApiContext, cluster_name: &str) -> Option<(StatusCode, Json<Value>)> {
    if !validate_cluster_name(cluster_name) {
        return Some(respond_error(StatusCode::BAD_REQUEST, "Invalid cluster name"));
    }

    if context.store.cluster(cluster_name).is_none() {
        return Some(respond_error(StatusCode::NOT_FOUND, "Cluster not found"));
    }

    None
}

async fn get_clusters(State(context): State<ApiContext>) -> impl IntoResponse {
    let clusters: Vec<String> = context.store.cluster_names();

    Json(json!({
        "clusters": clusters,
        "count": clusters.len(),
    }))
}

async fn get_cluster_nodes(
    State(context): State<ApiContext>,
    AxumPath(cluster_name): AxumPath<String>,
) -> impl IntoResponse {
    if let Some(error) = ensure_cluster(&context, &cluster_name) {
        return error;
    }

    let cluster = match context.store.cluster(&cluster_name) {
        Some(cluster) => cluster,
        None => return respond_error(StatusCode::NOT_FOUND, "Cluster not found"),
    };

    let nodes: Vec<Value> = cluster
        .nodes
        .iter()
        .map(|node| {
            json!({
                "hostName": node.host_name,
                "ipAddress": node.ip_address,
                "port": node.port,
                "type": node.node_types,
                "zone": node.zone,
                "nodeTier": node.node_tier,
                "dataCenter": node.data_center,
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "cluster": cluster_name,
            "nodes": nodes,
            "count": nodes.len(),
        })),
    )
}

async fn get_indexing_rate(
    State(context): State<ApiContext>,
    AxumPath(cluster_name): AxumPath<String>,
) -> impl IntoResponse {
    if let Some(error) = ensure_cluster(&context, &cluster_name) {
        return error;
    }

    let cluster_rate = match context.store.indexing_rate(&cluster_name) {
        Some(cluster_rate) => cluster_rate,
        None => {
            return respond_error(
                StatusCode::NOT_FOUND,
                "Indexing rate data not available yet",
            )
        }
    };

    let indices: Value = match serde_json::to_value(&cluster_rate.per_index) {
        Ok(indices) => indices,
        Err(e) => {
            error!("[api_controller->get_indexing_rate] {:?}", e);
            return respond_error(StatusCode::NOT_FOUND, "Indexing rate data unavailable");
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "cluster": cluster_name,
            "timestamp": cluster_rate.timestamp,
            "indices": indices,
        })),
    )
}

async fn get_stale_indices(
    State(context): State<ApiContext>,
    AxumPath((cluster_name, days)): AxumPath<(String, String)>,
) -> impl IntoResponse {
    if let Some(error) = ensure_cluster(&context, &cluster_name) {
        return error;
    }

    let days: usize = match days.parse() {
        Ok(days) if days >= 1 => days,
        _ => {
            return respond_error(
                StatusCode::BAD_REQUEST,
                "Invalid days parameter, must be a positive integer",
            )
        }
    };

    let cluster_stats = match context.store.stats_for(&cluster_name) {
        Some(cluster_stats) if !cluster_stats.stat_history.is_empty() => cluster_stats,
        _ => {
            return respond_error(
                StatusCode::NOT_FOUND,
                "Daily statistics not available for this cluster yet",
            )
        }
    };

    let mut stale_indices: Vec<Value> = Vec::new();
    let mut insufficient_data: usize = 0;
    let total_indices: usize = cluster_stats.stat_history.len();

    for (index_name, stat_history) in &cluster_stats.stat_history {
        if days >= stat_history.stats.len() {
            insufficient_data += 1;
            continue;
        }

        let (current, old) = match (stat_history.stats[0], stat_history.stats[days]) {
            (Some(current), Some(old)) => (current, old),
            _ => {
                insufficient_data += 1;
                continue;
            }
        };

        if current.doc_count == old.doc_count {
            stale_indices.push(json!({
                "indexName": index_name,
                "docCount": current.doc_count,
                "currentSize": current.total_size,
                "currentTimestamp": current.stat_time,
                "oldSize": old.total_size,
                "oldTimestamp": old.stat_time,
                "daysStale": days,
                "sizeChange": current.total_size as i64 - old.total_size as i64,
            }));
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "cluster": cluster_name,
            "daysChecked": days,
            "totalIndices": total_indices,
            "staleIndices": stale_indices,
            "staleCount": stale_indices.len(),
            "insufficientDataCount": insufficient_data,
            "lastUpdateTime": cluster_stats.last_update_time,
        })),
    )
}

async fn get_tpw_queue_cluster(
    State(context): State<ApiContext>,
    AxumPath(cluster_name): AxumPath<String>,
) -> impl IntoResponse {
    if let Some(error) = ensure_cluster(&context, &cluster_name) {
        return error;
    }

    let cluster_data: ClustersTpwQueue = match context.store.tpw_for(&cluster_name) {
        Some(cluster_data) => cluster_data,
        None => {
            return respond_error(
                StatusCode::NOT_FOUND,
                "Thread pool write queue data not available for this cluster yet",
            )
        }
    };

    let mut hosts: serde_json::Map<String, Value> = serde_json::Map::new();

    for (host_name, queue) in &cluster_data.per_host {
        /* 존재하는 포인트만 골라낸 압축 시리즈 */
        let data_points: Vec<Value> = (0..queue.number_of_data_points)
            .filter(|&i| queue.data_exists[i])
            .map(|i| {
                json!({
                    "timestamp": queue.time_stamps[i],
                    "queue": queue.queues[i],
                    "index": i,
                })
            })
            .collect();

        hosts.insert(
            host_name.clone(),
            json!({
                "numberOfDataPoints": queue.number_of_data_points,
                "dataPoints": data_points,
                "dataPointCount": data_points.len(),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "cluster": cluster_name,
            "hostnames": cluster_data.host_order,
            "hostCount": cluster_data.host_order.len(),
            "hosts": hosts,
        })),
    )
}

async fn get_tpw_queue_host(
    State(context): State<ApiContext>,
    AxumPath((cluster_name, host_name)): AxumPath<(String, String)>,
) -> impl IntoResponse {
    if let Some(error) = ensure_cluster(&context, &cluster_name) {
        return error;
    }

    if host_name.is_empty() {
        return respond_error(StatusCode::BAD_REQUEST, "Host name is required");
    }

    let cluster_data: ClustersTpwQueue = match context.store.tpw_for(&cluster_name) {
        Some(cluster_data) => cluster_data,
        None => {
            return respond_error(
                StatusCode::NOT_FOUND,
                "Thread pool write queue data not available for this cluster yet",
            )
        }
    };

    let queue: &TpwQueue = match cluster_data.per_host.get(&host_name) {
        Some(queue) => queue,
        None => {
            return respond_error(
                StatusCode::NOT_FOUND,
                &format!("Host {} not found in cluster {}", host_name, cluster_name),
            )
        }
    };

    let mut existing_count: usize = 0;
    let mut missing_count: usize = 0;

    let data_points: Vec<Value> = (0..queue.number_of_data_points)
        .map(|i| {
            if queue.data_exists[i] {
                existing_count += 1;
                json!({
                    "index": i,
                    "dataExists": true,
                    "timestamp": queue.time_stamps[i],
                    "queue": queue.queues[i],
                })
            } else {
                missing_count += 1;
                json!({
                    "index": i,
                    "dataExists": false,
                    "timestamp": Value::Null,
                    "queue": Value::Null,
                })
            }
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "cluster": cluster_name,
            "hostName": host_name,
            "numberOfDataPoints": queue.number_of_data_points,
            "existingCount": existing_count,
            "missingCount": missing_count,
            "dataPoints": data_points,
        })),
    )
}

async fn get_bulk_tasks_clusters(State(context): State<ApiContext>) -> impl IntoResponse {
    let clusters: Vec<Value> = context.store.with_bulk_tasks(|all_histories| {
        all_histories
            .iter()
            .map(|(cluster_name, history)| {
                json!({
                    "clusterName": cluster_name,
                    "historySize": history.history_size,
                    "latestSnapshotTime": history.latest_snapshot_time,
                })
            })
            .collect()
    });

    Json(json!({
        "clusters": clusters,
        "count": clusters.len(),
    }))
}

async fn get_bulk_tasks_history(
    State(context): State<ApiContext>,
    AxumPath(cluster_name): AxumPath<String>,
) -> impl IntoResponse {
    if !validate_cluster_name(&cluster_name) {
        return respond_error(StatusCode::BAD_REQUEST, "Invalid cluster name");
    }

    /* 스냅샷 Arc 들만 복사하고 락을 놓은 뒤 직렬화 */
    let history = context.store.with_bulk_tasks(|all_histories| {
        all_histories.get(&cluster_name).map(|history| {
            (
                history.history_size,
                history.latest_snapshot_time,
                history.snapshots(),
            )
        })
    });

    let (history_size, latest_snapshot_time, snapshots) = match history {
        Some(history) => history,
        None => {
            return respond_error(
                StatusCode::NOT_FOUND,
                "Bulk tasks history not available for this cluster yet",
            )
        }
    };

    /* 슬롯 0 이 최신 - 최신순 그대로 내보낸다 */
    let snapshots: Vec<Value> = snapshots
        .iter()
        .filter_map(|snapshot| serde_json::to_value(&**snapshot).ok())
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "clusterName": cluster_name,
            "historySize": history_size,
            "latestSnapshotTime": latest_snapshot_time,
            "snapshots": snapshots,
            "snapshotCount": snapshots.len(),
        })),
    )
}

async fn get_bulk_tasks_latest(
    State(context): State<ApiContext>,
    AxumPath(cluster_name): AxumPath<String>,
) -> impl IntoResponse {
    if !validate_cluster_name(&cluster_name) {
        return respond_error(StatusCode::BAD_REQUEST, "Invalid cluster name");
    }

    let latest = context.store.with_bulk_tasks(|all_histories| {
        all_histories
            .get(&cluster_name)
            .map(|history| (history.latest_snapshot_time, history.latest()))
    });

    let (latest_snapshot_time, snapshot) = match latest {
        Some(latest) => latest,
        None => {
            return respond_error(
                StatusCode::NOT_FOUND,
                "Bulk tasks history not available for this cluster yet",
            )
        }
    };

    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => {
            return respond_error(StatusCode::NOT_FOUND, "No bulk tasks data available yet")
        }
    };

    let snapshot_value: Value = match serde_json::to_value(&*snapshot) {
        Ok(snapshot_value) => snapshot_value,
        Err(e) => {
            error!("[api_controller->get_bulk_tasks_latest] {:?}", e);
            return respond_error(StatusCode::NOT_FOUND, "No bulk tasks data available yet");
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "clusterName": cluster_name,
            "snapshot": snapshot_value,
            "latestSnapshotTime": latest_snapshot_time,
        })),
    )
}

async fn get_status(State(context): State<ApiContext>) -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "clusters": context.store.cluster_count(),
        "ratesTracked": context.store.indexing_rate_count(),
        "timestamp": time_now_millis(),
    }))
}

async fn get_jobs(State(context): State<ApiContext>) -> impl IntoResponse {
    let jobs: HashMap<String, JobState> = context.scheduler.job_status();
    Json(json!({ "jobs": jobs }))
}

async fn trigger_job(
    State(context): State<ApiContext>,
    AxumPath(job_name): AxumPath<String>,
) -> impl IntoResponse {
    match context.scheduler.trigger_job(&job_name) {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("Job {} triggered successfully", job_name)
            })),
        ),
        Err(e) => respond_error(
            StatusCode::NOT_FOUND,
            &format!("Failed to trigger job: {:?}", e),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::stat_by_day::*;

    fn context_with_stats() -> ApiContext {
        let store = Arc::new(MetricStore::new());
        store.upsert_cluster_with("es01", |_| {});

        store.with_stats_mut(|all_stats| {
            let mut stale = IndexStatHistory::new("stale-01", 7);
            stale.stats[0] = Some(IndexStat::new(2000, 100, 42));
            stale.stats[3] = Some(IndexStat::new(1000, 90, 42));

            let mut active = IndexStatHistory::new("active-01", 7);
            active.stats[0] = Some(IndexStat::new(2000, 100, 50));
            active.stats[3] = Some(IndexStat::new(1000, 90, 42));

            let mut stat_history = HashMap::new();
            stat_history.insert(String::from("stale-01"), stale);
            stat_history.insert(String::from("active-01"), active);

            all_stats.insert(
                String::from("es01"),
                IndicesStatsByDay {
                    last_update_time: 2000,
                    stat_history,
                },
            );
        });

        ApiContext {
            store,
            scheduler: SchedulerService::new(),
        }
    }

    #[tokio::test]
    async fn stale_indices_follow_doc_count_law() {
        let context = context_with_stats();
        let response = get_stale_indices(
            State(context),
            AxumPath((String::from("es01"), String::from("3"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["staleCount"], 1);
        assert_eq!(body["staleIndices"][0]["indexName"], "stale-01");
        assert_eq!(body["staleIndices"][0]["sizeChange"], 10);
    }

    #[tokio::test]
    async fn bad_days_parameter_is_rejected() {
        let context = context_with_stats();
        let response = get_stale_indices(
            State(context),
            AxumPath((String::from("es01"), String::from("zero"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_cluster_is_not_found() {
        let context = context_with_stats();
        let response = get_indexing_rate(State(context), AxumPath(String::from("nope")))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

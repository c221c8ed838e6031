use crate::common::*;

/*
    기본 쿼리의 응답 형태를 가리키는 JSON path 문자열.
    실제 파싱은 타입드 응답모델(TpwAggResponse)로 하므로 문서용으로만 유지한다.
*/
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase", default)]
pub struct ResultsJsonPaths {
    pub host_name: String,
    pub metrics: String,
    pub metric_timestamp: String,
}

impl Default for ResultsJsonPaths {
    fn default() -> Self {
        ResultsJsonPaths {
            host_name: String::from("aggregations.hostname.buckets.key"),
            metrics: String::from(
                "aggregations.hostname.buckets.date_bucket.buckets.2.top_metrics.metrics.node_stats.thread_pool.write.queue",
            ),
            metric_timestamp: String::from("aggregations.hostname.buckets.date_bucket.buckets.key"),
        }
    }
}

fn default_span_interval() -> String {
    String::from("30s")
}

fn default_time_span() -> String {
    String::from("10m")
}

fn default_parallel_routines() -> usize {
    5
}

#[doc = "getThreadPoolWriteQueue 잡 파라미터"]
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct TpwQueueParams {
    #[serde(rename = "excludeClusters", default)]
    pub exclude_clusters: Vec<String>,
    #[serde(rename = "spanInterval", default = "default_span_interval")]
    pub span_interval: String,
    #[serde(rename = "timeSpan", default = "default_time_span")]
    pub time_span: String,
    #[serde(rename = "parallelRoutines", default = "default_parallel_routines")]
    pub parallel_routines: usize,
    #[serde(rename = "insecureTLS", default)]
    pub insecure_tls: bool,
    #[serde(rename = "APIKEY", default)]
    pub api_key: String,
    #[serde(rename = "APIEndPoints", default)]
    pub api_end_points: Vec<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(rename = "resultsJsonPaths", default)]
    pub results_json_paths: ResultsJsonPaths,
}

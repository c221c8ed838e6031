use crate::common::*;

/*
    모니터링 클러스터 aggregation 응답의 타입드 모델.
    date_bucket 아래의 "2" aggregation 은 top_metrics 이며 top[0].metrics 에
    실제 지표 필드가 들어있다.
*/

pub const TPW_METRIC_FIELD: &str = "node_stats.thread_pool.write.queue";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpwAggResponse {
    #[serde(default)]
    pub aggregations: TpwAggregations,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpwAggregations {
    #[serde(default)]
    pub hostname: TpwHostnameAgg,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpwHostnameAgg {
    #[serde(default)]
    pub buckets: Vec<TpwHostBucket>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpwHostBucket {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub date_bucket: TpwDateBucketAgg,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpwDateBucketAgg {
    #[serde(default)]
    pub buckets: Vec<TpwDateBucket>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpwDateBucket {
    #[serde(default)]
    pub key: i64, /* epoch milliseconds */
    #[serde(rename = "2", default)]
    pub top_metrics: TpwTopMetricsAgg,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpwTopMetricsAgg {
    #[serde(default)]
    pub top: Vec<TpwTopMetric>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TpwTopMetric {
    #[serde(default)]
    pub metrics: HashMap<String, Value>,
}

impl TpwDateBucket {
    #[doc = "top[0].metrics 에서 write queue 값을 꺼내주는 함수"]
    pub fn queue_value(&self) -> Option<u32> {
        self.top_metrics
            .top
            .first()
            .and_then(|top| top.metrics.get(TPW_METRIC_FIELD))
            .and_then(Value::as_f64)
            .map(|value| value as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_top_metrics_shape() {
        let body = json!({
            "aggregations": {
                "hostname": {
                    "buckets": [
                        {
                            "key": "es-data-01",
                            "date_bucket": {
                                "buckets": [
                                    {
                                        "key": 1700000000000_i64,
                                        "2": {
                                            "top": [
                                                { "metrics": { "node_stats.thread_pool.write.queue": 812.0 } }
                                            ]
                                        }
                                    },
                                    { "key": 1700000030000_i64, "2": { "top": [] } }
                                ]
                            }
                        }
                    ]
                }
            }
        });

        let parsed: TpwAggResponse = serde_json::from_value(body).unwrap();
        let host = &parsed.aggregations.hostname.buckets[0];

        assert_eq!(host.key, "es-data-01");
        assert_eq!(host.date_bucket.buckets[0].queue_value(), Some(812));
        assert_eq!(host.date_bucket.buckets[1].queue_value(), None);
    }
}

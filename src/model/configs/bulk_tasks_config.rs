use crate::common::*;

fn default_history_size() -> usize {
    60
}

fn default_max_concurrent() -> usize {
    9
}

#[doc = "getBulkWriteTasks 잡 파라미터"]
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct BulkTasksParams {
    #[serde(rename = "excludeClusters", default)]
    pub exclude_clusters: Vec<String>,
    #[serde(rename = "includeClusters", default)]
    pub include_clusters: Vec<String>,
    #[serde(rename = "historySize", default = "default_history_size")]
    pub history_size: usize,
    #[serde(rename = "insecureTLS", default)]
    pub insecure_tls: bool,
    #[serde(rename = "maxConcurrent", default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for BulkTasksParams {
    fn default() -> Self {
        BulkTasksParams {
            exclude_clusters: Vec::new(),
            include_clusters: Vec::new(),
            history_size: default_history_size(),
            insecure_tls: false,
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl BulkTasksParams {
    #[doc = "historySize 는 10..=180, maxConcurrent 는 1..=20 으로 보정"]
    pub fn clamped(mut self) -> Self {
        if self.history_size < 10 {
            warn!("[BulkTasksParams->clamped] historySize too small, using minimum value: 10");
            self.history_size = 10;
        } else if self.history_size > 180 {
            warn!("[BulkTasksParams->clamped] historySize too large, using maximum value: 180");
            self.history_size = 180;
        }

        if self.max_concurrent < 1 {
            self.max_concurrent = 1;
        } else if self.max_concurrent > 20 {
            warn!("[BulkTasksParams->clamped] maxConcurrent too large, using maximum value: 20");
            self.max_concurrent = 20;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_apply_on_both_ends() {
        let low = BulkTasksParams {
            history_size: 3,
            max_concurrent: 0,
            ..BulkTasksParams::default()
        }
        .clamped();
        assert_eq!(low.history_size, 10);
        assert_eq!(low.max_concurrent, 1);

        let high = BulkTasksParams {
            history_size: 999,
            max_concurrent: 50,
            ..BulkTasksParams::default()
        }
        .clamped();
        assert_eq!(high.history_size, 180);
        assert_eq!(high.max_concurrent, 20);
    }
}

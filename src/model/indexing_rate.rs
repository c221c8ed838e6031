use crate::common::*;

#[doc = "프라이머리 샤드당 색인속도 (bytes/ms) - 데이터 부족은 -1"]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct IndexingRate {
    pub from_creation: f64,
    pub last_3_minutes: f64,
    pub last_15_minutes: f64,
    pub last_60_minutes: f64,
    pub number_of_shards: u32,
}

pub const RATE_UNAVAILABLE: f64 = -1.0;

impl IndexingRate {
    pub fn unavailable(number_of_shards: u32) -> Self {
        IndexingRate {
            from_creation: RATE_UNAVAILABLE,
            last_3_minutes: RATE_UNAVAILABLE,
            last_15_minutes: RATE_UNAVAILABLE,
            last_60_minutes: RATE_UNAVAILABLE,
            number_of_shards,
        }
    }
}

#[doc = "클러스터 단위 색인속도 - per_index 키는 index_base"]
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct ClusterIndexingRate {
    pub timestamp: i64,
    pub per_index: HashMap<String, IndexingRate>,
}

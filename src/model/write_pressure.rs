use crate::common::*;

#[doc = "쓰기압력 이벤트 - event_start_time 은 epoch seconds (키 포멧이 여기에 의존한다)"]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct WritePressureEvent {
    pub event_start_time: i64,
    pub host_name: String,
    pub cluster_name: String,
}

impl WritePressureEvent {
    pub fn key(&self) -> String {
        event_key(&self.host_name, self.event_start_time)
    }
}

pub fn event_key(host_name: &str, event_start_time: i64) -> String {
    format!("{}_{}", host_name, event_start_time)
}

#[doc = "이벤트 키 suffix 에서 epoch seconds 를 복원해주는 함수"]
pub fn event_key_timestamp(key: &str) -> Option<i64> {
    key.rsplit('_').next().and_then(|part| part.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trip_with_underscored_host() {
        let event = WritePressureEvent::new(1_700_000_000, String::from("es_data_01"), String::from("c1"));
        let key = event.key();
        assert_eq!(key, "es_data_01_1700000000");
        assert_eq!(event_key_timestamp(&key), Some(1_700_000_000));
    }
}

use crate::common::*;

#[doc = "호스트 하나의 write queue 깊이 시계열 - 병렬배열, 인덱스 0 이 최신"]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpwQueue {
    pub number_of_data_points: usize,
    pub time_stamps: Vec<i64>,
    pub queues: Vec<u32>,
    pub data_exists: Vec<bool>,
}

impl TpwQueue {
    pub fn new(number_of_data_points: usize) -> Self {
        TpwQueue {
            number_of_data_points,
            time_stamps: vec![0; number_of_data_points],
            queues: vec![0; number_of_data_points],
            data_exists: vec![false; number_of_data_points],
        }
    }

    pub fn set_point(&mut self, slot: usize, timestamp: i64, queue: u32) {
        if slot >= self.number_of_data_points {
            return;
        }
        self.time_stamps[slot] = timestamp;
        self.queues[slot] = queue;
        self.data_exists[slot] = true;
    }

    #[doc = "기존 배열을 points_per_dataset 만큼 뒤로 밀고 앞쪽을 새 데이터셋으로 덮어쓴다"]
    pub fn roll_in(&mut self, fresh: &TpwQueue, points_per_dataset: usize) {
        let total: usize = self.number_of_data_points;

        for i in (points_per_dataset..total).rev() {
            let src: usize = i - points_per_dataset;
            self.time_stamps[i] = self.time_stamps[src];
            self.queues[i] = self.queues[src];
            self.data_exists[i] = self.data_exists[src];
        }

        let head: usize = points_per_dataset.min(fresh.time_stamps.len()).min(total);
        for i in 0..head {
            self.time_stamps[i] = fresh.time_stamps[i];
            self.queues[i] = fresh.queues[i];
            self.data_exists[i] = fresh.data_exists[i];
        }
    }
}

#[doc = "클러스터 단위 TPW 상태 - host_order 는 표시순서 유지용"]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct ClustersTpwQueue {
    pub host_order: Vec<String>,
    pub per_host: HashMap<String, TpwQueue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_points_stay_zeroed() {
        let mut queue = TpwQueue::new(4);
        queue.set_point(1, 1000, 750);

        for i in 0..4 {
            if queue.data_exists[i] {
                assert!(queue.time_stamps[i] > 0);
            } else {
                assert_eq!(queue.time_stamps[i], 0);
                assert_eq!(queue.queues[i], 0);
            }
        }
    }

    #[test]
    fn roll_in_shifts_and_overwrites_head() {
        let mut existing = TpwQueue::new(6);
        for i in 0..6 {
            existing.set_point(i, 100 - i as i64, i as u32);
        }

        let mut fresh = TpwQueue::new(6);
        fresh.set_point(0, 200, 90);
        /* slot 1 은 결측 */

        existing.roll_in(&fresh, 2);

        assert_eq!(existing.time_stamps[0], 200);
        assert_eq!(existing.queues[0], 90);
        assert!(existing.data_exists[0]);
        assert!(!existing.data_exists[1]);

        /* 기존 슬롯 0..3 이 2..5 로 밀렸는지 */
        assert_eq!(existing.time_stamps[2], 100);
        assert_eq!(existing.queues[2], 0);
        assert_eq!(existing.time_stamps[5], 97);
        assert_eq!(existing.queues[5], 3);
    }
}

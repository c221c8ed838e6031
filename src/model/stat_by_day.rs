use crate::common::*;

#[doc = "인덱스 하나의 일별 샘플"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct IndexStat {
    pub stat_time: i64,
    pub total_size: u64,
    pub doc_count: u64,
}

#[doc = "인덱스 하나의 D+1 슬롯 일별 히스토리 - 슬롯 0 이 최신"]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatHistory {
    pub index_name: String,
    pub days: usize,
    pub stats: Vec<Option<IndexStat>>,
}

impl IndexStatHistory {
    pub fn new(index_name: &str, days: usize) -> Self {
        let days: usize = days.max(1);
        IndexStatHistory {
            index_name: index_name.to_string(),
            days,
            stats: vec![None; days + 1],
        }
    }

    #[doc = "경과일수만큼 슬롯을 뒤로 밀어주는 함수 - 슬롯 0 은 이후 현재 샘플로 덮어쓴다"]
    pub fn roll_forward(&mut self, days_forward: usize) {
        if days_forward == 0 {
            return;
        }

        if days_forward > self.days {
            for i in 1..=self.days {
                self.stats[i] = None;
            }
            return;
        }

        for i in (days_forward..=self.days).rev() {
            self.stats[i] = self.stats[i - days_forward];
        }

        for i in 1..days_forward {
            self.stats[i] = None;
        }
    }

    #[doc = "k 일 동안 문서수 변화가 없으면 stale"]
    pub fn is_stale_for(&self, days: usize) -> bool {
        if days >= self.stats.len() {
            return false;
        }

        match (self.stats[0], self.stats[days]) {
            (Some(current), Some(old)) => current.doc_count == old.doc_count,
            _ => false,
        }
    }
}

#[doc = "클러스터 단위 일별 통계 - 백업파일에 그대로 직렬화된다"]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct IndicesStatsByDay {
    pub last_update_time: i64,
    pub stat_history: HashMap<String, IndexStatHistory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(time: i64, docs: u64) -> IndexStat {
        IndexStat::new(time, docs * 10, docs)
    }

    #[test]
    fn roll_forward_moves_slots_and_nulls_gap() {
        let mut history = IndexStatHistory::new("logs", 30);
        history.stats[0] = Some(stat(1000, 5));
        history.stats[1] = Some(stat(900, 4));

        history.roll_forward(3);

        assert_eq!(history.stats[3], Some(stat(1000, 5)));
        assert_eq!(history.stats[4], Some(stat(900, 4)));
        assert_eq!(history.stats[1], None);
        assert_eq!(history.stats[2], None);
        /* 슬롯 0 은 호출측이 현재 샘플로 덮어쓰기 전까지 기존값 유지 */
        assert_eq!(history.stats[0], Some(stat(1000, 5)));
    }

    #[test]
    fn roll_forward_beyond_capacity_clears_everything() {
        let mut history = IndexStatHistory::new("logs", 5);
        for i in 0..=5 {
            history.stats[i] = Some(stat(1000 - i as i64, 1));
        }

        history.roll_forward(9);

        assert!(history.stats[1..].iter().all(Option::is_none));
        assert!(history.stats[0].is_some());
    }

    #[test]
    fn stale_law() {
        let mut history = IndexStatHistory::new("logs", 7);
        history.stats[0] = Some(stat(2000, 42));
        history.stats[3] = Some(stat(1000, 42));
        history.stats[5] = Some(stat(500, 40));

        assert!(history.is_stale_for(3));
        assert!(!history.is_stale_for(5));
        assert!(!history.is_stale_for(2)); /* 슬롯 없음 */
        assert!(!history.is_stale_for(100)); /* 범위 밖 */
    }
}

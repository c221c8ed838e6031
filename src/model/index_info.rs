use crate::common::*;

use crate::enums::index_health::*;

#[doc = "한 시점의 인덱스 한 개에 대한 관측값"]
#[derive(Builder, Debug, Clone, Serialize, Deserialize, Getters, new)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub health: IndexHealth,
    pub is_open: bool,
    pub doc_count: u64,
    pub index: String,
    pub index_base: String,
    pub seq_no: u64,
    pub primary_shards: u32,
    pub creation_time: i64, /* epoch milliseconds */
    pub total_storage: u64,
    pub primary_storage: u64,
}

#[doc = "한 클러스터의 _cat/indices 스냅샷 - entries 키는 전체 인덱스 이름, index_base 는 스냅샷 내에서 유일"]
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct IndicesSnapshot {
    pub snapshot_time: i64,
    pub entries: HashMap<String, IndexInfo>,
}

impl IndicesSnapshot {
    pub fn new(snapshot_time: i64) -> Self {
        IndicesSnapshot {
            snapshot_time,
            entries: HashMap::new(),
        }
    }

}

#[doc = "스냅샷 N+1 슬롯 링 - 슬롯 0 이 가장 오래된 것, 슬롯 N 이 최신"]
#[derive(Debug)]
pub struct IndicesHistory {
    size: usize,
    ring: RwLock<Vec<Option<Arc<IndicesSnapshot>>>>,
}

impl IndicesHistory {
    pub fn new(size: usize) -> Self {
        let size: usize = size.max(1);
        IndicesHistory {
            size,
            ring: RwLock::new(vec![None; size + 1]),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[doc = "새 스냅샷을 링에 추가 - 왼쪽으로 한 칸씩 밀고 슬롯 N 에 기록"]
    pub fn append(&self, snapshot: Arc<IndicesSnapshot>) {
        let mut ring = match self.ring.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        for i in 0..self.size {
            ring[i] = ring[i + 1].take();
        }
        ring[self.size] = Some(snapshot);
    }

    #[doc = "링의 shallow copy (Arc 복제) 를 반환 - 읽기측은 락을 잡지 않고 계산"]
    pub fn clone_ring(&self) -> Vec<Option<Arc<IndicesSnapshot>>> {
        let ring = match self.ring.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        ring.clone()
    }

    #[doc = "가장 최근의 비어있지 않은 슬롯 인덱스"]
    pub fn latest_index(&self) -> Option<usize> {
        let ring = match self.ring.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        ring.iter().rposition(Option::is_some)
    }

    pub fn latest_snapshot(&self) -> Option<Arc<IndicesSnapshot>> {
        let ring = match self.ring.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        ring.iter().rev().find_map(Clone::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_at(time: i64) -> Arc<IndicesSnapshot> {
        Arc::new(IndicesSnapshot::new(time))
    }

    #[test]
    fn zero_capacity_is_clamped_to_one_slot() {
        let history = IndicesHistory::new(0);
        assert_eq!(history.size(), 1);
        assert_eq!(history.clone_ring().len(), 2);
    }

    #[test]
    fn append_shifts_left_and_newest_is_last() {
        let history = IndicesHistory::new(3);

        for t in 1..=6 {
            history.append(snapshot_at(t * 100));
        }

        let ring = history.clone_ring();
        let times: Vec<Option<i64>> = ring
            .iter()
            .map(|slot| slot.as_ref().map(|s| s.snapshot_time))
            .collect();

        assert_eq!(times, vec![Some(300), Some(400), Some(500), Some(600)]);
        assert_eq!(history.latest_index(), Some(3));
    }

    #[test]
    fn ring_is_monotonic_after_appends() {
        let history = IndicesHistory::new(5);
        for t in [10, 20, 30] {
            history.append(snapshot_at(t));
        }

        let ring = history.clone_ring();
        let latest = history.latest_index().unwrap();
        let newest_time = ring[latest].as_ref().unwrap().snapshot_time;

        for slot in ring.iter().flatten() {
            assert!(slot.snapshot_time <= newest_time);
        }

        /* 가장 오래된 유효슬롯이 최소 시각인지 */
        let oldest = ring.iter().flatten().next().unwrap();
        assert!(ring
            .iter()
            .flatten()
            .all(|s| s.snapshot_time >= oldest.snapshot_time));
    }

    #[test]
    fn latest_on_empty_ring_is_none() {
        let history = IndicesHistory::new(4);
        assert_eq!(history.latest_index(), None);
        assert!(history.latest_snapshot().is_none());
    }
}

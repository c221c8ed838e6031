use crate::common::*;

use crate::enums::missing_data_mode::*;

use crate::model::configs::write_pressure_config::*;
use crate::model::store::*;
use crate::model::tpw_queue::*;
use crate::model::write_pressure::*;

use crate::utils_modules::io_utils::*;
use crate::utils_modules::time_utils::*;

use crate::traits::service::write_pressure_service_trait::*;

#[derive(Debug, Default, Clone, Copy)]
struct RunTimes {
    old: i64,
    previous: i64,
    last: i64,
}

#[doc = "TPW 시계열에서 연속 임계초과를 탐지해 이벤트를 적재하는 서비스"]
#[derive(Debug)]
pub struct WritePressureServiceImpl {
    store: Arc<MetricStore>,
    log_path: PathBuf,
    run_times: Mutex<RunTimes>,
}

impl WritePressureServiceImpl {
    pub fn new(store: Arc<MetricStore>, log_path: PathBuf) -> Self {
        WritePressureServiceImpl {
            store,
            log_path,
            run_times: Mutex::new(RunTimes::default()),
        }
    }

    #[doc = "이번 실행 시각을 밀어넣고 (old <- previous <- last <- now) 정리 기준이 될 old 를 반환"]
    fn shift_run_times(&self, now_secs: i64) -> i64 {
        let mut run_times = match self.run_times.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        run_times.old = run_times.previous;
        run_times.previous = run_times.last;
        run_times.last = now_secs;

        run_times.old
    }

    #[doc = "결측 포인트를 걸러낸 압축 시퀀스에서 연속 임계초과를 찾는다"]
    fn check_missing_filtered(
        queue: &TpwQueue,
        threshold: u32,
        consecutive: usize,
    ) -> Option<i64> {
        let valid: Vec<(i64, u32)> = (0..queue.number_of_data_points)
            .filter(|&i| queue.data_exists[i])
            .map(|i| (queue.time_stamps[i], queue.queues[i]))
            .collect();

        if valid.len() < consecutive {
            return None;
        }

        /* 인덱스 0 이 최신이므로 큰 인덱스부터가 과거->현재 순서 */
        for i in (consecutive - 1..valid.len()).rev() {
            let window = (0..consecutive).map(|j| valid[i - j]);

            if window.clone().all(|(_, value)| value >= threshold) {
                /* 창 안에서 가장 최신 포인트의 시각 */
                let (start_time, _) = valid[i - (consecutive - 1)];
                return Some(start_time);
            }
        }

        None
    }

    #[doc = "결측 포인트가 연속성을 끊는 모드"]
    fn check_missing_non_offending(
        queue: &TpwQueue,
        threshold: u32,
        consecutive: usize,
    ) -> Option<i64> {
        let total: usize = queue.number_of_data_points;
        if total < consecutive {
            return None;
        }

        for i in (consecutive - 1..total).rev() {
            let mut start_time: Option<i64> = None;
            let mut count: usize = 0;

            for j in 0..consecutive {
                let idx: usize = i - j;
                if !queue.data_exists[idx] || queue.queues[idx] < threshold {
                    break;
                }
                count += 1;
                if j == consecutive - 1 {
                    start_time = Some(queue.time_stamps[idx]);
                }
            }

            if count == consecutive {
                return start_time;
            }
        }

        None
    }

    #[doc = "결측 포인트도 임계초과로 취급하는 모드"]
    fn check_missing_offending(
        queue: &TpwQueue,
        threshold: u32,
        consecutive: usize,
    ) -> Option<i64> {
        let total: usize = queue.number_of_data_points;
        if total < consecutive {
            return None;
        }

        for i in (consecutive - 1..total).rev() {
            let mut start_time: Option<i64> = None;
            let mut count: usize = 0;

            for j in 0..consecutive {
                let idx: usize = i - j;

                if !queue.data_exists[idx] {
                    count += 1;
                    if j == consecutive - 1 && queue.time_stamps[idx] != 0 {
                        start_time = Some(queue.time_stamps[idx]);
                    }
                } else if queue.queues[idx] >= threshold {
                    count += 1;
                    if j == consecutive - 1 {
                        start_time = Some(queue.time_stamps[idx]);
                    }
                } else {
                    break;
                }
            }

            if count == consecutive {
                /* 창의 최신쪽이 결측이고 시각도 없으면 0 으로 기록된다 */
                return Some(start_time.unwrap_or(0));
            }
        }

        None
    }

    fn detect(
        queue: &TpwQueue,
        threshold: u32,
        consecutive: usize,
        mode: MissingDataMode,
    ) -> Option<i64> {
        if queue.number_of_data_points == 0 || consecutive == 0 {
            return None;
        }

        match mode {
            MissingDataMode::Missing => Self::check_missing_filtered(queue, threshold, consecutive),
            MissingDataMode::NonOffending => {
                Self::check_missing_non_offending(queue, threshold, consecutive)
            }
            MissingDataMode::Offending => {
                Self::check_missing_offending(queue, threshold, consecutive)
            }
        }
    }

    fn log_event(&self, event: &WritePressureEvent) {
        let line: String = format!(
            "[{}] [PRESSURE_EVENT] ObservedTime={}, Host={}, Cluster={}",
            get_current_utc_str(),
            get_str_from_epoch_secs(event.event_start_time),
            event.host_name,
            event.cluster_name
        );

        if let Err(e) = append_line(&self.log_path, &line) {
            error!("[checkForWritePressure] Failed to append event log: {:?}", e);
        }
    }
}

#[async_trait]
impl WritePressureService for WritePressureServiceImpl {
    async fn check_for_write_pressure(&self, params: WritePressureParams) -> Result<()> {
        info!("[checkForWritePressure] Starting write pressure check");

        let threshold: u32 = params.threshold_value;
        let consecutive: usize = params.no_of_consecutive_intervals;
        let mode: MissingDataMode = params.consider_missing_data_point;

        info!(
            "[checkForWritePressure] Config: threshold={}, consecutiveIntervals={}, missingDataPoint={:?}",
            threshold, consecutive, mode
        );

        let old_run_time: i64 = self.shift_run_times(time_now_secs());

        let cluster_names: Vec<String> = self
            .store
            .tpw_cluster_names()
            .into_iter()
            .filter(|name| !params.exclude_clusters.contains(name))
            .collect();

        info!(
            "[checkForWritePressure] Checking {} clusters for write pressure",
            cluster_names.len()
        );

        let mut hosts_checked: usize = 0;
        let mut events_detected: usize = 0;

        for cluster_name in cluster_names {
            let cluster_data: ClustersTpwQueue = match self.store.tpw_for(&cluster_name) {
                Some(cluster_data) => cluster_data,
                None => continue,
            };

            for host_name in &cluster_data.host_order {
                let queue: &TpwQueue = match cluster_data.per_host.get(host_name) {
                    Some(queue) => queue,
                    None => continue,
                };

                hosts_checked += 1;

                let start_time: i64 = match Self::detect(queue, threshold, consecutive, mode) {
                    Some(start_time) => start_time,
                    None => continue,
                };

                let event: WritePressureEvent = WritePressureEvent::new(
                    start_time,
                    host_name.clone(),
                    cluster_name.clone(),
                );

                if self.store.record_write_pressure(event.clone()) {
                    events_detected += 1;
                    self.log_event(&event);
                    info!(
                        "[checkForWritePressure] New write pressure event: cluster={}, host={}, startTime={}",
                        cluster_name, host_name, start_time
                    );
                }
            }
        }

        if old_run_time != 0 {
            let removed: usize = self.store.cleanup_write_pressure_before(old_run_time);
            if removed > 0 {
                info!(
                    "[checkForWritePressure] Cleaned up {} old write pressure events",
                    removed
                );
            }
        }

        info!(
            "[checkForWritePressure] Completed: checked {} hosts, detected {} pressure events",
            hosts_checked, events_detected
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /* (value, exists) 목록으로 큐 구성 - 인덱스 0 이 최신, 타임스탬프는 최신일수록 크다 */
    fn queue_from(points: &[(u32, bool)]) -> TpwQueue {
        let mut queue = TpwQueue::new(points.len());
        for (i, &(value, exists)) in points.iter().enumerate() {
            if exists {
                queue.set_point(i, 10_000 - (i as i64 * 100), value);
            }
        }
        queue
    }

    #[test]
    fn missing_mode_compacts_and_fires() {
        /* [800, ·, 750, 720, 710], threshold 700, consecutive 3 */
        let queue = queue_from(&[(800, true), (0, false), (750, true), (720, true), (710, true)]);

        let start = WritePressureServiceImpl::detect(&queue, 700, 3, MissingDataMode::Missing);

        /* 가장 과거쪽 창 {710,720,750} 이 먼저 성립, startTime 은 창의 최신 포인트(750, idx 2) */
        assert_eq!(start, Some(10_000 - 200));
    }

    #[test]
    fn missing_mode_needs_enough_valid_points() {
        let queue = queue_from(&[(800, true), (0, false), (0, false), (900, true)]);
        assert_eq!(
            WritePressureServiceImpl::detect(&queue, 700, 3, MissingDataMode::Missing),
            None
        );
    }

    #[test]
    fn non_offending_mode_breaks_on_gap() {
        /* 결측이 사이에 끼면 연속이 끊긴다 */
        let queue = queue_from(&[(800, true), (0, false), (750, true), (720, true)]);
        assert_eq!(
            WritePressureServiceImpl::detect(&queue, 700, 3, MissingDataMode::NonOffending),
            None
        );

        /* 연속 3개가 온전히 있으면 성립 */
        let queue = queue_from(&[(800, true), (750, true), (720, true), (100, true)]);
        let start =
            WritePressureServiceImpl::detect(&queue, 700, 3, MissingDataMode::NonOffending);
        assert_eq!(start, Some(10_000));
    }

    #[test]
    fn offending_mode_counts_gap_as_violation() {
        let queue = queue_from(&[(800, true), (0, false), (750, true), (100, true)]);
        let start = WritePressureServiceImpl::detect(&queue, 700, 3, MissingDataMode::Offending);

        /* 창 {750, 결측, 800} (인덱스 2..0) 성립, 최신 포인트는 idx 0 */
        assert_eq!(start, Some(10_000));
    }

    #[test]
    fn below_threshold_never_fires() {
        let queue = queue_from(&[(100, true), (200, true), (300, true), (400, true)]);
        for mode in [
            MissingDataMode::Missing,
            MissingDataMode::NonOffending,
            MissingDataMode::Offending,
        ] {
            assert_eq!(WritePressureServiceImpl::detect(&queue, 700, 3, mode), None);
        }
    }

    #[tokio::test]
    async fn event_recorded_once_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MetricStore::new());

        /* host-a 가 임계초과 상태인 TPW 데이터 구성 */
        store.with_tpw_mut(|all| {
            let mut per_host = HashMap::new();
            per_host.insert(
                String::from("host-a"),
                queue_from(&[(800, true), (790, true), (780, true)]),
            );
            all.insert(
                String::from("es01"),
                ClustersTpwQueue {
                    host_order: vec![String::from("host-a")],
                    per_host,
                },
            );
        });

        let service = WritePressureServiceImpl::new(
            Arc::clone(&store),
            dir.path().join("writePressure.log"),
        );

        let params = WritePressureParams::default();

        service.check_for_write_pressure(params.clone()).await.unwrap();
        assert_eq!(store.write_pressure_events().len(), 1);

        /* 같은 데이터로 다시 돌려도 키가 같아 중복적재되지 않는다 */
        service.check_for_write_pressure(params.clone()).await.unwrap();
        assert_eq!(store.write_pressure_events().len(), 1);

        assert!(dir.path().join("writePressure.log").is_file());

        /* 세번째 실행부터 old_run_time 이 차서 과거 이벤트가 정리된다 */
        service.check_for_write_pressure(params).await.unwrap();
        assert!(store.write_pressure_events().is_empty());
    }
}

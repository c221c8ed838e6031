use crate::common::*;

use crate::model::configs::job_config::*;

use crate::utils_modules::time_utils::*;

#[doc = "잡 함수가 받는 실행 컨텍스트 - 셧다운 신호 구독"]
#[derive(Debug, Clone)]
pub struct JobContext {
    pub shutdown: watch::Receiver<bool>,
}

pub type JobFuture = BoxFuture<'static, Result<()>>;
pub type JobFunc = Arc<dyn Fn(JobContext, Value) -> JobFuture + Send + Sync>;

#[doc = "잡 실행 카운터"]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    pub running: bool,
    pub last_run: i64,
    pub run_count: u64,
    pub error_count: u64,
}

#[derive(Debug)]
pub struct Job {
    pub config: JobConfig,
    state: Mutex<JobState>,
}

impl Job {
    fn new(config: JobConfig) -> Self {
        Job {
            config,
            state: Mutex::new(JobState::default()),
        }
    }

    pub fn state(&self) -> JobState {
        match self.state.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[doc = "잡 레지스트리 + 트리거 엔진."]
/// init 잡은 등록순서대로 직렬 실행된다. 스케줄 잡은 cron 또는 고정 interval 로
/// 돌고, dependsOn 잡은 부모가 끝날 때마다 (성공여부와 무관하게) 비동기로 발화한다.
/// 같은 잡의 동시실행은 금지 - 실행중 재트리거는 경고 후 버린다.
pub struct SchedulerService {
    jobs: RwLock<HashMap<String, Arc<Job>>>,
    job_funcs: RwLock<HashMap<String, JobFunc>>,
    init_jobs: RwLock<Vec<Arc<Job>>>,
    dependency_map: RwLock<HashMap<String, Vec<String>>>,
    shutdown_tx: watch::Sender<bool>,
    accepting: AtomicBool,
    in_flight: AtomicUsize,
    drained: Notify,
    /* 타이머 루프와 팬아웃이 spawn 할 때 쓰는 자기참조 */
    weak_self: std::sync::Weak<SchedulerService>,
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SchedulerService {
    pub fn new() -> Arc<Self> {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        Arc::new_cyclic(|weak_self| SchedulerService {
            jobs: RwLock::new(HashMap::new()),
            job_funcs: RwLock::new(HashMap::new()),
            init_jobs: RwLock::new(Vec::new()),
            dependency_map: RwLock::new(HashMap::new()),
            shutdown_tx,
            accepting: AtomicBool::new(true),
            in_flight: AtomicUsize::new(0),
            drained: Notify::new(),
            weak_self: weak_self.clone(),
        })
    }

    pub fn register_job_func(&self, internal_name: &str, func: JobFunc) {
        write_lock(&self.job_funcs).insert(internal_name.to_string(), func);
        info!("Registered job function: {}", internal_name);
    }

    #[doc = "잡 등록 - 스케줄 문자열은 여기서 검증해서 설정오류를 로딩시점에 드러낸다"]
    pub fn add_job(&self, config: JobConfig) -> Result<()> {
        if !config.enabled {
            info!("Job {} is disabled, skipping", config.name);
            return Ok(());
        }

        if let Some(schedule) = &config.schedule {
            if let Some(cron_expr) = &schedule.cron {
                cron::Schedule::from_str(cron_expr).map_err(|e| {
                    anyhow!(
                        "[SchedulerService->add_job] Job {}: invalid cron '{}': {:?}",
                        config.name,
                        cron_expr,
                        e
                    )
                })?;
            }
            if let Some(interval) = &schedule.interval {
                parse_duration_str(interval).map_err(|e| {
                    anyhow!(
                        "[SchedulerService->add_job] Job {}: invalid interval: {:?}",
                        config.name,
                        e
                    )
                })?;
            }
            if let Some(wait) = &schedule.initial_wait {
                parse_duration_str(wait).map_err(|e| {
                    anyhow!(
                        "[SchedulerService->add_job] Job {}: invalid initial wait: {:?}",
                        config.name,
                        e
                    )
                })?;
            }
        }

        let job: Arc<Job> = Arc::new(Job::new(config));
        let name: String = job.config.name.clone();

        write_lock(&self.jobs).insert(name.clone(), Arc::clone(&job));

        if job.config.init_job {
            write_lock(&self.init_jobs).push(job);
            info!("Added initialization job: {}", name);
            return Ok(());
        }

        if !job.config.depends_on.is_empty() {
            let mut dependency_map = write_lock(&self.dependency_map);
            for parent in &job.config.depends_on {
                dependency_map
                    .entry(parent.clone())
                    .or_default()
                    .push(name.clone());
            }
            info!("Job {} depends on: {:?}", name, job.config.depends_on);
            return Ok(());
        }

        info!("Added job: {}", name);
        Ok(())
    }

    #[doc = "init 잡들을 등록순서대로 직렬 실행 - 하나라도 실패하면 기동 중단"]
    pub async fn run_init_jobs(&self) -> Result<()> {
        let init_jobs: Vec<Arc<Job>> = read_lock(&self.init_jobs).clone();
        info!("Running {} initialization jobs", init_jobs.len());

        for job in init_jobs {
            let name: String = job.config.name.clone();

            self.execute_job(job).await.map_err(|e| {
                anyhow!(
                    "[SchedulerService->run_init_jobs] initialization job {} failed: {:?}",
                    name,
                    e
                )
            })?;
        }

        info!("All initialization jobs completed successfully");
        Ok(())
    }

    #[doc = "잡 한 번 실행 - 상태머신 idle -> running -> idle, 종료시 dependsOn 팬아웃"]
    async fn execute_job(&self, job: Arc<Job>) -> Result<()> {
        {
            let mut state = match job.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            if state.running {
                warn!("[{}] Job is already running, skipping", job.config.name);
                return Ok(());
            }

            state.running = true;
            state.last_run = time_now_millis();
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        info!("[{}] Starting job execution", job.config.name);

        let result: Result<()> = self.run_job_body(&job.config).await;

        {
            let mut state = match job.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            state.running = false;
            state.run_count += 1;
            if result.is_err() {
                state.error_count += 1;
            }
        }

        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }

        match &result {
            Ok(_) => info!("[{}] Job execution completed successfully", job.config.name),
            Err(e) => error!("[{}] Job execution failed: {:?}", job.config.name, e),
        }

        /* 부모의 성공여부와 무관하게 의존잡을 발화한다 */
        self.trigger_dependents(&job.config.name);

        result
    }

    async fn run_job_body(&self, config: &JobConfig) -> Result<()> {
        match config.job_type.as_str() {
            "preDefined" | "func" => {
                let func: Option<JobFunc> =
                    read_lock(&self.job_funcs).get(&config.internal_job_name).cloned();

                match func {
                    Some(func) => {
                        let context: JobContext = JobContext {
                            shutdown: self.shutdown_tx.subscribe(),
                        };
                        func(context, config.parameters.clone()).await
                    }
                    None => Err(anyhow!(
                        "job function not registered: {}",
                        config.internal_job_name
                    )),
                }
            }
            "shell" => Err(anyhow!("shell job execution not implemented yet")),
            "api" => Err(anyhow!("API job execution not implemented yet")),
            other => Err(anyhow!("unknown job type: {}", other)),
        }
    }

    fn trigger_dependents(&self, completed_job: &str) {
        let dependents: Vec<String> = read_lock(&self.dependency_map)
            .get(completed_job)
            .cloned()
            .unwrap_or_default();

        if dependents.is_empty() {
            return;
        }

        info!(
            "Executing dependent jobs of {}: {:?}",
            completed_job, dependents
        );

        for name in dependents {
            let job: Option<Arc<Job>> = read_lock(&self.jobs).get(&name).cloned();
            if let Some(job) = job {
                self.spawn_execute(job);
            }
        }
    }

    fn spawn_execute(&self, job: Arc<Job>) {
        if !self.accepting.load(Ordering::SeqCst) {
            warn!(
                "[{}] Scheduler is shutting down, dropping trigger",
                job.config.name
            );
            return;
        }

        let this: Arc<Self> = match self.weak_self.upgrade() {
            Some(this) => this,
            None => return,
        };

        tokio::spawn(async move {
            let _ = this.execute_job(job).await;
        });
    }

    #[doc = "스케줄 잡들의 타이머 루프 기동"]
    pub fn start(&self) {
        info!("Starting job scheduler");

        let this: Arc<Self> = match self.weak_self.upgrade() {
            Some(this) => this,
            None => return,
        };

        let scheduled: Vec<Arc<Job>> = read_lock(&self.jobs)
            .values()
            .filter(|job| {
                !job.config.init_job
                    && job.config.depends_on.is_empty()
                    && job.config.schedule.is_some()
            })
            .cloned()
            .collect();

        for job in scheduled {
            let schedule: ScheduleConfig = match job.config.schedule.clone() {
                Some(schedule) => schedule,
                None => continue,
            };

            if let Some(cron_expr) = &schedule.cron {
                match cron::Schedule::from_str(cron_expr) {
                    Ok(cron_schedule) => {
                        info!(
                            "Scheduled job {} with cron: {}",
                            job.config.name, cron_expr
                        );
                        let this: Arc<Self> = Arc::clone(&this);
                        let job: Arc<Job> = Arc::clone(&job);
                        tokio::spawn(async move {
                            this.cron_loop(job, cron_schedule).await;
                        });
                    }
                    Err(e) => {
                        error!(
                            "[SchedulerService->start] Job {}: invalid cron '{}': {:?}",
                            job.config.name, cron_expr, e
                        );
                    }
                }
            } else if let Some(interval_str) = &schedule.interval {
                match parse_duration_str(interval_str) {
                    Ok(interval) => {
                        info!(
                            "Scheduled job {} with interval: {}",
                            job.config.name, interval_str
                        );
                        let this: Arc<Self> = Arc::clone(&this);
                        let job: Arc<Job> = Arc::clone(&job);
                        tokio::spawn(async move {
                            this.interval_loop(job, interval).await;
                        });
                    }
                    Err(e) => {
                        error!("[SchedulerService->start] {:?}", e);
                    }
                }
            }

            /* initialWait 는 스케줄 등록과 병행해서 첫 실행 한 번을 지연 발화 */
            if let Some(wait_str) = &schedule.initial_wait {
                if let Ok(wait) = parse_duration_str(wait_str) {
                    let this: Arc<Self> = Arc::clone(&this);
                    let job: Arc<Job> = Arc::clone(&job);
                    let mut shutdown: watch::Receiver<bool> = self.shutdown_tx.subscribe();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = sleep(wait) => this.spawn_execute(job),
                            _ = shutdown.changed() => {}
                        }
                    });
                }
            }
        }
    }

    async fn cron_loop(self: Arc<Self>, job: Arc<Job>, schedule: cron::Schedule) {
        let mut shutdown: watch::Receiver<bool> = self.shutdown_tx.subscribe();

        loop {
            let now: DateTime<Utc> = Utc::now();
            let next: DateTime<Utc> = match schedule.upcoming(Utc).next() {
                Some(next) => next,
                None => break,
            };

            let wait: Duration = match (next - now).to_std() {
                Ok(wait) => wait,
                Err(_) => continue,
            };

            let wake: Instant = Instant::now() + wait;

            tokio::select! {
                _ = sleep_until(wake) => self.spawn_execute(Arc::clone(&job)),
                _ = shutdown.changed() => break,
            }
        }
    }

    async fn interval_loop(self: Arc<Self>, job: Arc<Job>, interval: Duration) {
        let mut shutdown: watch::Receiver<bool> = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                _ = sleep(interval) => self.spawn_execute(Arc::clone(&job)),
                _ = shutdown.changed() => break,
            }
        }
    }

    #[doc = "수동 트리거 - 스케줄과 무관하게 비동기 실행, 자기중복 규칙은 동일"]
    pub fn trigger_job(&self, job_name: &str) -> Result<()> {
        let job: Arc<Job> = read_lock(&self.jobs)
            .get(job_name)
            .cloned()
            .ok_or_else(|| anyhow!("job not found: {}", job_name))?;

        self.spawn_execute(job);
        Ok(())
    }

    #[doc = "oneTime 잡 실행 - 레지스트리에 올리지 않고 함수만 한 번 돌린다"]
    pub async fn run_job_config_once(&self, config: &JobConfig) -> Result<()> {
        self.run_job_body(config).await
    }

    pub fn job_status(&self) -> HashMap<String, JobState> {
        read_lock(&self.jobs)
            .iter()
            .map(|(name, job)| (name.clone(), job.state()))
            .collect()
    }

    #[doc = "셧다운 - 신규 트리거 차단, 신호 전파, 실행중 잡을 예산 안에서 대기"]
    pub async fn stop(&self, budget: Duration) {
        info!("Stopping job scheduler");

        self.accepting.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        let deadline: Instant = Instant::now() + budget;

        while self.in_flight.load(Ordering::SeqCst) > 0 {
            tokio::select! {
                _ = self.drained.notified() => {}
                _ = sleep_until(deadline) => {
                    warn!(
                        "Scheduler stop: {} in-flight job(s) did not finish within budget",
                        self.in_flight.load(Ordering::SeqCst)
                    );
                    return;
                }
            }
        }

        info!("Scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_config(name: &str, internal: &str) -> JobConfig {
        serde_json::from_value(json!({
            "name": name,
            "type": "preDefined",
            "internalJobName": internal,
            "enabled": true
        }))
        .unwrap()
    }

    fn recording_func(log: Arc<Mutex<Vec<String>>>, tag: &str, fail: bool) -> JobFunc {
        let tag: String = tag.to_string();
        Arc::new(move |_context, _params| {
            let log = Arc::clone(&log);
            let tag = tag.clone();
            let fut: JobFuture = Box::pin(async move {
                log.lock().unwrap().push(tag.clone());
                if fail {
                    Err(anyhow!("boom"))
                } else {
                    Ok(())
                }
            });
            fut
        })
    }

    #[tokio::test]
    async fn init_jobs_run_sequentially_in_order() {
        let scheduler = SchedulerService::new();
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        scheduler.register_job_func("first", recording_func(Arc::clone(&log), "first", false));
        scheduler.register_job_func("second", recording_func(Arc::clone(&log), "second", false));

        let mut a = job_config("a", "first");
        a.init_job = true;
        let mut b = job_config("b", "second");
        b.init_job = true;

        scheduler.add_job(a).unwrap();
        scheduler.add_job(b).unwrap();

        scheduler.run_init_jobs().await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failing_init_job_aborts_startup() {
        let scheduler = SchedulerService::new();
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        scheduler.register_job_func("ok", recording_func(Arc::clone(&log), "ok", false));
        scheduler.register_job_func("bad", recording_func(Arc::clone(&log), "bad", true));

        let mut first = job_config("first", "bad");
        first.init_job = true;
        let mut second = job_config("second", "ok");
        second.init_job = true;

        scheduler.add_job(first).unwrap();
        scheduler.add_job(second).unwrap();

        assert!(scheduler.run_init_jobs().await.is_err());

        /* 실패 이후의 init 잡은 실행되지 않는다 */
        assert_eq!(*log.lock().unwrap(), vec!["bad"]);
        assert_eq!(scheduler.job_status().get("first").unwrap().error_count, 1);
    }

    #[tokio::test]
    async fn dependents_fire_after_parent_completes() {
        let scheduler = SchedulerService::new();
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        scheduler.register_job_func("parent", recording_func(Arc::clone(&log), "parent", false));
        scheduler.register_job_func("child", recording_func(Arc::clone(&log), "child", false));

        scheduler.add_job(job_config("p", "parent")).unwrap();
        let mut child = job_config("c", "child");
        child.depends_on = vec![String::from("p")];
        scheduler.add_job(child).unwrap();

        scheduler.trigger_job("p").unwrap();

        /* 비동기 팬아웃 완료 대기 */
        for _ in 0..50 {
            sleep(Duration::from_millis(10)).await;
            if log.lock().unwrap().len() == 2 {
                break;
            }
        }

        assert_eq!(*log.lock().unwrap(), vec!["parent", "child"]);
    }

    #[tokio::test]
    async fn concurrent_trigger_is_dropped() {
        let scheduler = SchedulerService::new();

        let slow_func: JobFunc = Arc::new(|_context, _params| {
            let fut: JobFuture = Box::pin(async {
                sleep(Duration::from_millis(150)).await;
                Ok(())
            });
            fut
        });
        scheduler.register_job_func("slow", slow_func);
        scheduler.add_job(job_config("slow-job", "slow")).unwrap();

        scheduler.trigger_job("slow-job").unwrap();
        sleep(Duration::from_millis(30)).await;
        scheduler.trigger_job("slow-job").unwrap();

        sleep(Duration::from_millis(300)).await;

        let state = scheduler.job_status().get("slow-job").unwrap().clone();
        assert_eq!(state.run_count, 1);
        assert!(!state.running);
    }

    #[tokio::test]
    async fn disabled_job_is_not_registered() {
        let scheduler = SchedulerService::new();

        let mut config = job_config("ghost", "nothing");
        config.enabled = false;
        scheduler.add_job(config).unwrap();

        assert!(scheduler.trigger_job("ghost").is_err());
    }

    #[tokio::test]
    async fn invalid_cron_is_rejected_at_add_time() {
        let scheduler = SchedulerService::new();

        let mut config = job_config("cronjob", "x");
        config.schedule = Some(ScheduleConfig {
            cron: Some(String::from("not a cron")),
            interval: None,
            initial_wait: None,
        });

        assert!(scheduler.add_job(config).is_err());
    }
}

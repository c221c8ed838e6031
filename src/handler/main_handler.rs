use std::fs;

use crate::common::*;

use crate::model::configs::bulk_tasks_config::*;
use crate::model::configs::config::*;
use crate::model::configs::csv_mapping::*;
use crate::model::configs::indices_config::*;
use crate::model::configs::job_config::*;
use crate::model::configs::tpw_config::*;
use crate::model::configs::write_pressure_config::*;
use crate::model::store::*;

use crate::repository::es_repository::*;

use crate::service::bulk_tasks_service::*;
use crate::service::csv_load_service::*;
use crate::service::endpoint_service::*;
use crate::service::indices_service::*;
use crate::service::ingest_service::*;
use crate::service::scheduler_service::*;
use crate::service::stats_service::*;
use crate::service::tpw_service::*;
use crate::service::write_pressure_service::*;

use crate::traits::service::bulk_tasks_service_trait::*;
use crate::traits::service::csv_load_service_trait::*;
use crate::traits::service::endpoint_service_trait::*;
use crate::traits::service::indices_service_trait::*;
use crate::traits::service::ingest_service_trait::*;
use crate::traits::service::stats_service_trait::*;
use crate::traits::service::tpw_service_trait::*;
use crate::traits::service::write_pressure_service_trait::*;

use crate::utils_modules::io_utils::*;

use crate::env_configuration::env_config::LOG_DIR;

#[doc = "잡 파라미터 Value 를 타입드 구조체로 디코딩 - null 은 빈 객체로 취급"]
fn decode_params<T: DeserializeOwned>(params: &Value) -> Result<T> {
    let value: Value = if params.is_null() {
        json!({})
    } else {
        params.clone()
    };

    serde_json::from_value(value)
        .map_err(|e| anyhow!("[main_handler->decode_params] invalid job parameters: {:?}", e))
}

/* 서비스 메서드 하나를 JobFunc 으로 감싸는 보일러플레이트 절약용 */
macro_rules! job_func {
    ($service:expr, $params_ty:ty, $method:ident) => {{
        let service = Arc::clone(&$service);
        let func: JobFunc = Arc::new(move |_context, params| {
            let service = Arc::clone(&service);
            let fut: JobFuture = Box::pin(async move {
                let params: $params_ty = decode_params(&params)?;
                service.$method(params).await
            });
            fut
        });
        func
    }};
}

#[doc = "서비스 조립 + 잡 등록 + 기동시퀀스(초기화/oneTime/스케줄) 담당 핸들러"]
pub struct MainHandler {
    scheduler: Arc<SchedulerService>,
    config: Arc<GlobalConfig>,
}

impl MainHandler {
    pub fn new(
        scheduler: Arc<SchedulerService>,
        store: Arc<MetricStore>,
        es_repo: Arc<EsRepositoryImpl>,
        config: Arc<GlobalConfig>,
    ) -> Self {
        let csv_service = Arc::new(CsvLoadServiceImpl::new(Arc::clone(&store)));
        let endpoint_service = Arc::new(EndpointServiceImpl::new(
            Arc::clone(&store),
            Arc::clone(&es_repo),
        ));
        let indices_service = Arc::new(IndicesServiceImpl::new(
            Arc::clone(&store),
            Arc::clone(&es_repo),
            config.history_for_indices,
        ));
        let ingest_service = Arc::new(IngestServiceImpl::new(Arc::clone(&store)));
        let stats_service = Arc::new(StatsServiceImpl::new(
            Arc::clone(&store),
            PathBuf::from(config.backup_of_stats_in_days()),
            config.history_of_stats_in_days,
        ));
        let tpw_service = Arc::new(TpwServiceImpl::new(
            Arc::clone(&store),
            Arc::clone(&es_repo),
            config.thread_pool_write_queue_data_sets,
        ));
        let write_pressure_service = Arc::new(WritePressureServiceImpl::new(
            Arc::clone(&store),
            PathBuf::from(LOG_DIR.as_str()).join("writePressure.log"),
        ));
        let bulk_tasks_service = Arc::new(BulkTasksServiceImpl::new(
            Arc::clone(&store),
            Arc::clone(&es_repo),
        ));

        scheduler.register_job_func(
            "loadFromMasterCSV",
            job_func!(csv_service, CsvLoadParams, load_master_csv),
        );
        scheduler.register_job_func(
            "updateAccessCredentials",
            job_func!(csv_service, CredentialLoadParams, update_access_credentials),
        );
        scheduler.register_job_func(
            "updateActiveEndpoint",
            job_func!(endpoint_service, ExcludeParams, update_active_endpoints),
        );
        scheduler.register_job_func(
            "updateCurrentMasterEndPoints",
            job_func!(endpoint_service, ExcludeParams, update_master_endpoints),
        );
        scheduler.register_job_func(
            "runCatIndices",
            job_func!(indices_service, CatIndicesParams, run_cat_indices),
        );
        scheduler.register_job_func(
            "analyseIngest",
            job_func!(ingest_service, ExcludeParams, analyse_ingest),
        );
        scheduler.register_job_func(
            "updateStatsByDay",
            job_func!(stats_service, ExcludeParams, update_stats_by_day),
        );
        scheduler.register_job_func(
            "getThreadPoolWriteQueue",
            job_func!(tpw_service, TpwQueueParams, get_thread_pool_write_queue),
        );
        scheduler.register_job_func(
            "checkForWritePressure",
            job_func!(
                write_pressure_service,
                WritePressureParams,
                check_for_write_pressure
            ),
        );
        scheduler.register_job_func(
            "getBulkWriteTasks",
            job_func!(bulk_tasks_service, BulkTasksParams, get_bulk_write_tasks),
        );

        info!("Predefined jobs registered");

        MainHandler { scheduler, config }
    }

    #[doc = "기동 시퀀스 - init 잡 직렬실행, oneTime 잡 처리, 스케줄 잡 로딩"]
    pub async fn run_startup_jobs(&self) -> Result<()> {
        let config_dir: PathBuf = PathBuf::from(self.config.config_dir());
        fs::create_dir_all(&config_dir).map_err(|e| {
            anyhow!(
                "[MainHandler->run_startup_jobs] create config dir {:?}: {:?}",
                config_dir,
                e
            )
        })?;

        self.load_and_run_initialization_jobs(&config_dir).await?;

        if let Err(e) = self.process_one_time_jobs(&config_dir).await {
            /* oneTime 실패는 기동을 막지 않는다 */
            error!("[MainHandler->run_startup_jobs] one-time jobs: {:?}", e);
        }

        self.load_scheduled_jobs(&config_dir)?;

        Ok(())
    }

    async fn load_and_run_initialization_jobs(&self, config_dir: &Path) -> Result<()> {
        info!("Loading initialization jobs...");

        let path: PathBuf = find_config_file(config_dir, "initialization_jobs").ok_or_else(|| {
            anyhow!(
                "[MainHandler->load_and_run_initialization_jobs] initialization_jobs file not found in {:?}",
                config_dir
            )
        })?;

        let file: JobConfigFile = read_config_from_file(&path)?;
        info!("Loaded {} initialization job(s)", file.jobs.len());

        for job in file.jobs {
            if !job.enabled {
                info!("Skipping disabled initialization job: {}", job.name);
                continue;
            }
            self.scheduler.add_job(job)?;
        }

        info!("Running initialization jobs...");
        self.scheduler.run_init_jobs().await
    }

    fn load_scheduled_jobs(&self, config_dir: &Path) -> Result<()> {
        info!("Loading scheduled jobs...");

        let path: PathBuf = find_config_file(config_dir, "scheduled_jobs").ok_or_else(|| {
            anyhow!(
                "[MainHandler->load_scheduled_jobs] scheduled_jobs file not found in {:?}",
                config_dir
            )
        })?;

        let file: JobConfigFile = read_config_from_file(&path)?;
        info!("Loaded {} scheduled job(s)", file.jobs.len());

        for job in file.jobs {
            if !job.enabled {
                info!("Skipping disabled scheduled job: {}", job.name);
                continue;
            }

            let name: String = job.name.clone();
            if let Err(e) = self.scheduler.add_job(job) {
                warn!("Failed to add scheduled job {}: {:?}", name, e);
                continue;
            }
            info!("Added scheduled job: {}", name);
        }

        Ok(())
    }

    #[doc = "oneTime 디렉토리의 잡 파일들을 한 번씩 실행하고 processedOneTime 으로 이동"]
    /// 파싱불가 파일은 `.unparsed`, 실행실패는 `.failed` suffix 가 붙는다.
    async fn process_one_time_jobs(&self, config_dir: &Path) -> Result<()> {
        let one_time_dir: PathBuf = config_dir.join("oneTime");
        let processed_dir: PathBuf = config_dir.join("processedOneTime");

        fs::create_dir_all(&one_time_dir)
            .map_err(|e| anyhow!("[MainHandler->process_one_time_jobs] {:?}", e))?;
        fs::create_dir_all(&processed_dir)
            .map_err(|e| anyhow!("[MainHandler->process_one_time_jobs] {:?}", e))?;

        let entries = fs::read_dir(&one_time_dir)
            .map_err(|e| anyhow!("[MainHandler->process_one_time_jobs] {:?}", e))?;

        let mut file_paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        file_paths.sort();

        info!("Found {} one-time job file(s)", file_paths.len());

        for file_path in file_paths {
            let file: JobConfigFile = match read_config_from_file(&file_path) {
                Ok(file) => file,
                Err(e) => {
                    warn!("Failed to parse one-time job {:?}: {:?}", file_path, e);
                    if let Err(e) = move_processed_job(&file_path, &processed_dir, "unparsed") {
                        error!("[MainHandler->process_one_time_jobs] {:?}", e);
                    }
                    continue;
                }
            };

            let mut any_failed: bool = false;

            for job in &file.jobs {
                if !job.enabled {
                    continue;
                }

                info!("Executing one-time job: {}", job.name);
                if let Err(e) = self.scheduler.run_job_config_once(job).await {
                    error!("One-time job {} failed: {:?}", job.name, e);
                    any_failed = true;
                }
            }

            let status: &str = if any_failed { "failed" } else { "success" };
            if let Err(e) = move_processed_job(&file_path, &processed_dir, status) {
                error!("[MainHandler->process_one_time_jobs] {:?}", e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler_with_config_dir(config_dir: &Path) -> (MainHandler, Arc<SchedulerService>) {
        let store = Arc::new(MetricStore::new());
        let es_repo = Arc::new(EsRepositoryImpl::new());
        let scheduler = SchedulerService::new();

        let config = Arc::new(GlobalConfig {
            config_dir: config_dir.to_string_lossy().to_string(),
            backup_of_stats_in_days: config_dir
                .join("statsInDays.json")
                .to_string_lossy()
                .to_string(),
            ..GlobalConfig::default()
        });

        let handler = MainHandler::new(
            Arc::clone(&scheduler),
            store,
            es_repo,
            config,
        );
        (handler, scheduler)
    }

    #[tokio::test]
    async fn one_time_job_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().to_path_buf();

        fs::write(config_dir.join("initialization_jobs.yaml"), "jobs: []").unwrap();
        fs::write(config_dir.join("scheduled_jobs.yaml"), "jobs: []").unwrap();

        let one_time = config_dir.join("oneTime");
        fs::create_dir_all(&one_time).unwrap();

        /* analyseIngest 는 빈 저장소에서도 성공한다 */
        fs::write(
            one_time.join("x.yaml"),
            "jobs:\n  - name: once\n    type: preDefined\n    internalJobName: analyseIngest\n    enabled: true\n",
        )
        .unwrap();
        fs::write(one_time.join("broken.yaml"), ": not yaml [").unwrap();

        let (handler, _scheduler) = handler_with_config_dir(&config_dir);
        handler.run_startup_jobs().await.unwrap();

        let processed = config_dir.join("processedOneTime");
        assert!(processed.join("x.yaml").is_file());
        assert!(processed.join("broken.yaml.unparsed").is_file());
        assert!(!one_time.join("x.yaml").exists());
    }

    #[tokio::test]
    async fn missing_init_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, _scheduler) = handler_with_config_dir(dir.path());

        assert!(handler.run_startup_jobs().await.is_err());
    }

    #[tokio::test]
    async fn unknown_internal_job_name_marks_file_failed() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().to_path_buf();

        fs::write(config_dir.join("initialization_jobs.yaml"), "jobs: []").unwrap();
        fs::write(config_dir.join("scheduled_jobs.yaml"), "jobs: []").unwrap();

        let one_time = config_dir.join("oneTime");
        fs::create_dir_all(&one_time).unwrap();
        fs::write(
            one_time.join("y.yaml"),
            "jobs:\n  - name: nope\n    type: preDefined\n    internalJobName: doesNotExist\n    enabled: true\n",
        )
        .unwrap();

        let (handler, _scheduler) = handler_with_config_dir(&config_dir);
        handler.run_startup_jobs().await.unwrap();

        assert!(config_dir
            .join("processedOneTime")
            .join("y.yaml.failed")
            .is_file());
    }
}

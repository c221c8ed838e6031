/*
Description : 멀티 클러스터 Elasticsearch 관측 서비스.
              주기적으로 각 클러스터를 폴링해서 인덱스/노드 지표의 롤링 히스토리를 유지하고
              색인속도, stale 인덱스, 쓰기압력 이벤트, bulk 태스크 핫스팟을 유도한 뒤
              읽기전용 REST API 로 제공한다.

History     : # [v.1.0.0] first create
              # [v.1.1.0] oneTime job 처리 추가
              # [v.1.2.0] 쓰기압력 탐지에 결측데이터 모드 3종 지원
              # [v.1.3.0] bulk 태스크 수집을 semaphore 기반 병렬처리로 변경
*/
mod common;
use common::*;

mod controller;
use controller::api_controller::*;

mod enums;
mod env_configuration;

mod handler;
use handler::main_handler::*;

mod model;
use model::configs::config::*;
use model::store::*;

mod repository;
use repository::es_repository::*;

mod service;
use service::scheduler_service::*;

mod traits;

mod utils_modules;
use utils_modules::logger_utils::*;

const SHUTDOWN_BUDGET: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenv().ok();

    /* 설정 오류는 기동실패 - 로거보다 먼저 읽는다 */
    let server_config: Arc<GlobalConfig> = get_server_config();

    /* 전역 로거설정 */
    set_global_logger(server_config.log_level());

    info!("Start Elastic Observer Program");
    info!(
        "Config: apiPort={}, historyForIndices={}, historyOfStatsInDays={}",
        server_config.api_port(),
        server_config.history_for_indices(),
        server_config.history_of_stats_in_days()
    );
    /* metrics exposition 은 이 빌드에 없다 - 포트는 설정 호환용으로만 읽는다 */
    debug!("metricsPort={} (exposition disabled)", server_config.metrics_port());

    let store: Arc<MetricStore> = Arc::new(MetricStore::new());
    let es_repo: Arc<EsRepositoryImpl> = Arc::new(EsRepositoryImpl::new());
    let scheduler: Arc<SchedulerService> = SchedulerService::new();

    /* Handler 의존주입 - 잡 함수 등록까지 여기서 끝난다 */
    let main_handler: MainHandler = MainHandler::new(
        Arc::clone(&scheduler),
        Arc::clone(&store),
        Arc::clone(&es_repo),
        Arc::clone(&server_config),
    );

    /* init 잡 직렬실행 -> oneTime 잡 -> 스케줄 잡 로딩 */
    if let Err(e) = main_handler.run_startup_jobs().await {
        error!("[Error][main()] Failed to run startup jobs: {:?}", e);
        panic!("{:?}", e);
    }

    scheduler.start();
    info!("Job scheduler started");

    /* 읽기전용 API 서버 */
    let context: ApiContext = ApiContext {
        store: Arc::clone(&store),
        scheduler: Arc::clone(&scheduler),
    };
    let app = build_router(context);

    let api_addr: String = format!("0.0.0.0:{}", server_config.api_port());
    let listener: tokio::net::TcpListener = match tokio::net::TcpListener::bind(&api_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("[Error][main()] Failed to bind API port {}: {:?}", api_addr, e);
            panic!("{:?}", e);
        }
    };
    info!("API server listening on {}", api_addr);

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = serve_result {
        error!("[Error][main()] API server error: {:?}", e);
    }

    info!("Shutdown signal received, stopping gracefully...");
    scheduler.stop(SHUTDOWN_BUDGET).await;
    info!("Elastic Observer stopped");
}

#[doc = "SIGINT / SIGTERM 대기"]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("[Error][shutdown_signal()] Failed to listen for SIGINT: {:?}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("[Error][shutdown_signal()] Failed to listen for SIGTERM: {:?}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

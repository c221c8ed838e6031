use crate::common::*;

use crate::env_configuration::env_config::LOG_DIR;

/* 핸들이 drop 되면 파일 로깅이 멈추므로 프로세스 수명 동안 붙잡아둔다 */
static LOGGER_HANDLE: once_lazy<Mutex<Option<flexi_logger::LoggerHandle>>> =
    once_lazy::new(|| Mutex::new(None));

#[doc = "로그 포멧 지정 함수"]
fn console_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &Record,
) -> std::result::Result<(), std::io::Error> {
    write!(
        w,
        "[{}] [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.args()
    )
}

#[doc = "전역 로거설정 함수 - 파일로그 + 일자별 로테이션"]
/// # Arguments
/// * `log_level` - 설정파일에서 읽은 로그레벨 (debug/info/warn/error)
pub fn set_global_logger(log_level: &str) {
    let log_dir: &str = LOG_DIR.as_str();

    let handle: flexi_logger::LoggerHandle = Logger::try_with_str(log_level)
        .unwrap_or_else(|e| panic!("[Error][set_global_logger()] Invalid log level: {:?}", e))
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename("application"),
        )
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(30),
        )
        .duplicate_to_stdout(Duplicate::All)
        .format(console_format)
        .start()
        .unwrap_or_else(|e| panic!("[Error][set_global_logger()] Logger init failed: {:?}", e));

    match LOGGER_HANDLE.lock() {
        Ok(mut slot) => *slot = Some(handle),
        Err(poisoned) => *poisoned.into_inner() = Some(handle),
    }
}

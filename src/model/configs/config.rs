use crate::common::*;

use crate::utils_modules::io_utils::*;

use crate::env_configuration::env_config::*;

static SERVER_CONFIG: once_lazy<Arc<GlobalConfig>> =
    once_lazy::new(|| Arc::new(GlobalConfig::load()));

#[doc = "전역 설정 인스턴스"]
pub fn get_server_config() -> Arc<GlobalConfig> {
    Arc::clone(&SERVER_CONFIG)
}

#[doc = "mTLS 기본 인증서 경로"]
#[derive(Debug, Clone, Default, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase", default)]
pub struct CertConfig {
    pub cert: String,
    pub key: String,
    pub ca_cert: String,
}

#[doc = "서비스 전역 설정 - SERVER_CONFIG_PATH 의 yaml/json 파일"]
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    pub log_level: String,
    pub metrics_port: u16,
    pub api_port: u16,
    pub history_for_indices: usize,
    pub history_of_stats_in_days: usize,
    pub backup_of_stats_in_days: String,
    pub thread_pool_write_queue_data_sets: usize,
    #[serde(rename = "out_dir")]
    pub out_dir: String,
    #[serde(rename = "config_dir")]
    pub config_dir: String,
    pub cert: CertConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            log_level: String::from("info"),
            metrics_port: 9091,
            api_port: 9092,
            history_for_indices: 20,
            history_of_stats_in_days: 30,
            backup_of_stats_in_days: String::from("./data/backup/statsInDays.json"),
            thread_pool_write_queue_data_sets: 6,
            out_dir: String::from("./outputs"),
            config_dir: String::from("./configs"),
            cert: CertConfig::default(),
        }
    }
}

impl GlobalConfig {
    #[doc = "설정파일 로딩 - 설정 오류는 기동실패"]
    fn load() -> Self {
        let config_path: PathBuf = PathBuf::from(SERVER_CONFIG_PATH.as_str());

        match read_config_from_file::<GlobalConfig>(&config_path) {
            Ok(config) => config,
            Err(e) => {
                error!(
                    "[GlobalConfig->load] Failed to load server configuration. : {:?}",
                    e
                );
                panic!(
                    "[GlobalConfig->load] Failed to load server configuration. : {:?}",
                    e
                );
            }
        }
    }
}

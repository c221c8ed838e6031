use crate::common::*;

#[doc = "잡 스케줄 - cron 표현식 또는 고정 interval 중 하나"]
#[derive(Debug, Clone, Default, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleConfig {
    pub cron: Option<String>,
    pub interval: Option<String>,
    pub initial_wait: Option<String>,
}

fn default_job_type() -> String {
    String::from("preDefined")
}

#[doc = "잡 한 개의 설정. parameters 는 각 잡의 타입드 파라미터 구조체로 디코딩된다."]
#[derive(Debug, Clone, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    pub name: String,
    #[serde(rename = "type", default = "default_job_type")]
    pub job_type: String, /* preDefined | shell | api */
    #[serde(default)]
    pub internal_job_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub init_job: bool,
    #[serde(default)]
    pub exclude_clusters: Vec<String>,
    #[serde(default)]
    pub parameters: Value,
}

#[doc = "잡 설정파일의 최상위 형태 - { jobs: [...] }"]
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfigFile {
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

use crate::common::*;

#[doc = "_tasks?detailed=true 응답의 타입드 모델 - bulk 집계에 필요한 필드만 받는다"]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TasksResponse {
    #[serde(default)]
    pub nodes: HashMap<String, TasksNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TasksNode {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub tasks: HashMap<String, TaskEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskEntry {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub running_time_in_nanos: f64,
}

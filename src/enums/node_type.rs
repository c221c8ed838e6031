use crate::common::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Master,
    Data,
    Kibana,
    Logstash,
    Ml,
}

#[doc = "인벤토리의 role 문자열에서 노드 타입 집합을 추출해주는 함수"]
/// # Arguments
/// * `type_str` - CSV 에서 읽은 role 문자열 (예: "master,data")
///
/// # Returns
/// * Vec<NodeType>
pub fn get_node_types(type_str: &str) -> Vec<NodeType> {
    let lowered: String = type_str.to_lowercase();
    let mut types: Vec<NodeType> = Vec::new();

    if lowered.contains("master") {
        types.push(NodeType::Master);
    }
    if lowered.contains("data") {
        types.push(NodeType::Data);
    }
    if lowered.contains("logstash") {
        types.push(NodeType::Logstash);
    }
    if lowered.contains("kibana") {
        types.push(NodeType::Kibana);
    }
    if lowered.contains("ml") || lowered.contains("machine") {
        types.push(NodeType::Ml);
    }

    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_types_from_role_string() {
        assert_eq!(
            get_node_types("Master,Data"),
            vec![NodeType::Master, NodeType::Data]
        );
        assert_eq!(get_node_types("machine learning"), vec![NodeType::Ml]);
        assert!(get_node_types("coordinating").is_empty());
    }
}

use crate::common::*;

use crate::enums::node_type::*;

#[doc = "모니터링 대상 클러스터의 노드 한 대"]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub host_name: String,
    pub ip_address: String,
    pub port: String,
    #[serde(rename = "type")]
    pub node_types: Vec<NodeType>,
    pub zone: String,
    pub kibana_port: String,
    pub logstash_port: String,
    pub data_center: String,
    pub rack: String,
    pub node_tier: String, /* hot, warm, cold */
}

impl Node {
    pub fn with_default_ports() -> Self {
        Node {
            port: String::from("9200"),
            kibana_port: String::from("5601"),
            ..Node::default()
        }
    }

    pub fn has_type(&self, node_type: NodeType) -> bool {
        self.node_types.contains(&node_type)
    }
}

#[doc = "클러스터 접근 인증정보 저장소 - preferred: 1=apikey, 2=basic, 3=mtls"]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase", default)]
pub struct AccessCred {
    pub preferred: u8,
    pub api_key: String,
    pub user_id: String,
    pub password: String,
    pub client_cert: String,
    pub client_key: String,
    pub ca_cert: String,
}

#[doc = "요청시점에 실제로 사용할 인증 방식"]
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    ApiKey(String),
    Basic { user: String, pass: String },
    Mtls { cert: String, key: String, ca: String },
    None,
}

impl AccessCred {
    fn api_key_credential(&self) -> Option<Credential> {
        if self.api_key.is_empty() {
            None
        } else {
            Some(Credential::ApiKey(self.api_key.clone()))
        }
    }

    fn basic_credential(&self) -> Option<Credential> {
        if self.user_id.is_empty() || self.password.is_empty() {
            None
        } else {
            Some(Credential::Basic {
                user: self.user_id.clone(),
                pass: self.password.clone(),
            })
        }
    }

    fn mtls_credential(&self) -> Option<Credential> {
        if self.client_cert.is_empty() || self.client_key.is_empty() {
            None
        } else {
            Some(Credential::Mtls {
                cert: self.client_cert.clone(),
                key: self.client_key.clone(),
                ca: self.ca_cert.clone(),
            })
        }
    }

    #[doc = "preferred 태그 우선으로 인증방식을 고르고, 없으면 채워진 아무 방식으로 폴백"]
    pub fn resolve(&self) -> Credential {
        let preferred: Option<Credential> = match self.preferred {
            1 => self.api_key_credential(),
            2 => self.basic_credential(),
            3 => self.mtls_credential(),
            _ => None,
        };

        if let Some(credential) = preferred {
            return credential;
        }

        self.api_key_credential()
            .or_else(|| self.basic_credential())
            .or_else(|| self.mtls_credential())
            .unwrap_or(Credential::None)
    }
}

#[doc = "클러스터의 고정 식별자 + 가변 운영상태"]
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterData {
    pub cluster_name: String,
    pub cluster_uuid: String,
    pub current_endpoint: String,
    pub insecure_tls: bool,
    pub active: bool,
    pub zone_identifier: String,
    pub cluster_san: Vec<String>,
    pub active_endpoint: Option<String>,
    pub kibana_san: Vec<String>,
    pub owner: String,
    pub env: String,
    pub cluster_port: String,
    pub kibana_port: String,
    pub access_cred: AccessCred,
    pub nodes: Vec<Node>,
}

impl Default for ClusterData {
    fn default() -> Self {
        ClusterData {
            cluster_name: String::new(),
            cluster_uuid: String::new(),
            current_endpoint: String::new(),
            insecure_tls: false,
            active: true,
            zone_identifier: String::new(),
            cluster_san: Vec::new(),
            active_endpoint: None,
            kibana_san: Vec::new(),
            owner: String::new(),
            env: String::new(),
            cluster_port: String::from("9200"),
            kibana_port: String::from("5601"),
            access_cred: AccessCred::default(),
            nodes: Vec::new(),
        }
    }
}

impl ClusterData {
    pub fn named(cluster_name: &str) -> Self {
        ClusterData {
            cluster_name: cluster_name.to_string(),
            ..ClusterData::default()
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.access_cred.preferred != 0
    }

    pub fn node_zone(&self, host_name: &str) -> String {
        self.nodes
            .iter()
            .find(|node| node.host_name == host_name)
            .map(|node| node.zone.clone())
            .unwrap_or_default()
    }
}

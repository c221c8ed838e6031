use crate::common::*;

use crate::model::cluster::*;
use crate::model::configs::indices_config::*;
use crate::model::store::*;

use crate::enums::node_type::*;

use crate::traits::repository::es_repository_trait::*;
use crate::traits::service::endpoint_service_trait::*;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const MASTER_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

#[doc = "클러스터별 ActiveEndpoint / MasterEndpoint 선출 서비스"]
#[derive(Debug, new)]
pub struct EndpointServiceImpl<R: EsRepository> {
    store: Arc<MetricStore>,
    es_repo: Arc<R>,
}

impl<R: EsRepository + Sync + Send> EndpointServiceImpl<R> {
    #[doc = "후보 엔드포인트 목록 - ClusterSAN, master 노드, kibana 노드, 나머지 노드 순"]
    fn candidate_endpoints(cluster: &ClusterData) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();

        for endpoint in &cluster.cluster_san {
            if !endpoint.is_empty() {
                candidates.push(endpoint.clone());
            }
        }

        for node in &cluster.nodes {
            if node.has_type(NodeType::Master) {
                candidates.push(format!("https://{}:{}", node.host_name, node.port));
            }
        }

        for node in &cluster.nodes {
            if node.has_type(NodeType::Kibana) {
                candidates.push(format!("https://{}:{}", node.host_name, node.kibana_port));
            }
        }

        for node in &cluster.nodes {
            if !node.has_type(NodeType::Master) && !node.has_type(NodeType::Kibana) {
                candidates.push(format!("https://{}:{}", node.host_name, node.port));
            }
        }

        candidates
    }

    #[doc = "첫 번째로 도달 가능한 후보를 선출 - 200 외에 401 도 도달 증거로 인정"]
    async fn elect_endpoint(&self, cluster: &ClusterData) -> Option<String> {
        for candidate in Self::candidate_endpoints(cluster) {
            match self.es_repo.probe(cluster, &candidate, PROBE_TIMEOUT).await {
                Ok(200) | Ok(401) => return Some(candidate),
                Ok(status) => {
                    debug!(
                        "[EndpointServiceImpl->elect_endpoint] {}: {} answered {}",
                        cluster.cluster_name, candidate, status
                    );
                }
                Err(e) => {
                    debug!(
                        "[EndpointServiceImpl->elect_endpoint] {}: {} unreachable: {:?}",
                        cluster.cluster_name, candidate, e
                    );
                }
            }
        }
        None
    }

    #[doc = "_cat/nodes?h=n,m 에서 '*' 행의 호스트를 찾아 master endpoint 를 만들어주는 함수"]
    async fn resolve_master_endpoint(&self, cluster: &ClusterData) -> Result<String> {
        let active: &str = cluster
            .active_endpoint
            .as_deref()
            .ok_or_else(|| {
                anyhow!(
                    "[EndpointServiceImpl->resolve_master_endpoint] {} has no active endpoint",
                    cluster.cluster_name
                )
            })?;

        let url: String = format!("{}/_cat/nodes?h=n,m", active.trim_end_matches('/'));

        let body: String = self
            .es_repo
            .get_text(cluster, &url, MASTER_QUERY_TIMEOUT)
            .await
            .map_err(|e| {
                anyhow!(
                    "[EndpointServiceImpl->resolve_master_endpoint] {}: {:?}",
                    cluster.cluster_name,
                    e
                )
            })?;

        for line in body.trim().lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() >= 2 && fields[1] == "*" {
                return Ok(format!(
                    "https://{}:{}/",
                    fields[0], cluster.cluster_port
                ));
            }
        }

        Err(anyhow!(
            "[EndpointServiceImpl->resolve_master_endpoint] {}: no elected master in _cat/nodes output",
            cluster.cluster_name
        ))
    }
}

#[async_trait]
impl<R: EsRepository + Sync + Send> EndpointService for EndpointServiceImpl<R> {
    #[doc = "모든 클러스터의 ActiveEndpoint 재선출"]
    async fn update_active_endpoints(&self, params: ExcludeParams) -> Result<()> {
        info!("[updateActiveEndpoint] Starting endpoint validation job");

        let clusters: Vec<ClusterData> = self.store.clusters_snapshot();

        let mut updated: usize = 0;
        let mut failed: usize = 0;

        for cluster in clusters {
            if params.exclude_clusters.contains(&cluster.cluster_name) {
                info!(
                    "[updateActiveEndpoint] Skipping excluded cluster: {}",
                    cluster.cluster_name
                );
                continue;
            }

            match self.elect_endpoint(&cluster).await {
                Some(endpoint) => {
                    info!(
                        "[updateActiveEndpoint] Cluster {}: Active endpoint set to {}",
                        cluster.cluster_name, endpoint
                    );
                    self.store
                        .set_active_endpoint(&cluster.cluster_name, Some(endpoint));
                    updated += 1;
                }
                None => {
                    warn!(
                        "[updateActiveEndpoint] Cluster {}: Failed to find active endpoint",
                        cluster.cluster_name
                    );
                    self.store.set_active_endpoint(&cluster.cluster_name, None);
                    failed += 1;
                }
            }
        }

        info!(
            "[updateActiveEndpoint] Completed: {} endpoints updated, {} failed",
            updated, failed
        );

        Ok(())
    }

    #[doc = "ActiveEndpoint 가 있는 클러스터들의 현재 master endpoint 갱신"]
    async fn update_master_endpoints(&self, params: ExcludeParams) -> Result<()> {
        info!("[updateCurrentMasterEndPoints] Starting master endpoints update job");

        let clusters: Vec<ClusterData> = self
            .store
            .clusters_snapshot()
            .into_iter()
            .filter(|cluster| cluster.active_endpoint.is_some())
            .filter(|cluster| !params.exclude_clusters.contains(&cluster.cluster_name))
            .collect();

        info!(
            "[updateCurrentMasterEndPoints] Processing {} clusters with active endpoints",
            clusters.len()
        );

        let mut succeeded: usize = 0;
        let mut failed: usize = 0;

        for cluster in clusters {
            match self.resolve_master_endpoint(&cluster).await {
                Ok(endpoint) => {
                    info!(
                        "[updateCurrentMasterEndPoints] Updated master endpoint for cluster {}: {}",
                        cluster.cluster_name, endpoint
                    );
                    self.store
                        .set_master_endpoint(&cluster.cluster_name, endpoint);
                    succeeded += 1;
                }
                Err(e) => {
                    warn!("[updateCurrentMasterEndPoints] {:?}", e);
                    failed += 1;
                }
            }
        }

        info!(
            "[updateCurrentMasterEndPoints] Completed: {} succeeded, {} failed",
            succeeded, failed
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::enums::node_type::NodeType;

    struct ScriptedRepo {
        /* url -> 반환 상태코드 (없으면 transport 실패 취급) */
        probe_results: HashMap<String, u16>,
        cat_nodes_body: String,
    }

    #[async_trait]
    impl EsRepository for ScriptedRepo {
        async fn probe(
            &self,
            _cluster: &ClusterData,
            url: &str,
            _timeout: Duration,
        ) -> std::result::Result<u16, EsClientError> {
            match self.probe_results.get(url) {
                Some(status) => Ok(*status),
                None => Err(EsClientError::Decode(String::from("unreachable"))),
            }
        }

        async fn get_text(
            &self,
            _cluster: &ClusterData,
            _url: &str,
            _timeout: Duration,
        ) -> std::result::Result<String, EsClientError> {
            Ok(self.cat_nodes_body.clone())
        }

        async fn get_json<T: DeserializeOwned + Send + 'static>(
            &self,
            _cluster: &ClusterData,
            _url: &str,
            _timeout: Duration,
        ) -> std::result::Result<T, EsClientError> {
            Err(EsClientError::Decode(String::from("not scripted")))
        }

        async fn post_monitoring_json<T: DeserializeOwned + Send + 'static>(
            &self,
            _endpoint: &str,
            _api_key: &str,
            _insecure_tls: bool,
            _body: String,
            _timeout: Duration,
        ) -> std::result::Result<T, EsClientError> {
            Err(EsClientError::Decode(String::from("not scripted")))
        }
    }

    fn cluster_with_nodes() -> ClusterData {
        let mut cluster = ClusterData::named("es01");
        cluster.cluster_san = vec![String::from("https://san.example:9200")];

        let mut master = Node::with_default_ports();
        master.host_name = String::from("master-1");
        master.node_types = vec![NodeType::Master];

        let mut data = Node::with_default_ports();
        data.host_name = String::from("data-1");
        data.node_types = vec![NodeType::Data];

        cluster.nodes = vec![master, data];
        cluster
    }

    #[test]
    fn candidate_order_is_san_master_kibana_rest() {
        let cluster = cluster_with_nodes();
        let candidates = EndpointServiceImpl::<ScriptedRepo>::candidate_endpoints(&cluster);

        assert_eq!(
            candidates,
            vec![
                "https://san.example:9200",
                "https://master-1:9200",
                "https://data-1:9200",
            ]
        );
    }

    #[tokio::test]
    async fn unauthorized_counts_as_reachable() {
        let cluster = cluster_with_nodes();

        let store = Arc::new(MetricStore::new());
        store.upsert_cluster_with("es01", |c| *c = cluster.clone());

        let mut probe_results = HashMap::new();
        probe_results.insert(String::from("https://master-1:9200"), 401_u16);

        let repo = Arc::new(ScriptedRepo {
            probe_results,
            cat_nodes_body: String::new(),
        });

        let service = EndpointServiceImpl::new(Arc::clone(&store), repo);
        service
            .update_active_endpoints(ExcludeParams::default())
            .await
            .unwrap();

        assert_eq!(
            store.cluster("es01").unwrap().active_endpoint.as_deref(),
            Some("https://master-1:9200")
        );
    }

    #[tokio::test]
    async fn master_row_with_star_wins() {
        let mut cluster = cluster_with_nodes();
        cluster.active_endpoint = Some(String::from("https://master-1:9200/"));

        let store = Arc::new(MetricStore::new());
        store.upsert_cluster_with("es01", |c| *c = cluster.clone());

        let repo = Arc::new(ScriptedRepo {
            probe_results: HashMap::new(),
            cat_nodes_body: String::from("data-1 -\nmaster-1 *\n"),
        });

        let service = EndpointServiceImpl::new(Arc::clone(&store), repo);
        service
            .update_master_endpoints(ExcludeParams::default())
            .await
            .unwrap();

        assert_eq!(
            store.master_endpoint("es01").as_deref(),
            Some("https://master-1:9200/")
        );
    }
}

use crate::common::*;

use crate::model::cluster::*;
use crate::model::configs::csv_mapping::*;
use crate::model::store::*;

use crate::utils_modules::csv_utils::*;

use crate::enums::node_type::*;

use crate::traits::service::csv_load_service_trait::*;

#[doc = "인벤토리 CSV 를 상태저장소의 클러스터/노드로 적재하는 서비스"]
#[derive(Debug, new)]
pub struct CsvLoadServiceImpl {
    store: Arc<MetricStore>,
}

impl CsvLoadServiceImpl {
    fn cluster_name_from_row(row: &HashMap<String, String>, mapping: &InputMapping) -> String {
        let column: &str = match mapping.straight.get("clusterName") {
            Some(column) => column.as_str(),
            None => return String::new(),
        };
        get_value(row, column).trim().to_string()
    }

    fn apply_constants(cluster: &mut ClusterData, mapping: &InputMapping) {
        for (field, value) in &mapping.constant {
            match field.as_str() {
                "insecureTLS" => {
                    if let Some(flag) = value.as_bool() {
                        cluster.insecure_tls = flag;
                    }
                }
                "clusterPort" => {
                    if let Some(port) = value.as_str() {
                        cluster.cluster_port = port.to_string();
                    }
                }
                _ => {}
            }
        }
    }

    fn apply_straight_cluster(
        cluster: &mut ClusterData,
        row: &HashMap<String, String>,
        mapping: &InputMapping,
    ) {
        for (field, column) in &mapping.straight {
            let value: &str = get_value(row, column);
            if value.is_empty() {
                continue;
            }

            match field.as_str() {
                "clusterName" => {} /* 키로 이미 사용 */
                "clusterSAN" => cluster.cluster_san = split_string(value, ","),
                "kibanaSAN" => cluster.kibana_san = split_string(value, ","),
                "owner" => cluster.owner = value.to_string(),
                "clusterUUID" => cluster.cluster_uuid = value.to_string(),
                "currentEndpoint" => cluster.current_endpoint = value.to_string(),
                "zoneIdentifier" => cluster.zone_identifier = value.to_string(),
                _ => {}
            }
        }
    }

    fn apply_derived_cluster(
        cluster: &mut ClusterData,
        row: &HashMap<String, String>,
        mapping: &InputMapping,
    ) {
        for derived in &mapping.derived {
            let value: &str = get_value(row, &derived.column);
            if value.is_empty() {
                continue;
            }

            let outcome: TransformOutcome = match apply_transformation(
                value,
                &derived.function,
                &derived.arg,
                derived.ret_val.as_ref(),
            ) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("[CsvLoadServiceImpl->apply_derived_cluster] {:?}", e);
                    TransformOutcome::Text(value.to_string())
                }
            };

            match (derived.field.as_str(), outcome) {
                ("active", TransformOutcome::Flag(flag)) => cluster.active = flag,
                ("env", TransformOutcome::Text(env)) => cluster.env = env,
                _ => {}
            }
        }
    }

    fn apply_straight_node(
        node: &mut Node,
        row: &HashMap<String, String>,
        mapping: &InputMapping,
    ) {
        for (field, column) in &mapping.straight {
            let value: &str = get_value(row, column);
            if value.is_empty() {
                continue;
            }

            match field.as_str() {
                "hostName" => node.host_name = value.to_string(),
                "port" => node.port = value.to_string(),
                "kibanaPort" => node.kibana_port = value.to_string(),
                "logstashPort" => node.logstash_port = value.to_string(),
                "ipAddress" => node.ip_address = value.to_string(),
                "zone" => node.zone = value.to_string(),
                "dataCenter" => node.data_center = value.to_string(),
                "rack" => node.rack = value.to_string(),
                "nodeTier" => node.node_tier = value.to_string(),
                _ => {}
            }
        }
    }

    fn apply_derived_node(node: &mut Node, row: &HashMap<String, String>, mapping: &InputMapping) {
        for derived in &mapping.derived {
            let value: &str = get_value(row, &derived.column);
            if value.is_empty() {
                continue;
            }

            let outcome: TransformOutcome = match apply_transformation(
                value,
                &derived.function,
                &derived.arg,
                derived.ret_val.as_ref(),
            ) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("[CsvLoadServiceImpl->apply_derived_node] {:?}", e);
                    TransformOutcome::Text(value.to_string())
                }
            };

            if derived.field == "type" {
                match outcome {
                    TransformOutcome::List(parts) => {
                        node.node_types = parts
                            .iter()
                            .flat_map(|part| get_node_types(part))
                            .collect();
                    }
                    TransformOutcome::Text(text) => node.node_types = get_node_types(&text),
                    _ => {}
                }
            }
        }
    }
}

#[async_trait]
impl CsvLoadService for CsvLoadServiceImpl {
    #[doc = "클러스터 인벤토리 적재 - 행 단위로 get-or-create 후 매핑 적용, 노드는 hostName 기준 중복제거"]
    async fn load_master_csv(&self, params: CsvLoadParams) -> Result<()> {
        info!("[loadFromMasterCSV] Starting CSV load job");

        if params.csv_file_name.is_empty() {
            return Err(anyhow!(
                "[CsvLoadServiceImpl->load_master_csv] csv_fileName parameter is required"
            ));
        }

        if let Some(delete_file) = &params.csv_delete_file_name {
            /* 삭제 인벤토리는 아직 소비하지 않는다 - 설정 호환용으로만 받는다 */
            debug!("[loadFromMasterCSV] csv_deleteFileName accepted: {}", delete_file);
        }

        let stream: CsvRowStream = CsvRowStream::from_path(Path::new(&params.csv_file_name))?;
        info!(
            "[loadFromMasterCSV] Parsed {} rows from CSV",
            stream.rows().len()
        );

        let mapping: &InputMapping = &params.input_mapping;

        let mut added_clusters: usize = 0;
        let mut added_nodes: usize = 0;
        let mut skipped_rows: usize = 0;

        for (row_idx, row) in stream.rows().iter().enumerate() {
            let cluster_name: String = Self::cluster_name_from_row(row, mapping);
            if cluster_name.is_empty() {
                warn!(
                    "[loadFromMasterCSV] Row {}: Empty cluster name, skipping",
                    row_idx + 1
                );
                skipped_rows += 1;
                continue;
            }

            let mut node: Node = Node::with_default_ports();
            Self::apply_straight_node(&mut node, row, mapping);
            Self::apply_derived_node(&mut node, row, mapping);

            let mut node_added: bool = false;
            let created: bool = self.store.upsert_cluster_with(&cluster_name, |cluster| {
                Self::apply_constants(cluster, mapping);
                Self::apply_straight_cluster(cluster, row, mapping);
                Self::apply_derived_cluster(cluster, row, mapping);

                let duplicate: bool = cluster
                    .nodes
                    .iter()
                    .any(|existing| existing.host_name == node.host_name);

                if !duplicate && !node.host_name.is_empty() {
                    cluster.nodes.push(node.clone());
                    node_added = true;
                }
            });

            if created {
                added_clusters += 1;
                info!("[loadFromMasterCSV] Created new cluster: {}", cluster_name);
            }

            if node_added {
                added_nodes += 1;
            } else {
                skipped_rows += 1;
            }
        }

        info!(
            "[loadFromMasterCSV] Completed: Added {} clusters, {} nodes. Skipped {} rows",
            added_clusters, added_nodes, skipped_rows
        );

        Ok(())
    }

    #[doc = "인증 인벤토리 적재 - 이미 등록된 클러스터의 AccessCred 만 갱신"]
    async fn update_access_credentials(&self, params: CredentialLoadParams) -> Result<()> {
        info!("[updateAccessCredentials] Starting credentials update job");

        if params.csv_file_name.is_empty() {
            return Err(anyhow!(
                "[CsvLoadServiceImpl->update_access_credentials] csv_fileName parameter is required"
            ));
        }

        let stream: CsvRowStream = CsvRowStream::from_path(Path::new(&params.csv_file_name))?;
        info!(
            "[updateAccessCredentials] Parsed {} rows from CSV",
            stream.rows().len()
        );

        let mut updated: usize = 0;
        let mut not_found: usize = 0;
        let mut skipped: usize = 0;

        for (row_idx, row) in stream.rows().iter().enumerate() {
            let cluster_name: &str = get_value(row, "ClusterName").trim();
            if cluster_name.is_empty() {
                warn!(
                    "[updateAccessCredentials] Row {}: Empty cluster name, skipping",
                    row_idx + 1
                );
                skipped += 1;
                continue;
            }

            let found: bool = self.store.update_cluster(cluster_name, |cluster| {
                let cred: &mut AccessCred = &mut cluster.access_cred;

                /* 컬럼 이름의 오타(PrefferedAccess)는 파일 호환 때문에 그대로 둔다 */
                let preferred: &str = get_value(row, "PrefferedAccess").trim();
                if !preferred.is_empty() {
                    if let Ok(value) = preferred.parse::<u8>() {
                        cred.preferred = value;
                    }
                }

                let assign_if_present = |column: &str, target: &mut String| {
                    let value: &str = get_value(row, column).trim();
                    if !value.is_empty() {
                        *target = value.to_string();
                    }
                };

                assign_if_present("APIKey", &mut cred.api_key);
                assign_if_present("UserID", &mut cred.user_id);
                assign_if_present("Password", &mut cred.password);
                assign_if_present("ClientCert", &mut cred.client_cert);
                assign_if_present("ClientKey", &mut cred.client_key);
                assign_if_present("Cacert", &mut cred.ca_cert);
            });

            if found {
                updated += 1;
            } else {
                warn!(
                    "[updateAccessCredentials] Row {}: Cluster {} not found, skipping",
                    row_idx + 1,
                    cluster_name
                );
                not_found += 1;
            }
        }

        info!(
            "[updateAccessCredentials] Completed: {} clusters updated, {} not found, {} skipped",
            updated, not_found, skipped
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn write_temp_csv(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        (dir, path)
    }

    fn inventory_mapping() -> InputMapping {
        serde_json::from_value(json!({
            "constant": { "insecureTLS": true },
            "straight": {
                "clusterName": "Cluster",
                "clusterUUID": "UUID",
                "hostName": "Host",
                "zone": "Zone"
            },
            "derived": [
                { "field": "type", "column": "Roles", "function": "splitString", "arg": ";" },
                {
                    "field": "env",
                    "column": "Env",
                    "function": "strStringCompare",
                    "arg": [["prod", "production"], ["dev", "sandbox"]],
                    "retVal": ["prod", "dev"]
                }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn rows_become_clusters_and_deduped_nodes() {
        let csv = "\
Cluster,UUID,Host,Zone,Roles,Env
es01,uuid-1,host-a,z1,master;data,production
es01,uuid-1,host-b,z2,data,production
es01,uuid-1,host-a,z1,master;data,production
es02,uuid-2,host-c,z1,master,sandbox
";
        let (_dir, path) = write_temp_csv(csv);

        let store = Arc::new(MetricStore::new());
        let service = CsvLoadServiceImpl::new(Arc::clone(&store));

        let params = CsvLoadParams {
            csv_file_name: path.to_string_lossy().to_string(),
            csv_delete_file_name: None,
            input_mapping: inventory_mapping(),
        };

        service.load_master_csv(params).await.unwrap();

        assert_eq!(store.cluster_names(), vec!["es01", "es02"]);

        let es01 = store.cluster("es01").unwrap();
        assert_eq!(es01.nodes.len(), 2); /* host-a 중복행 제거 */
        assert!(es01.insecure_tls);
        assert_eq!(es01.env, "prod");
        assert_eq!(es01.cluster_uuid, "uuid-1");
        assert!(es01.nodes[0].has_type(NodeType::Master));

        let es02 = store.cluster("es02").unwrap();
        assert_eq!(es02.env, "dev");
        assert_eq!(es02.nodes[0].port, "9200");
    }

    #[tokio::test]
    async fn credentials_update_only_known_clusters() {
        let csv = "\
ClusterName,PrefferedAccess,APIKey,UserID,Password
es01,2,,elastic,changeme
ghost,1,abc,,
";
        let (_dir, path) = write_temp_csv(csv);

        let store = Arc::new(MetricStore::new());
        store.upsert_cluster_with("es01", |_| {});

        let service = CsvLoadServiceImpl::new(Arc::clone(&store));
        service
            .update_access_credentials(CredentialLoadParams {
                csv_file_name: path.to_string_lossy().to_string(),
            })
            .await
            .unwrap();

        let cred = store.cluster("es01").unwrap().access_cred;
        assert_eq!(cred.preferred, 2);
        assert_eq!(cred.user_id, "elastic");
        assert_eq!(cred.password, "changeme");

        assert!(store.cluster("ghost").is_none());
    }
}


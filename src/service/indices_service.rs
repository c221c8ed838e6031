use crate::common::*;

use crate::model::cluster::*;
use crate::model::configs::indices_config::*;
use crate::model::elastic_dto::cat_index_row::*;
use crate::model::index_info::*;
use crate::model::store::*;

use crate::utils_modules::parse_utils::*;
use crate::utils_modules::time_utils::*;

use crate::enums::index_health::*;

use crate::traits::repository::es_repository_trait::*;
use crate::traits::service::indices_service_trait::*;

const CAT_INDICES_TIMEOUT: Duration = Duration::from_secs(30);

const CAT_INDICES_PATH: &str = "/_cat/indices?format=json&pretty&h=health,status,docs.count,index,pri,creation.date,store.size,pri.store.size&s=creation.date:desc";

#[doc = "_cat/indices 스냅샷 수집 서비스"]
#[derive(Debug, new)]
pub struct IndicesServiceImpl<R: EsRepository> {
    store: Arc<MetricStore>,
    es_repo: Arc<R>,
    history_slots: usize,
}

fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter(|pattern| !pattern.is_empty())
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(
                    "[runCatIndices] Ignoring invalid index pattern '{}': {:?}",
                    pattern, e
                );
                None
            }
        })
        .collect()
}

#[doc = "includeOnly 가 있으면 그쪽만, 없으면 exclude 미스매치만 통과"]
fn should_include_index(index_name: &str, include_only: &[Regex], exclude: &[Regex]) -> bool {
    if !include_only.is_empty() {
        return include_only.iter().any(|regex| regex.is_match(index_name));
    }

    !exclude.iter().any(|regex| regex.is_match(index_name))
}

#[doc = "_cat/indices 행 하나를 IndexInfo 로 변환 - 스토리지 문자열이 깨진 행은 버린다"]
fn parse_index_row(row: &CatIndexRow) -> Result<IndexInfo> {
    let index_name: &str = match row.index.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => return Err(anyhow!("row without index name")),
    };

    let (index_base, seq_no) = parse_index_name(index_name);

    let health: IndexHealth = IndexHealth::from_cat_value(row.health.as_deref().unwrap_or(""));
    let is_open: bool = parse_status_open(row.status.as_deref().unwrap_or(""));

    let doc_count: u64 = row
        .docs_count
        .as_deref()
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);

    let primary_shards: u32 = row
        .pri
        .as_deref()
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);

    let creation_time: i64 = row
        .creation_date
        .as_deref()
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);

    let total_storage: u64 = parse_storage_size(row.store_size.as_deref().unwrap_or(""))
        .map_err(|e| anyhow!("index '{}': {:?}", index_name, e))?;
    let primary_storage: u64 = parse_storage_size(row.pri_store_size.as_deref().unwrap_or(""))
        .map_err(|e| anyhow!("index '{}': {:?}", index_name, e))?;

    Ok(IndexInfoBuilder::default()
        .health(health)
        .is_open(is_open)
        .doc_count(doc_count)
        .index(index_name.to_string())
        .index_base(index_base)
        .seq_no(seq_no)
        .primary_shards(primary_shards)
        .creation_time(creation_time)
        .total_storage(total_storage)
        .primary_storage(primary_storage)
        .build()?)
}

impl<R: EsRepository + Sync + Send> IndicesServiceImpl<R> {
    #[doc = "행 목록을 필터링/중복제거해서 스냅샷으로 만들어주는 함수 - 같은 index_base 는 첫 행만 유지"]
    fn build_snapshot(
        rows: &[CatIndexRow],
        snapshot_time: i64,
        include_only: &[Regex],
        exclude: &[Regex],
    ) -> (IndicesSnapshot, usize, usize, usize) {
        let mut snapshot: IndicesSnapshot = IndicesSnapshot::new(snapshot_time);
        let mut seen_bases: HashSet<String> = HashSet::new();

        let mut filtered: usize = 0;
        let mut duplicates: usize = 0;
        let mut malformed: usize = 0;

        for row in rows {
            let info: IndexInfo = match parse_index_row(row) {
                Ok(info) => info,
                Err(e) => {
                    warn!("[runCatIndices] Skipping malformed row: {:?}", e);
                    malformed += 1;
                    continue;
                }
            };

            if !should_include_index(&info.index, include_only, exclude) {
                filtered += 1;
                continue;
            }

            if seen_bases.contains(&info.index_base) {
                duplicates += 1;
                continue;
            }

            seen_bases.insert(info.index_base.clone());
            snapshot.entries.insert(info.index.clone(), info);
        }

        (snapshot, filtered, duplicates, malformed)
    }
}

#[async_trait]
impl<R: EsRepository + Sync + Send> IndicesService for IndicesServiceImpl<R> {
    #[doc = "대상 클러스터 전체의 인덱스 스냅샷을 수집해서 히스토리 링에 적재"]
    async fn run_cat_indices(&self, params: CatIndicesParams) -> Result<()> {
        info!("[runCatIndices] Starting indices fetch job");

        let include_only: Vec<Regex> = compile_patterns(&params.include_only_indices);
        let exclude: Vec<Regex> = compile_patterns(&params.exclude_indices);

        if !include_only.is_empty() {
            info!(
                "[runCatIndices] Index filter: includeOnlyIndices enabled with {} patterns (excludeIndices ignored)",
                include_only.len()
            );
        } else if !exclude.is_empty() {
            info!(
                "[runCatIndices] Index filter: excludeIndices enabled with {} patterns",
                exclude.len()
            );
        }

        let clusters: Vec<ClusterData> = self.store.clusters_snapshot();
        let snapshot_time: i64 = time_now_millis();

        let mut succeeded: usize = 0;
        let mut failed: usize = 0;

        for cluster in clusters {
            if params.exclude_clusters.contains(&cluster.cluster_name) {
                info!(
                    "[runCatIndices] Skipping excluded cluster: {}",
                    cluster.cluster_name
                );
                continue;
            }

            if !cluster.has_credentials() {
                info!(
                    "[runCatIndices] Skipping cluster {}: No credentials available (preferred=0)",
                    cluster.cluster_name
                );
                failed += 1;
                continue;
            }

            let active: &str = match cluster.active_endpoint.as_deref() {
                Some(active) => active,
                None => {
                    warn!(
                        "[runCatIndices] Cluster {}: No active endpoint, skipping",
                        cluster.cluster_name
                    );
                    failed += 1;
                    continue;
                }
            };

            let url: String = format!("{}{}", active.trim_end_matches('/'), CAT_INDICES_PATH);

            let rows: Vec<CatIndexRow> = match self
                .es_repo
                .get_json::<Vec<CatIndexRow>>(&cluster, &url, CAT_INDICES_TIMEOUT)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    error!(
                        "[runCatIndices] Cluster {}: Failed to fetch indices: {:?}",
                        cluster.cluster_name, e
                    );
                    failed += 1;
                    continue;
                }
            };

            let total_fetched: usize = rows.len();
            let (snapshot, filtered, duplicates, malformed) =
                Self::build_snapshot(&rows, snapshot_time, &include_only, &exclude);

            let stored: usize = snapshot.entries.len();
            let history: Arc<IndicesHistory> = self
                .store
                .history_or_create(&cluster.cluster_name, self.history_slots);
            history.append(Arc::new(snapshot));

            succeeded += 1;
            info!(
                "[runCatIndices] Cluster {}: Fetched {} indices, filtered {}, duplicates {}, malformed {}, stored {}",
                cluster.cluster_name, total_fetched, filtered, duplicates, malformed, stored
            );
        }

        info!(
            "[runCatIndices] Completed: {} clusters succeeded, {} failed",
            succeeded, failed
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: &str, store_size: &str) -> CatIndexRow {
        CatIndexRow {
            health: Some(String::from("green")),
            status: Some(String::from("open")),
            docs_count: Some(String::from("100")),
            index: Some(index.to_string()),
            pri: Some(String::from("2")),
            creation_date: Some(String::from("1700000000000")),
            store_size: Some(store_size.to_string()),
            pri_store_size: Some(store_size.to_string()),
        }
    }

    type TestService = IndicesServiceImpl<crate::repository::es_repository::EsRepositoryImpl>;

    #[test]
    fn duplicate_index_base_keeps_first() {
        let rows = vec![
            row("logs-000002", "1kb"),
            row("logs-000001", "2kb"),
            row("metrics-01", "1kb"),
        ];

        let (snapshot, filtered, duplicates, malformed) =
            TestService::build_snapshot(&rows, 1000, &[], &[]);

        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(duplicates, 1);
        assert_eq!(filtered, 0);
        assert_eq!(malformed, 0);
        assert!(snapshot.entries.contains_key("logs-000002"));
        assert!(!snapshot.entries.contains_key("logs-000001"));

        /* index_base 는 스냅샷 안에서 유일해야 한다 */
        let mut bases: Vec<&String> = snapshot
            .entries
            .values()
            .map(|info| &info.index_base)
            .collect();
        bases.sort();
        bases.dedup();
        assert_eq!(bases.len(), snapshot.entries.len());
    }

    #[test]
    fn include_only_wins_over_exclude() {
        let rows = vec![row("logs-01", "1kb"), row("metrics-01", "1kb")];

        let include_only = compile_patterns(&[String::from("^logs")]);
        let exclude = compile_patterns(&[String::from("^logs")]);

        let (snapshot, filtered, _, _) =
            TestService::build_snapshot(&rows, 1000, &include_only, &exclude);

        assert_eq!(snapshot.entries.len(), 1);
        assert!(snapshot.entries.contains_key("logs-01"));
        assert_eq!(filtered, 1);
    }

    #[test]
    fn malformed_storage_row_is_skipped() {
        let rows = vec![row("good-01", "1kb"), row("bad-01", "garbage")];

        let (snapshot, _, _, malformed) = TestService::build_snapshot(&rows, 1000, &[], &[]);

        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(malformed, 1);
    }

    #[test]
    fn closed_index_row_defaults_to_zero_docs() {
        let mut closed = row("closed-01", "");
        closed.docs_count = None;
        closed.status = Some(String::from("close"));

        let info = parse_index_row(&closed).unwrap();
        assert_eq!(info.doc_count, 0);
        assert!(!info.is_open);
        assert_eq!(info.total_storage, 0);
    }
}

use crate::common::*;

#[doc = "_cat/indices?format=json 응답의 한 행"]
/// 닫힌 인덱스는 docs.count 등이 null 로 내려오므로 전부 Option 으로 받는다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatIndexRow {
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "docs.count", default)]
    pub docs_count: Option<String>,
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub pri: Option<String>,
    #[serde(rename = "creation.date", default)]
    pub creation_date: Option<String>,
    #[serde(rename = "store.size", default)]
    pub store_size: Option<String>,
    #[serde(rename = "pri.store.size", default)]
    pub pri_store_size: Option<String>,
}

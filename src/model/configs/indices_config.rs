use crate::common::*;

#[doc = "excludeClusters 만 받는 잡들의 공통 파라미터"]
#[derive(Debug, Clone, Default, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase", default)]
pub struct ExcludeParams {
    pub exclude_clusters: Vec<String>,
}

#[doc = "runCatIndices 잡 파라미터 - includeOnlyIndices 가 있으면 excludeIndices 는 무시"]
#[derive(Debug, Clone, Default, Deserialize, Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase", default)]
pub struct CatIndicesParams {
    pub exclude_clusters: Vec<String>,
    pub exclude_indices: Vec<String>,
    pub include_only_indices: Vec<String>,
}

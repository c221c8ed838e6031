use crate::common::*;

use crate::model::cluster::*;

#[doc = "아웃바운드 HTTP 의 실패 종류"]
#[derive(Debug, thiserror::Error)]
pub enum EsClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait EsRepository {
    #[doc = "GET 요청 후 상태코드만 반환 - 엔드포인트 연결성 판정용"]
    async fn probe(
        &self,
        cluster: &ClusterData,
        url: &str,
        timeout: Duration,
    ) -> Result<u16, EsClientError>;

    async fn get_text(
        &self,
        cluster: &ClusterData,
        url: &str,
        timeout: Duration,
    ) -> Result<String, EsClientError>;

    async fn get_json<T: DeserializeOwned + Send + 'static>(
        &self,
        cluster: &ClusterData,
        url: &str,
        timeout: Duration,
    ) -> Result<T, EsClientError>;

    #[doc = "모니터링 클러스터 전용 POST - ApiKey 헤더 인증"]
    async fn post_monitoring_json<T: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        api_key: &str,
        insecure_tls: bool,
        body: String,
        timeout: Duration,
    ) -> Result<T, EsClientError>;
}

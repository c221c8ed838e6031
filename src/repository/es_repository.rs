use crate::common::*;

use reqwest::{Certificate, Client, Identity, RequestBuilder, Response};

use crate::model::cluster::*;

use crate::traits::repository::es_repository_trait::*;

#[doc = "클러스터별 reqwest Client 풀."]
/// TLS 정책과 mTLS identity 가 클라이언트 수명에 묶이므로 클러스터 단위로 캐시하고,
/// 인증서 경로나 TLS 정책이 바뀌면 캐시키가 달라져 자연히 재생성된다.
#[derive(Debug, Default)]
pub struct EsRepositoryImpl {
    clients: RwLock<HashMap<String, Client>>,
}

impl EsRepositoryImpl {
    pub fn new() -> Self {
        EsRepositoryImpl {
            clients: RwLock::new(HashMap::new()),
        }
    }

    fn cache_key(cluster: &ClusterData) -> String {
        format!(
            "{}|{}|{}",
            cluster.cluster_name, cluster.insecure_tls, cluster.access_cred.client_cert
        )
    }

    fn build_client(insecure_tls: bool, credential: &Credential) -> Result<Client, EsClientError> {
        let mut builder = Client::builder().danger_accept_invalid_certs(insecure_tls);

        if let Credential::Mtls { cert, key, ca } = credential {
            let cert_pem: Vec<u8> = std::fs::read(cert).map_err(|e| {
                EsClientError::Decode(format!("failed to read client cert '{}': {}", cert, e))
            })?;
            let key_pem: Vec<u8> = std::fs::read(key).map_err(|e| {
                EsClientError::Decode(format!("failed to read client key '{}': {}", key, e))
            })?;

            let identity: Identity = Identity::from_pkcs8_pem(&cert_pem, &key_pem)
                .map_err(EsClientError::Transport)?;
            builder = builder.identity(identity);

            if !ca.is_empty() {
                let ca_pem: Vec<u8> = std::fs::read(ca).map_err(|e| {
                    EsClientError::Decode(format!("failed to read ca cert '{}': {}", ca, e))
                })?;
                let ca_cert: Certificate =
                    Certificate::from_pem(&ca_pem).map_err(EsClientError::Transport)?;
                builder = builder.add_root_certificate(ca_cert);
            }
        }

        builder.build().map_err(EsClientError::Transport)
    }

    fn client_for(&self, cluster: &ClusterData) -> Result<Client, EsClientError> {
        let key: String = Self::cache_key(cluster);

        {
            let clients = match self.clients.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(client) = clients.get(&key) {
                return Ok(client.clone());
            }
        }

        let client: Client = Self::build_client(cluster.insecure_tls, &cluster.access_cred.resolve())?;

        let mut clients = match self.clients.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        clients.insert(key, client.clone());

        Ok(client)
    }

    fn monitoring_client(&self, insecure_tls: bool) -> Result<Client, EsClientError> {
        let key: String = format!("__monitoring|{}", insecure_tls);

        {
            let clients = match self.clients.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(client) = clients.get(&key) {
                return Ok(client.clone());
            }
        }

        let client: Client = Self::build_client(insecure_tls, &Credential::None)?;

        let mut clients = match self.clients.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        clients.insert(key, client.clone());

        Ok(client)
    }

    #[doc = "preferred 태그로 결정된 인증을 요청에 부착 - mTLS 는 transport 레벨이라 여기서는 없음"]
    fn apply_auth(request: RequestBuilder, access_cred: &AccessCred) -> RequestBuilder {
        match access_cred.resolve() {
            Credential::ApiKey(key) => {
                request.header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", key))
            }
            Credential::Basic { user, pass } => request.basic_auth(user, Some(pass)),
            Credential::Mtls { .. } | Credential::None => request,
        }
    }

    async fn send_get(
        &self,
        cluster: &ClusterData,
        url: &str,
        timeout: Duration,
    ) -> Result<Response, EsClientError> {
        let client: Client = self.client_for(cluster)?;
        let request: RequestBuilder =
            Self::apply_auth(client.get(url).timeout(timeout), &cluster.access_cred);

        Ok(request.send().await?)
    }
}

#[async_trait]
impl EsRepository for EsRepositoryImpl {
    async fn probe(
        &self,
        cluster: &ClusterData,
        url: &str,
        timeout: Duration,
    ) -> Result<u16, EsClientError> {
        let response: Response = self.send_get(cluster, url, timeout).await?;
        Ok(response.status().as_u16())
    }

    async fn get_text(
        &self,
        cluster: &ClusterData,
        url: &str,
        timeout: Duration,
    ) -> Result<String, EsClientError> {
        let response: Response = self.send_get(cluster, url, timeout).await?;
        let status: u16 = response.status().as_u16();

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            let body: String = response.text().await.unwrap_or_default();
            Err(EsClientError::Status { code: status, body })
        }
    }

    async fn get_json<T: DeserializeOwned + Send + 'static>(
        &self,
        cluster: &ClusterData,
        url: &str,
        timeout: Duration,
    ) -> Result<T, EsClientError> {
        let response: Response = self.send_get(cluster, url, timeout).await?;
        let status: u16 = response.status().as_u16();

        if response.status().is_success() {
            let body: String = response.text().await?;
            serde_json::from_str::<T>(&body).map_err(|e| EsClientError::Decode(e.to_string()))
        } else {
            let body: String = response.text().await.unwrap_or_default();
            Err(EsClientError::Status { code: status, body })
        }
    }

    async fn post_monitoring_json<T: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        api_key: &str,
        insecure_tls: bool,
        body: String,
        timeout: Duration,
    ) -> Result<T, EsClientError> {
        let client: Client = self.monitoring_client(insecure_tls)?;

        let response: Response = client
            .post(endpoint)
            .timeout(timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", api_key))
            .body(body)
            .send()
            .await?;

        let status: u16 = response.status().as_u16();

        if response.status().is_success() {
            let body: String = response.text().await?;
            serde_json::from_str::<T>(&body).map_err(|e| EsClientError::Decode(e.to_string()))
        } else {
            let body: String = response.text().await.unwrap_or_default();
            Err(EsClientError::Status { code: status, body })
        }
    }
}

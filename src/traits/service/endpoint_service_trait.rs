use crate::common::*;

use crate::model::configs::indices_config::*;

#[async_trait]
pub trait EndpointService {
    async fn update_active_endpoints(&self, params: ExcludeParams) -> Result<()>;
    async fn update_master_endpoints(&self, params: ExcludeParams) -> Result<()>;
}

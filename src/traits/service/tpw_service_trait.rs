use crate::common::*;

use crate::model::configs::tpw_config::*;

#[async_trait]
pub trait TpwService {
    async fn get_thread_pool_write_queue(&self, params: TpwQueueParams) -> Result<()>;
}

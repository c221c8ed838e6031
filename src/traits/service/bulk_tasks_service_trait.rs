use crate::common::*;

use crate::model::configs::bulk_tasks_config::*;

#[async_trait]
pub trait BulkTasksService {
    async fn get_bulk_write_tasks(&self, params: BulkTasksParams) -> Result<()>;
}

use crate::common::*;

use crate::model::configs::indices_config::*;

#[async_trait]
pub trait StatsService {
    async fn update_stats_by_day(&self, params: ExcludeParams) -> Result<()>;
}

use crate::common::*;

use crate::model::configs::indices_config::*;

#[async_trait]
pub trait IngestService {
    async fn analyse_ingest(&self, params: ExcludeParams) -> Result<()>;
}

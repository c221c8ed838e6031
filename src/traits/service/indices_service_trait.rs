use crate::common::*;

use crate::model::configs::indices_config::*;

#[async_trait]
pub trait IndicesService {
    async fn run_cat_indices(&self, params: CatIndicesParams) -> Result<()>;
}

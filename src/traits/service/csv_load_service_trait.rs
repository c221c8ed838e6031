use crate::common::*;

use crate::model::configs::csv_mapping::*;

#[async_trait]
pub trait CsvLoadService {
    async fn load_master_csv(&self, params: CsvLoadParams) -> Result<()>;
    async fn update_access_credentials(&self, params: CredentialLoadParams) -> Result<()>;
}
